//! Incident reports as seen by the scorer

use crate::geo::Coordinate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Crowd-sourced unsafe-area report
///
/// Deserialization is lenient: a missing `lat`/`lng` reads as `0.0` and a
/// missing `severity` as `1`, so malformed documents from the store still
/// take part in scoring instead of being rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidentReport {
    pub id: Option<Uuid>,
    pub lat: f64,
    pub lng: f64,
    /// 1-5, where 5 is most severe
    pub severity: u8,
    pub user_id: Option<String>,
    pub description: Option<String>,
    pub photo_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Default for IncidentReport {
    fn default() -> Self {
        Self {
            id: None,
            lat: 0.0,
            lng: 0.0,
            severity: 1,
            user_id: None,
            description: None,
            photo_url: None,
            created_at: None,
        }
    }
}

impl IncidentReport {
    /// Bare report at a location
    pub fn at(lat: f64, lng: f64, severity: u8) -> Self {
        Self {
            lat,
            lng,
            severity,
            ..Default::default()
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }
}

/// Report-lookup capability
///
/// Returns every currently stored report. The scorer never asks for a
/// geo-bounded subset.
pub trait ReportSource {
    type Error;

    fn snapshot(&self) -> Result<Vec<IncidentReport>, Self::Error>;
}

impl ReportSource for [IncidentReport] {
    type Error = std::convert::Infallible;

    fn snapshot(&self) -> Result<Vec<IncidentReport>, Self::Error> {
        Ok(self.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_lenient_defaults() {
        let report: IncidentReport = serde_json::from_str("{}").unwrap();
        assert_eq!(report.lat, 0.0);
        assert_eq!(report.lng, 0.0);
        assert_eq!(report.severity, 1);
    }

    #[test]
    fn test_explicit_fields() {
        let report: IncidentReport =
            serde_json::from_str(r#"{"lat": 28.6, "lng": 77.2, "severity": 4}"#).unwrap();
        assert_eq!(report.coordinate(), Coordinate::new(28.6, 77.2));
        assert_eq!(report.severity, 4);
    }
}
