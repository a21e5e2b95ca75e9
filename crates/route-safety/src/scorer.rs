//! Route Safety Scorer Implementation

use crate::clock::{Clock, SystemClock};
use crate::geo::Coordinate;
use crate::report::{IncidentReport, ReportSource};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reports closer than this to the midpoint count with their full severity
const NEAR_RADIUS_DEG: f64 = 0.05;
/// Reports closer than this (but not near) count as one unsafe report
const MID_RADIUS_DEG: f64 = 0.1;

const POI_CYCLE: u64 = 20;
const REPORT_SATURATION: f64 = 50.0;

const LATE_HOURS_FACTOR: f64 = 0.7;
const POI_WEIGHT: f64 = 0.6;
const SAFE_WEIGHT: f64 = 0.3;
const UNSAFE_WEIGHT: f64 = 0.5;

const SAFE_THRESHOLD: f64 = 0.5;
const MODERATE_THRESHOLD: f64 = 0.25;

pub const REASON_LATE_HOURS: &str = "Late hours reduce safety";
pub const REASON_UNSAFE_NEARBY: &str = "Multiple unsafe reports nearby";
pub const REASON_CROWDED: &str = "Crowded places increase safety";

/// Origin/destination pair to assess
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Unix seconds; the scorer's clock is used when absent. `Some(0)` is
    /// taken literally as midnight UTC, not as "unset".
    pub timestamp: Option<i64>,
}

impl RouteRequest {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
            timestamp: None,
        }
    }

    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }
}

/// Coarse safety bucket derived from the score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLabel {
    Safe,
    Moderate,
    Dangerous,
}

impl SafetyLabel {
    /// `>= 0.5` is safe, `>= 0.25` moderate, anything else (NaN included) dangerous
    pub fn from_score(score: f64) -> Self {
        if score >= SAFE_THRESHOLD {
            SafetyLabel::Safe
        } else if score >= MODERATE_THRESHOLD {
            SafetyLabel::Moderate
        } else {
            SafetyLabel::Dangerous
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyLabel::Safe => "safe",
            SafetyLabel::Moderate => "moderate",
            SafetyLabel::Dangerous => "dangerous",
        }
    }
}

/// Result of one assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyAssessment {
    pub score: f64,
    #[serde(rename = "safety")]
    pub label: SafetyLabel,
    pub reasons: Vec<String>,
    /// Origin, midpoint, destination
    pub path: [Coordinate; 3],
}

/// Accumulators and normalized signals behind a score
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SafetySignals {
    pub safe_reports: u64,
    pub unsafe_reports: u64,
    pub poi_density: f64,
    pub sr_norm: f64,
    pub ur_norm: f64,
    pub time_factor: f64,
}

impl SafetySignals {
    /// Normalize raw accumulators
    ///
    /// `poi_density` is cyclic in `safe_reports` (modulo 20). Reason and
    /// label thresholds are calibrated against exactly this formula.
    pub fn from_counts(safe_reports: u64, unsafe_reports: u64, time_factor: f64) -> Self {
        Self {
            safe_reports,
            unsafe_reports,
            poi_density: ((safe_reports % POI_CYCLE) as f64 / POI_CYCLE as f64).clamp(0.0, 1.0),
            sr_norm: (safe_reports as f64 / REPORT_SATURATION).clamp(0.0, 1.0),
            ur_norm: (unsafe_reports as f64 / REPORT_SATURATION).clamp(0.0, 1.0),
            time_factor,
        }
    }

    /// Weighted score, intentionally unclamped: ranges over
    /// `[-0.5 * time_factor, 0.9 * time_factor]`
    pub fn score(&self) -> f64 {
        (POI_WEIGHT * self.poi_density + SAFE_WEIGHT * self.sr_norm
            - UNSAFE_WEIGHT * self.ur_norm)
            * self.time_factor
    }

    /// Human-readable reasons in fixed evaluation order
    pub fn reasons(&self) -> Vec<String> {
        let mut reasons = Vec::with_capacity(3);
        if self.time_factor < 1.0 {
            reasons.push(REASON_LATE_HOURS.to_string());
        }
        if self.ur_norm > 0.2 {
            reasons.push(REASON_UNSAFE_NEARBY.to_string());
        }
        if self.poi_density > 0.5 {
            reasons.push(REASON_CROWDED.to_string());
        }
        reasons
    }
}

/// Hour of day from raw epoch seconds (UTC, floor division)
pub fn hour_of_day(timestamp: i64) -> i64 {
    timestamp.div_euclid(3600).rem_euclid(24)
}

/// Late-night penalty: 0.7 for hours 20-23 and 0-5, else 1.0
pub fn time_factor_for(timestamp: i64) -> f64 {
    let hour = hour_of_day(timestamp);
    if hour >= 20 || hour <= 5 {
        LATE_HOURS_FACTOR
    } else {
        1.0
    }
}

/// Stateless route safety scorer
///
/// Holds only the clock used when a request carries no timestamp, so it
/// can be shared freely across concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct RouteSafetyScorer<C: Clock = SystemClock> {
    clock: C,
}

impl RouteSafetyScorer<SystemClock> {
    pub fn new() -> Self {
        Self { clock: SystemClock }
    }
}

impl<C: Clock> RouteSafetyScorer<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { clock }
    }

    /// Compute the intermediate signals for a request
    pub fn signals(&self, request: &RouteRequest, reports: &[IncidentReport]) -> SafetySignals {
        let timestamp = request
            .timestamp
            .unwrap_or_else(|| self.clock.now_unix());
        let time_factor = time_factor_for(timestamp);

        let mid = request.origin.midpoint(&request.destination);

        let (safe_reports, unsafe_reports) =
            reports
                .iter()
                .fold((0u64, 0u64), |(safe, unsafe_), report| {
                    let d = report.coordinate().planar_distance(&mid);
                    if d < NEAR_RADIUS_DEG {
                        (safe, unsafe_ + u64::from(report.severity))
                    } else if d < MID_RADIUS_DEG {
                        (safe, unsafe_ + 1)
                    } else {
                        (safe + 1, unsafe_)
                    }
                });

        SafetySignals::from_counts(safe_reports, unsafe_reports, time_factor)
    }

    /// Assess a route against a report snapshot
    pub fn assess(&self, request: &RouteRequest, reports: &[IncidentReport]) -> SafetyAssessment {
        let signals = self.signals(request, reports);
        let score = signals.score();
        let label = SafetyLabel::from_score(score);

        debug!(
            "Assessed route over {} reports: safe={} unsafe={} time_factor={} score={:.4} ({})",
            reports.len(),
            signals.safe_reports,
            signals.unsafe_reports,
            signals.time_factor,
            score,
            label.as_str()
        );

        SafetyAssessment {
            score,
            label,
            reasons: signals.reasons(),
            path: [
                request.origin,
                request.origin.midpoint(&request.destination),
                request.destination,
            ],
        }
    }

    /// Fetch a snapshot from `source` and assess it
    pub fn assess_from<S>(
        &self,
        request: &RouteRequest,
        source: &S,
    ) -> Result<SafetyAssessment, S::Error>
    where
        S: ReportSource + ?Sized,
    {
        let reports = source.snapshot()?;
        Ok(self.assess(request, &reports))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use proptest::prelude::*;

    const NOON: i64 = 12 * 3600;
    const TEN_PM: i64 = 22 * 3600;

    fn origin_request() -> RouteRequest {
        RouteRequest::new(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.0))
    }

    fn scorer() -> RouteSafetyScorer<FixedClock> {
        RouteSafetyScorer::with_clock(FixedClock(NOON))
    }

    #[test]
    fn test_hour_of_day() {
        assert_eq!(hour_of_day(0), 0);
        assert_eq!(hour_of_day(NOON), 12);
        assert_eq!(hour_of_day(TEN_PM + 3599), 22);
        assert_eq!(hour_of_day(24 * 3600 + 3600), 1);
        // floor division wraps negative timestamps into the previous day
        assert_eq!(hour_of_day(-1), 23);
    }

    #[test]
    fn test_time_factor_boundaries() {
        assert_eq!(time_factor_for(5 * 3600), 0.7);
        assert_eq!(time_factor_for(6 * 3600), 1.0);
        assert_eq!(time_factor_for(19 * 3600 + 3599), 1.0);
        assert_eq!(time_factor_for(20 * 3600), 0.7);
    }

    #[test]
    fn test_label_boundaries() {
        assert_eq!(SafetyLabel::from_score(0.5), SafetyLabel::Safe);
        assert_eq!(SafetyLabel::from_score(0.4999999), SafetyLabel::Moderate);
        assert_eq!(SafetyLabel::from_score(0.25), SafetyLabel::Moderate);
        assert_eq!(SafetyLabel::from_score(0.2499999), SafetyLabel::Dangerous);
        assert_eq!(SafetyLabel::from_score(-0.5), SafetyLabel::Dangerous);
        assert_eq!(SafetyLabel::from_score(f64::NAN), SafetyLabel::Dangerous);
    }

    #[test]
    fn test_empty_snapshot_daytime() {
        let result = scorer().assess(&origin_request().at(NOON), &[]);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.label, SafetyLabel::Dangerous);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_empty_snapshot_late_night() {
        let result = scorer().assess(&origin_request().at(TEN_PM), &[]);
        assert_eq!(result.score, 0.0);
        assert_eq!(result.label, SafetyLabel::Dangerous);
        assert_eq!(result.reasons, vec![REASON_LATE_HOURS.to_string()]);
    }

    #[test]
    fn test_fifty_far_reports() {
        let reports = vec![IncidentReport::at(1.0, 1.0, 5); 50];
        let request = origin_request().at(NOON);

        let signals = scorer().signals(&request, &reports);
        assert_eq!(signals.safe_reports, 50);
        assert_eq!(signals.unsafe_reports, 0);
        assert_eq!(signals.poi_density, 0.5);
        assert_eq!(signals.sr_norm, 1.0);

        let result = scorer().assess(&request, &reports);
        assert!((result.score - 0.6).abs() < 1e-12);
        assert_eq!(result.label, SafetyLabel::Safe);
        // 0.5 is not strictly above the crowd threshold
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_thirty_severe_near_reports() {
        let reports = vec![IncidentReport::at(0.01, 0.01, 5); 30];
        let request = origin_request().at(NOON);

        let signals = scorer().signals(&request, &reports);
        assert_eq!(signals.unsafe_reports, 150);
        assert_eq!(signals.ur_norm, 1.0);
        assert_eq!(signals.poi_density, 0.0);

        let result = scorer().assess(&request, &reports);
        assert!((result.score + 0.5).abs() < 1e-12);
        assert_eq!(result.label, SafetyLabel::Dangerous);
        assert_eq!(result.reasons, vec![REASON_UNSAFE_NEARBY.to_string()]);
    }

    #[test]
    fn test_distance_band_edges() {
        let request = origin_request().at(NOON);
        // exactly 0.05 is the mid band, so severity is ignored
        let mid_band = scorer().signals(&request, &[IncidentReport::at(0.05, 0.0, 5)]);
        assert_eq!((mid_band.safe_reports, mid_band.unsafe_reports), (0, 1));

        // exactly 0.1 is far
        let far_band = scorer().signals(&request, &[IncidentReport::at(0.0, 0.1, 5)]);
        assert_eq!((far_band.safe_reports, far_band.unsafe_reports), (1, 0));

        let near_band = scorer().signals(&request, &[IncidentReport::at(0.0, 0.049, 3)]);
        assert_eq!((near_band.safe_reports, near_band.unsafe_reports), (0, 3));
    }

    #[test]
    fn test_crowded_reason_and_cyclic_density() {
        let request = origin_request().at(NOON);
        let reports = vec![IncidentReport::at(2.0, 2.0, 1); 15];
        let result = scorer().assess(&request, &reports);
        assert_eq!(result.reasons, vec![REASON_CROWDED.to_string()]);

        // 20 far reports wrap the density back to zero
        let reports = vec![IncidentReport::at(2.0, 2.0, 1); 20];
        let signals = scorer().signals(&request, &reports);
        assert_eq!(signals.poi_density, 0.0);
        assert_eq!(signals.sr_norm, 0.4);
    }

    #[test]
    fn test_all_reasons_in_order() {
        let mut reports = vec![IncidentReport::at(3.0, 3.0, 1); 15];
        reports.extend(vec![IncidentReport::at(0.0, 0.0, 4); 5]);
        let result = scorer().assess(&origin_request().at(TEN_PM), &reports);
        assert_eq!(
            result.reasons,
            vec![
                REASON_LATE_HOURS.to_string(),
                REASON_UNSAFE_NEARBY.to_string(),
                REASON_CROWDED.to_string(),
            ]
        );
    }

    #[test]
    fn test_missing_timestamp_uses_clock() {
        let late = RouteSafetyScorer::with_clock(FixedClock(TEN_PM));
        let result = late.assess(&origin_request(), &[]);
        assert_eq!(result.reasons, vec![REASON_LATE_HOURS.to_string()]);

        // an explicit timestamp wins over the clock
        let result = late.assess(&origin_request().at(NOON), &[]);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn test_zero_timestamp_is_not_replaced_by_clock() {
        let result = scorer().assess(&origin_request().at(0), &[]);
        assert_eq!(result.reasons, vec![REASON_LATE_HOURS.to_string()]);

        let signals = scorer().signals(&origin_request().at(0), &[]);
        assert_eq!(signals.time_factor, 0.7);
    }

    #[test]
    fn test_path_is_origin_midpoint_destination() {
        let request = RouteRequest::new(Coordinate::new(0.0, 0.0), Coordinate::new(10.0, 10.0));
        let result = scorer().assess(&request, &[]);
        assert_eq!(
            result.path,
            [
                Coordinate::new(0.0, 0.0),
                Coordinate::new(5.0, 5.0),
                Coordinate::new(10.0, 10.0)
            ]
        );
    }

    #[test]
    fn test_assess_from_slice_source() {
        let reports = vec![IncidentReport::at(0.0, 0.0, 2); 3];
        let request = origin_request().at(NOON);
        let from_source = scorer().assess_from(&request, reports.as_slice()).unwrap();
        assert_eq!(from_source, scorer().assess(&request, &reports));
    }

    #[test]
    fn test_nan_coordinates_propagate() {
        let request = RouteRequest::new(Coordinate::new(f64::NAN, 0.0), Coordinate::new(0.0, 0.0))
            .at(NOON);
        let reports = [IncidentReport::at(0.0, 0.0, 5)];
        // NaN distances fail both band checks and land in the far bucket
        let signals = scorer().signals(&request, &reports);
        assert_eq!((signals.safe_reports, signals.unsafe_reports), (1, 0));

        let result = scorer().assess(&request, &reports);
        assert_eq!(result.label, SafetyLabel::Dangerous);
        assert!(result.path[1].lat.is_nan());
    }

    #[test]
    fn test_assessment_json_shape() {
        let result = scorer().assess(&origin_request().at(TEN_PM), &[]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["safety"], "dangerous");
        assert_eq!(json["reasons"][0], REASON_LATE_HOURS);
        assert_eq!(json["path"].as_array().unwrap().len(), 3);
        assert_eq!(json["path"][1]["lng"], 0.0);
    }

    fn report_strategy() -> impl Strategy<Value = IncidentReport> {
        (-0.3f64..0.3, -0.3f64..0.3, 1u8..=5)
            .prop_map(|(lat, lng, severity)| IncidentReport::at(lat, lng, severity))
    }

    proptest! {
        #[test]
        fn prop_signals_are_normalized(safe in 0u64..100_000, unsafe_ in 0u64..100_000) {
            let signals = SafetySignals::from_counts(safe, unsafe_, 1.0);
            prop_assert!((0.0..=1.0).contains(&signals.poi_density));
            prop_assert!((0.0..=1.0).contains(&signals.sr_norm));
            prop_assert!((0.0..=1.0).contains(&signals.ur_norm));
        }

        #[test]
        fn prop_score_is_monotonic(
            poi in 0.0f64..=1.0, sr in 0.0f64..=1.0, ur in 0.0f64..=1.0,
            delta in 0.0f64..=1.0, late in any::<bool>(),
        ) {
            let time_factor = if late { 0.7 } else { 1.0 };
            let base = SafetySignals { poi_density: poi, sr_norm: sr, ur_norm: ur, time_factor, ..Default::default() };
            let more_poi = SafetySignals { poi_density: (poi + delta).min(1.0), ..base };
            let more_safe = SafetySignals { sr_norm: (sr + delta).min(1.0), ..base };
            let more_unsafe = SafetySignals { ur_norm: (ur + delta).min(1.0), ..base };

            prop_assert!(more_poi.score() >= base.score());
            prop_assert!(more_safe.score() >= base.score());
            prop_assert!(more_unsafe.score() <= base.score());
        }

        #[test]
        fn prop_score_within_asymmetric_range(
            reports in proptest::collection::vec(report_strategy(), 0..200),
            timestamp in 0i64..4_000_000_000,
        ) {
            let result = scorer().assess(&origin_request().at(timestamp), &reports);
            let time_factor = time_factor_for(timestamp);
            prop_assert!(result.score >= -0.5 * time_factor - 1e-12);
            prop_assert!(result.score <= 0.9 * time_factor + 1e-12);
            prop_assert_eq!(result.label, SafetyLabel::from_score(result.score));
        }

        #[test]
        fn prop_assess_is_idempotent_and_order_independent(
            reports in proptest::collection::vec(report_strategy(), 0..100),
            timestamp in 0i64..4_000_000_000,
        ) {
            let request = origin_request().at(timestamp);
            let first = scorer().assess(&request, &reports);
            prop_assert_eq!(&first, &scorer().assess(&request, &reports));

            let mut reversed = reports.clone();
            reversed.reverse();
            prop_assert_eq!(first, scorer().assess(&request, &reversed));
        }

        #[test]
        fn prop_path_shape(
            o_lat in -90.0f64..90.0, o_lng in -180.0f64..180.0,
            d_lat in -90.0f64..90.0, d_lng in -180.0f64..180.0,
        ) {
            let origin = Coordinate::new(o_lat, o_lng);
            let destination = Coordinate::new(d_lat, d_lng);
            let result = scorer().assess(&RouteRequest::new(origin, destination), &[]);
            prop_assert_eq!(result.path[0], origin);
            prop_assert_eq!(result.path[1], Coordinate::new((o_lat + d_lat) / 2.0, (o_lng + d_lng) / 2.0));
            prop_assert_eq!(result.path[2], destination);
        }

        #[test]
        fn prop_reasons_are_unique(
            reports in proptest::collection::vec(report_strategy(), 0..200),
            timestamp in 0i64..4_000_000_000,
        ) {
            let result = scorer().assess(&origin_request().at(timestamp), &reports);
            let mut seen = result.reasons.clone();
            seen.dedup();
            prop_assert_eq!(seen.len(), result.reasons.len());
            prop_assert!(result.reasons.len() <= 3);
        }
    }
}
