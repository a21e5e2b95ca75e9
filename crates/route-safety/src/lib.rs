//! Route Safety Scoring
//!
//! Turns an origin/destination pair and a snapshot of geotagged incident
//! reports into a qualitative safety verdict with reasons and a display path.

mod clock;
mod geo;
mod report;
mod scorer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use geo::Coordinate;
pub use report::{IncidentReport, ReportSource};
pub use scorer::{
    hour_of_day, time_factor_for, RouteRequest, RouteSafetyScorer, SafetyAssessment, SafetyLabel,
    SafetySignals, REASON_CROWDED, REASON_LATE_HOURS, REASON_UNSAFE_NEARBY,
};
