use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// The ordered route description returned by the directions service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoutePlan {
    pub waypoint_order: Vec<usize>,
    pub legs: Vec<RouteLeg>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RouteLeg {
    pub start: Coordinates,
    pub end: Coordinates,
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

impl RoutePlan {
    pub fn total_distance_meters(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance_meters).sum()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectionsStatus {
    Ok,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
}

impl DirectionsStatus {
    pub fn from_code(code: &str) -> Self {
        match code {
            "OK" => Self::Ok,
            "ZERO_RESULTS" => Self::ZeroResults,
            "OVER_QUERY_LIMIT" => Self::OverQueryLimit,
            "REQUEST_DENIED" => Self::RequestDenied,
            "INVALID_REQUEST" => Self::InvalidRequest,
            _ => Self::UnknownError,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ZeroResults => "ZERO_RESULTS",
            Self::OverQueryLimit => "OVER_QUERY_LIMIT",
            Self::RequestDenied => "REQUEST_DENIED",
            Self::InvalidRequest => "INVALID_REQUEST",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }

    pub fn is_ok(&self) -> bool {
        *self == Self::Ok
    }
}

impl fmt::Display for DirectionsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the directions service answered: a service-level status plus, when
/// the status allows it, an ordered plan. Failure statuses are data here, not
/// transport errors.
#[derive(Clone, Debug)]
pub struct DirectionsResponse {
    pub status: DirectionsStatus,
    pub plan: Option<RoutePlan>,
}

#[test]
fn status_codes_round_trip() {
    for code in [
        "OK",
        "ZERO_RESULTS",
        "OVER_QUERY_LIMIT",
        "REQUEST_DENIED",
        "INVALID_REQUEST",
    ] {
        assert_eq!(DirectionsStatus::from_code(code).as_str(), code);
    }

    assert_eq!(
        DirectionsStatus::from_code("MAX_WAYPOINTS_EXCEEDED"),
        DirectionsStatus::UnknownError
    );
}

#[test]
fn plan_distance_sums_legs() {
    let leg = |meters| RouteLeg {
        start: Coordinates::new(0.0, 0.0),
        end: Coordinates::new(0.0, 0.0),
        distance_meters: meters,
        duration_seconds: 60.0,
    };

    let plan = RoutePlan {
        waypoint_order: vec![0, 1],
        legs: vec![leg(1200.0), leg(800.0)],
    };

    assert_eq!(plan.total_distance_meters(), 2000.0);
}
