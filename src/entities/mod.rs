mod bin;
mod coordinates;
mod plan;
mod waypoint;

pub use bin::{Bin, BinPatch, NewBin};
pub use coordinates::Coordinates;
pub use plan::{DirectionsResponse, DirectionsStatus, RouteLeg, RoutePlan};
pub use waypoint::WaypointRequest;
