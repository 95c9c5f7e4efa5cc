use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// A single directions request: start, end, and the intermediate stops the
/// optimizer may reorder. Constructed fresh per planning invocation, never
/// persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaypointRequest {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub stops: Vec<Coordinates>,
    pub allow_reordering: bool,
}
