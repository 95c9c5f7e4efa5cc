use serde::{Deserialize, Serialize};

use crate::entities::Coordinates;

/// A waste-collection point. Owned by the repository backend; instances held
/// here are transient copies fetched per route selection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bin {
    pub id: i64,
    pub location: Coordinates,
    pub note: String,
    pub route: String,
    pub image: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewBin {
    pub location: Coordinates,
    pub note: String,
    pub route: String,
}

/// Partial update for an existing bin. Absent fields are kept as-is by the
/// backend.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BinPatch {
    pub note: Option<String>,
    pub route: Option<String>,
}
