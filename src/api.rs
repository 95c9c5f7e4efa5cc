use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::{
    Bin, BinPatch, Coordinates, DirectionsResponse, NewBin, RoutePlan, WaypointRequest,
};
use crate::error::Error;

/// Client contract of the bin repository backend.
#[async_trait]
pub trait BinAPI {
    async fn find_bins(&self, route: &str) -> Result<Vec<Bin>, Error>;

    async fn create_bin(&self, bin: NewBin) -> Result<(), Error>;

    async fn update_bin(&self, id: i64, patch: BinPatch) -> Result<(), Error>;

    async fn delete_bin(&self, id: i64) -> Result<(), Error>;
}

/// The external route-optimization service. Travel mode is always driving;
/// the optimization itself is the service's business.
#[async_trait]
pub trait DirectionsAPI {
    async fn route(&self, request: &WaypointRequest) -> Result<DirectionsResponse, Error>;
}

/// One-shot platform geolocation.
#[async_trait]
pub trait LocationAPI {
    async fn current_location(&self) -> Result<Coordinates, Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderMode {
    Admin,
    ReadOnly,
}

/// Handle to a marker placed on the display surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MarkerId(pub Uuid);

/// The map display surface. `suppress_markers` must be true whenever the
/// caller has already drawn its own per-bin markers.
#[async_trait]
pub trait DisplayAPI {
    async fn drop_pin(&self, at: Coordinates) -> Result<MarkerId, Error>;

    async fn place_marker(&self, bin: &Bin, mode: RenderMode) -> Result<MarkerId, Error>;

    async fn remove_marker(&self, marker: MarkerId) -> Result<(), Error>;

    async fn render_route(&self, plan: &RoutePlan, suppress_markers: bool) -> Result<(), Error>;

    async fn clear_route(&self) -> Result<(), Error>;

    async fn show_notice(&self, message: &str) -> Result<(), Error>;
}

pub type DynBinAPI = Arc<dyn BinAPI + Send + Sync>;
pub type DynDirectionsAPI = Arc<dyn DirectionsAPI + Send + Sync>;
pub type DynDisplayAPI = Arc<dyn DisplayAPI + Send + Sync>;
