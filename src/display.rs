use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    api::{DisplayAPI, MarkerId, RenderMode},
    entities::{Bin, Coordinates, RoutePlan},
    error::Error,
};

/// Display surface that narrates rendering operations through tracing. The
/// actual map widget lives outside this crate; this is the console binary's
/// stand-in for it.
#[derive(Debug)]
pub struct TraceDisplay;

#[async_trait]
impl DisplayAPI for TraceDisplay {
    async fn drop_pin(&self, at: Coordinates) -> Result<MarkerId, Error> {
        let marker = MarkerId(Uuid::new_v4());

        tracing::info!(
            latitude = at.latitude,
            longitude = at.longitude,
            "dropped pin"
        );

        Ok(marker)
    }

    async fn place_marker(&self, bin: &Bin, mode: RenderMode) -> Result<MarkerId, Error> {
        let marker = MarkerId(Uuid::new_v4());

        tracing::info!(
            bin = bin.id,
            note = %bin.note,
            photo = bin.image.is_some(),
            editable = mode == RenderMode::Admin,
            "placed marker"
        );

        Ok(marker)
    }

    async fn remove_marker(&self, marker: MarkerId) -> Result<(), Error> {
        tracing::debug!(marker = %marker.0, "removed marker");

        Ok(())
    }

    async fn render_route(&self, plan: &RoutePlan, suppress_markers: bool) -> Result<(), Error> {
        tracing::info!(
            legs = plan.legs.len(),
            total_km = plan.total_distance_meters() / 1000.0,
            order = ?plan.waypoint_order,
            suppress_markers,
            "rendered route"
        );

        Ok(())
    }

    async fn clear_route(&self) -> Result<(), Error> {
        tracing::info!("cleared route");

        Ok(())
    }

    async fn show_notice(&self, message: &str) -> Result<(), Error> {
        tracing::warn!(notice = %message, "notice");

        Ok(())
    }
}
