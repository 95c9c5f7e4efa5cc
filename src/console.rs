use std::collections::HashMap;

use uuid::Uuid;

use crate::{
    api::{DynBinAPI, DynDirectionsAPI, DynDisplayAPI, LocationAPI, MarkerId, RenderMode},
    entities::{Bin, BinPatch, Coordinates, DirectionsResponse, NewBin},
    error::{directions_request_failed, invalid_state_error, Error},
    event::ConsoleEvent,
    planner,
};

/// Fallback starting point when geolocation is denied or unavailable.
pub const DEFAULT_LOCATION: Coordinates = Coordinates {
    latitude: 44.66541324819608,
    longitude: -63.62142899829352,
};

/// View-controller for one map surface. Owns all transient UI state: the
/// marker registry, the staged bin position, the active route selection, and
/// the tag of the route currently rendered. One instance serves one render
/// mode for its whole lifetime.
pub struct MapConsole {
    bins: DynBinAPI,
    directions: DynDirectionsAPI,
    display: DynDisplayAPI,
    mode: RenderMode,
    user_location: Coordinates,
    selection: Option<String>,
    markers: HashMap<i64, MarkerId>,
    staged: Option<(Coordinates, MarkerId)>,
    displayed_route: Option<Uuid>,
}

impl MapConsole {
    pub fn new(
        bins: DynBinAPI,
        directions: DynDirectionsAPI,
        display: DynDisplayAPI,
        mode: RenderMode,
    ) -> Self {
        Self {
            bins,
            directions,
            display,
            mode,
            user_location: DEFAULT_LOCATION,
            selection: None,
            markers: HashMap::new(),
            staged: None,
            displayed_route: None,
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn displayed_route(&self) -> Option<Uuid> {
        self.displayed_route
    }

    /// One-shot geolocation at startup. Denial or failure falls back to the
    /// default starting point with a single user-visible notice.
    #[tracing::instrument(skip_all)]
    pub async fn locate(&mut self, provider: &(dyn LocationAPI + Send + Sync)) -> Result<(), Error> {
        match provider.current_location().await {
            Ok(location) => {
                tracing::info!(
                    latitude = location.latitude,
                    longitude = location.longitude,
                    "using reported location"
                );
                self.user_location = location;
            }
            Err(_) => {
                self.user_location = DEFAULT_LOCATION;
                self.display
                    .show_notice("Location access denied. Using a default location.")
                    .await?;
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub async fn handle(&mut self, event: ConsoleEvent) -> Result<(), Error> {
        match event {
            ConsoleEvent::RouteSelected(route) => self.select_route(route).await,
            ConsoleEvent::PinDropped(at) => self.stage_position(at).await,
            ConsoleEvent::BinSaved { note } => self.save_staged_bin(note).await,
            ConsoleEvent::BinEdited { id, note } => self.edit_bin(id, note).await,
            ConsoleEvent::BinDeleted { id } => self.delete_bin(id).await,
        }
    }

    /// The route dropdown changed. Every currently displayed bin is invalid
    /// from here on; with no route selected the displayed route is cleared
    /// and nothing is fetched.
    #[tracing::instrument(skip(self))]
    pub async fn select_route(&mut self, route: Option<String>) -> Result<(), Error> {
        self.clear_markers().await?;
        self.selection = route.filter(|route| !route.is_empty());

        let route = match self.selection.clone() {
            Some(route) => route,
            None => {
                self.display.clear_route().await?;
                self.displayed_route = None;
                return Ok(());
            }
        };

        let bins = self.bins.find_bins(&route).await?;
        self.render_bins(&bins).await?;

        if self.mode == RenderMode::ReadOnly {
            self.plan_route(&bins).await?;
        }

        Ok(())
    }

    /// Single render pass shared by both modes; the mode only changes what
    /// the marker offers when opened.
    async fn render_bins(&mut self, bins: &[Bin]) -> Result<(), Error> {
        for bin in bins {
            let marker = self.display.place_marker(bin, self.mode).await?;
            self.markers.insert(bin.id, marker);
        }

        Ok(())
    }

    /// Builds and dispatches one directions request for the given bins, then
    /// applies whatever comes back. Zero bins clears the displayed route and
    /// skips planning entirely.
    #[tracing::instrument(skip_all)]
    async fn plan_route(&mut self, bins: &[Bin]) -> Result<(), Error> {
        let request = match planner::build_waypoint_request(self.user_location, bins) {
            Ok(request) => request,
            Err(_) => {
                self.display.clear_route().await?;
                self.displayed_route = None;
                return Ok(());
            }
        };

        let tag = Uuid::new_v4();
        tracing::info!(%tag, stops = request.stops.len(), "dispatching directions request");

        let response = match self.directions.route(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(%tag, code = err.code, message = %err.message, "directions dispatch failed");
                return Ok(());
            }
        };

        self.apply_route_result(tag, response).await
    }

    /// Applies a directions response. Success replaces the displayed route
    /// (markers suppressed, ours are already up); any failure status is
    /// reported and the previously rendered route is left untouched.
    #[tracing::instrument(skip(self, response))]
    pub async fn apply_route_result(
        &mut self,
        tag: Uuid,
        response: DirectionsResponse,
    ) -> Result<(), Error> {
        match response.plan {
            Some(plan) if response.status.is_ok() => {
                self.display.render_route(&plan, true).await?;
                self.displayed_route = Some(tag);
                tracing::info!(%tag, "rendered optimized route");
            }
            _ => {
                let err = directions_request_failed(response.status.as_str());
                tracing::warn!(%tag, code = err.code, message = %err.message, "keeping current route");
            }
        }

        Ok(())
    }

    /// Map-click analog: stage a position for the next saved bin and drop a
    /// provisional pin there. Restaging moves the pin.
    #[tracing::instrument(skip(self))]
    pub async fn stage_position(&mut self, at: Coordinates) -> Result<(), Error> {
        self.require_admin()?;

        if let Some((_, marker)) = self.staged.take() {
            self.display.remove_marker(marker).await?;
        }

        let marker = self.display.drop_pin(at).await?;
        self.staged = Some((at, marker));

        Ok(())
    }

    /// Saves the staged position as a bin on the active route, then
    /// refreshes the markers from the backend.
    #[tracing::instrument(skip(self))]
    pub async fn save_staged_bin(&mut self, note: String) -> Result<(), Error> {
        self.require_admin()?;

        let route = self.selection.clone().ok_or_else(invalid_state_error)?;
        let (location, marker) = self.staged.take().ok_or_else(invalid_state_error)?;

        self.bins
            .create_bin(NewBin {
                location,
                note,
                route,
            })
            .await?;

        self.display.remove_marker(marker).await?;
        self.refresh().await
    }

    #[tracing::instrument(skip(self))]
    pub async fn edit_bin(&mut self, id: i64, note: String) -> Result<(), Error> {
        self.require_admin()?;

        self.bins
            .update_bin(
                id,
                BinPatch {
                    note: Some(note),
                    route: None,
                },
            )
            .await?;

        self.refresh().await
    }

    /// Deletes one bin and removes exactly its marker; the rest of the
    /// display is left alone.
    #[tracing::instrument(skip(self))]
    pub async fn delete_bin(&mut self, id: i64) -> Result<(), Error> {
        self.require_admin()?;

        self.bins.delete_bin(id).await?;

        if let Some(marker) = self.markers.remove(&id) {
            self.display.remove_marker(marker).await?;
        }

        Ok(())
    }

    async fn refresh(&mut self) -> Result<(), Error> {
        self.select_route(self.selection.clone()).await
    }

    async fn clear_markers(&mut self) -> Result<(), Error> {
        for (_, marker) in self.markers.drain() {
            self.display.remove_marker(marker).await?;
        }

        if let Some((_, marker)) = self.staged.take() {
            self.display.remove_marker(marker).await?;
        }

        Ok(())
    }

    fn require_admin(&self) -> Result<(), Error> {
        if self.mode != RenderMode::Admin {
            return Err(invalid_state_error());
        }

        Ok(())
    }
}

#[cfg(test)]
mod fakes {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use uuid::Uuid;

    use crate::api::{BinAPI, DirectionsAPI, DisplayAPI, LocationAPI, MarkerId, RenderMode};
    use crate::entities::{
        Bin, BinPatch, Coordinates, DirectionsResponse, NewBin, RoutePlan, WaypointRequest,
    };
    use crate::error::{location_unavailable, Error};

    pub struct FakeBins {
        pub bins: Mutex<Vec<Bin>>,
        pub deleted: Mutex<Vec<i64>>,
        pub created: Mutex<Vec<NewBin>>,
        pub patched: Mutex<Vec<(i64, BinPatch)>>,
        pub fetches: Mutex<Vec<String>>,
    }

    impl FakeBins {
        pub fn with(bins: Vec<Bin>) -> Arc<Self> {
            Arc::new(Self {
                bins: Mutex::new(bins),
                deleted: Mutex::new(vec![]),
                created: Mutex::new(vec![]),
                patched: Mutex::new(vec![]),
                fetches: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl BinAPI for FakeBins {
        async fn find_bins(&self, route: &str) -> Result<Vec<Bin>, Error> {
            self.fetches.lock().unwrap().push(route.to_string());

            Ok(self
                .bins
                .lock()
                .unwrap()
                .iter()
                .filter(|bin| bin.route == route)
                .cloned()
                .collect())
        }

        async fn create_bin(&self, bin: NewBin) -> Result<(), Error> {
            self.created.lock().unwrap().push(bin);
            Ok(())
        }

        async fn update_bin(&self, id: i64, patch: BinPatch) -> Result<(), Error> {
            self.patched.lock().unwrap().push((id, patch));
            Ok(())
        }

        async fn delete_bin(&self, id: i64) -> Result<(), Error> {
            self.deleted.lock().unwrap().push(id);
            self.bins.lock().unwrap().retain(|bin| bin.id != id);
            Ok(())
        }
    }

    pub struct FakeDirections {
        pub responses: Mutex<VecDeque<DirectionsResponse>>,
        pub requests: Mutex<Vec<WaypointRequest>>,
    }

    impl FakeDirections {
        pub fn with(responses: Vec<DirectionsResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(vec![]),
            })
        }
    }

    #[async_trait]
    impl DirectionsAPI for FakeDirections {
        async fn route(&self, request: &WaypointRequest) -> Result<DirectionsResponse, Error> {
            self.requests.lock().unwrap().push(request.clone());

            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(crate::error::upstream_error)
        }
    }

    #[derive(Debug, PartialEq)]
    pub enum DisplayEvent {
        Pin,
        Marker(i64),
        Removed(MarkerId),
        Route { legs: usize, suppressed: bool },
        RouteCleared,
        Notice(String),
    }

    pub struct FakeDisplay {
        pub events: Mutex<Vec<DisplayEvent>>,
    }

    impl FakeDisplay {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                events: Mutex::new(vec![]),
            })
        }

        pub fn count(&self, matches: impl Fn(&DisplayEvent) -> bool) -> usize {
            self.events
                .lock()
                .unwrap()
                .iter()
                .filter(|event| matches(event))
                .count()
        }
    }

    #[async_trait]
    impl DisplayAPI for FakeDisplay {
        async fn drop_pin(&self, _at: Coordinates) -> Result<MarkerId, Error> {
            self.events.lock().unwrap().push(DisplayEvent::Pin);
            Ok(MarkerId(Uuid::new_v4()))
        }

        async fn place_marker(&self, bin: &Bin, _mode: RenderMode) -> Result<MarkerId, Error> {
            self.events.lock().unwrap().push(DisplayEvent::Marker(bin.id));
            Ok(MarkerId(Uuid::new_v4()))
        }

        async fn remove_marker(&self, marker: MarkerId) -> Result<(), Error> {
            self.events.lock().unwrap().push(DisplayEvent::Removed(marker));
            Ok(())
        }

        async fn render_route(&self, plan: &RoutePlan, suppress_markers: bool) -> Result<(), Error> {
            self.events.lock().unwrap().push(DisplayEvent::Route {
                legs: plan.legs.len(),
                suppressed: suppress_markers,
            });
            Ok(())
        }

        async fn clear_route(&self) -> Result<(), Error> {
            self.events.lock().unwrap().push(DisplayEvent::RouteCleared);
            Ok(())
        }

        async fn show_notice(&self, message: &str) -> Result<(), Error> {
            self.events
                .lock()
                .unwrap()
                .push(DisplayEvent::Notice(message.to_string()));
            Ok(())
        }
    }

    pub struct DeniedLocation;

    #[async_trait]
    impl LocationAPI for DeniedLocation {
        async fn current_location(&self) -> Result<Coordinates, Error> {
            Err(location_unavailable())
        }
    }

    pub struct FixedLocation(pub Coordinates);

    #[async_trait]
    impl LocationAPI for FixedLocation {
        async fn current_location(&self) -> Result<Coordinates, Error> {
            Ok(self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::block_on;

    use super::fakes::{
        DeniedLocation, DisplayEvent, FakeBins, FakeDirections, FakeDisplay, FixedLocation,
    };
    use super::MapConsole;
    use crate::api::RenderMode;
    use crate::entities::{
        Bin, Coordinates, DirectionsResponse, DirectionsStatus, RouteLeg, RoutePlan,
    };

    fn bin_at(id: i64, latitude: f64, route: &str) -> Bin {
        Bin {
            id,
            location: Coordinates::new(latitude, -63.0),
            note: format!("bin {}", id),
            route: route.into(),
            image: None,
        }
    }

    fn ok_response(legs: usize) -> DirectionsResponse {
        DirectionsResponse {
            status: DirectionsStatus::Ok,
            plan: Some(RoutePlan {
                waypoint_order: (0..legs).collect(),
                legs: (0..legs)
                    .map(|_| RouteLeg {
                        start: Coordinates::new(44.0, -63.0),
                        end: Coordinates::new(44.1, -63.0),
                        distance_meters: 1000.0,
                        duration_seconds: 120.0,
                    })
                    .collect(),
            }),
        }
    }

    fn failed_response(status: DirectionsStatus) -> DirectionsResponse {
        DirectionsResponse {
            status,
            plan: None,
        }
    }

    #[test]
    fn selecting_a_route_plans_towards_the_nearest_bin() {
        let bins = FakeBins::with(vec![
            bin_at(1, 44.05, "route1"),
            bin_at(2, 44.02, "route1"),
            bin_at(3, 44.08, "route1"),
        ]);
        let directions = FakeDirections::with(vec![ok_response(4)]);
        let display = FakeDisplay::new();

        let mut console = MapConsole::new(
            bins,
            directions.clone(),
            display.clone(),
            RenderMode::ReadOnly,
        );

        let origin = Coordinates::new(44.0, -63.0);
        block_on(console.locate(&FixedLocation(origin))).unwrap();
        block_on(console.select_route(Some("route1".into()))).unwrap();

        let requests = directions.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].origin, origin);
        assert_eq!(requests[0].destination, Coordinates::new(44.02, -63.0));
        assert_eq!(requests[0].stops.len(), 3);
        assert!(requests[0].allow_reordering);

        assert_eq!(display.count(|e| matches!(e, DisplayEvent::Marker(_))), 3);
        assert_eq!(
            display.count(|e| matches!(e, DisplayEvent::Route { suppressed: true, .. })),
            1
        );
        assert!(console.displayed_route().is_some());
    }

    #[test]
    fn clearing_the_selection_touches_nothing_remote() {
        let bins = FakeBins::with(vec![bin_at(1, 44.05, "route1")]);
        let directions = FakeDirections::with(vec![ok_response(2)]);
        let display = FakeDisplay::new();

        let mut console = MapConsole::new(
            bins.clone(),
            directions,
            display.clone(),
            RenderMode::ReadOnly,
        );

        block_on(console.select_route(Some("route1".into()))).unwrap();
        block_on(console.select_route(None)).unwrap();

        assert_eq!(bins.fetches.lock().unwrap().len(), 1);
        assert_eq!(display.count(|e| matches!(e, DisplayEvent::RouteCleared)), 1);
        assert!(console.displayed_route().is_none());
    }

    #[test]
    fn a_route_with_no_bins_clears_the_displayed_route() {
        let bins = FakeBins::with(vec![bin_at(1, 44.05, "route1")]);
        let directions = FakeDirections::with(vec![ok_response(2)]);
        let display = FakeDisplay::new();

        let mut console = MapConsole::new(
            bins,
            directions.clone(),
            display.clone(),
            RenderMode::ReadOnly,
        );

        block_on(console.select_route(Some("route1".into()))).unwrap();
        assert!(console.displayed_route().is_some());

        block_on(console.select_route(Some("route2".into()))).unwrap();

        assert!(console.displayed_route().is_none());
        assert_eq!(display.count(|e| matches!(e, DisplayEvent::RouteCleared)), 1);
        // Only the first selection dispatched a request.
        assert_eq!(directions.requests.lock().unwrap().len(), 1);
    }

    #[test]
    fn a_failed_status_leaves_the_previous_route_untouched() {
        let bins = FakeBins::with(vec![bin_at(1, 44.05, "route1")]);
        let directions = FakeDirections::with(vec![
            ok_response(2),
            failed_response(DirectionsStatus::OverQueryLimit),
        ]);
        let display = FakeDisplay::new();

        let mut console = MapConsole::new(
            bins,
            directions,
            display.clone(),
            RenderMode::ReadOnly,
        );

        block_on(console.select_route(Some("route1".into()))).unwrap();
        let displayed = console.displayed_route();
        assert!(displayed.is_some());

        block_on(console.select_route(Some("route1".into()))).unwrap();

        assert_eq!(console.displayed_route(), displayed);
        assert_eq!(display.count(|e| matches!(e, DisplayEvent::Route { .. })), 1);
    }

    #[test]
    fn a_transport_error_is_swallowed_at_the_boundary() {
        let bins = FakeBins::with(vec![bin_at(1, 44.05, "route1")]);
        let directions = FakeDirections::with(vec![]);
        let display = FakeDisplay::new();

        let mut console = MapConsole::new(
            bins,
            directions,
            display.clone(),
            RenderMode::ReadOnly,
        );

        block_on(console.select_route(Some("route1".into()))).unwrap();

        assert!(console.displayed_route().is_none());
        assert_eq!(display.count(|e| matches!(e, DisplayEvent::Route { .. })), 0);
    }

    #[test]
    fn admin_mode_renders_markers_without_planning() {
        let bins = FakeBins::with(vec![bin_at(1, 44.05, "route1")]);
        let directions = FakeDirections::with(vec![ok_response(2)]);
        let display = FakeDisplay::new();

        let mut console = MapConsole::new(
            bins,
            directions.clone(),
            display.clone(),
            RenderMode::Admin,
        );

        block_on(console.select_route(Some("route1".into()))).unwrap();

        assert_eq!(display.count(|e| matches!(e, DisplayEvent::Marker(_))), 1);
        assert!(directions.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn deleting_a_bin_removes_exactly_its_marker() {
        let bins = FakeBins::with(vec![
            bin_at(1, 44.05, "route1"),
            bin_at(2, 44.02, "route1"),
        ]);
        let directions = FakeDirections::with(vec![]);
        let display = FakeDisplay::new();

        let mut console = MapConsole::new(
            bins.clone(),
            directions,
            display.clone(),
            RenderMode::Admin,
        );

        block_on(console.select_route(Some("route1".into()))).unwrap();
        let removed_before = display.count(|e| matches!(e, DisplayEvent::Removed(_)));

        block_on(console.delete_bin(1)).unwrap();

        assert_eq!(bins.deleted.lock().unwrap().as_slice(), &[1]);
        assert_eq!(
            display.count(|e| matches!(e, DisplayEvent::Removed(_))),
            removed_before + 1
        );
        // No full refresh on delete.
        assert_eq!(bins.fetches.lock().unwrap().len(), 1);
    }

    #[test]
    fn saving_a_staged_bin_requires_a_route_and_a_position() {
        let bins = FakeBins::with(vec![]);
        let directions = FakeDirections::with(vec![]);
        let display = FakeDisplay::new();

        let mut console = MapConsole::new(
            bins.clone(),
            directions,
            display.clone(),
            RenderMode::Admin,
        );

        assert_eq!(
            block_on(console.save_staged_bin("by the gate".into())).unwrap_err().code,
            100
        );

        block_on(console.select_route(Some("route1".into()))).unwrap();
        block_on(console.stage_position(Coordinates::new(44.1, -63.1))).unwrap();
        block_on(console.save_staged_bin("by the gate".into())).unwrap();

        let created = bins.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].route, "route1");
        assert_eq!(created[0].location, Coordinates::new(44.1, -63.1));
    }

    #[test]
    fn admin_operations_are_rejected_in_read_only_mode() {
        let bins = FakeBins::with(vec![]);
        let directions = FakeDirections::with(vec![]);
        let display = FakeDisplay::new();

        let mut console = MapConsole::new(bins, directions, display, RenderMode::ReadOnly);

        let err = block_on(console.stage_position(Coordinates::new(44.0, -63.0))).unwrap_err();
        assert_eq!(err.code, 100);

        let err = block_on(console.delete_bin(1)).unwrap_err();
        assert_eq!(err.code, 100);
    }

    #[test]
    fn denied_geolocation_falls_back_with_one_notice() {
        let bins = FakeBins::with(vec![]);
        let directions = FakeDirections::with(vec![]);
        let display = FakeDisplay::new();

        let mut console = MapConsole::new(
            bins,
            directions,
            display.clone(),
            RenderMode::ReadOnly,
        );

        block_on(console.locate(&DeniedLocation)).unwrap();

        assert_eq!(display.count(|e| matches!(e, DisplayEvent::Notice(_))), 1);
    }
}
