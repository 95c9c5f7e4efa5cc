use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::env;

use crate::{
    api::DirectionsAPI,
    entities::{
        Coordinates, DirectionsResponse, DirectionsStatus, RouteLeg, RoutePlan, WaypointRequest,
    },
    error::{invalid_input_error, upstream_error, Error},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Response {
    status: String,
    routes: Vec<WireRoute>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WireRoute {
    waypoint_order: Vec<usize>,
    legs: Vec<WireLeg>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct WireLeg {
    start_location: WirePoint,
    end_location: WirePoint,
    distance: WireValue,
    duration: WireValue,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct WirePoint {
    lat: f64,
    lng: f64,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
struct WireValue {
    value: f64,
}

impl From<WireRoute> for RoutePlan {
    fn from(route: WireRoute) -> Self {
        RoutePlan {
            waypoint_order: route.waypoint_order,
            legs: route
                .legs
                .into_iter()
                .map(|leg| RouteLeg {
                    start: Coordinates::new(leg.start_location.lat, leg.start_location.lng),
                    end: Coordinates::new(leg.end_location.lat, leg.end_location.lng),
                    distance_meters: leg.distance.value,
                    duration_seconds: leg.duration.value,
                })
                .collect(),
        }
    }
}

fn waypoints_param(request: &WaypointRequest) -> String {
    let stops = request
        .stops
        .iter()
        .map(|stop| String::from(*stop))
        .collect::<Vec<_>>()
        .join("|");

    if request.allow_reordering {
        format!("optimize:true|{}", stops)
    } else {
        stops
    }
}

/// Reqwest-backed client for the external directions/optimization service.
#[derive(Debug)]
pub struct Directions;

#[async_trait]
impl DirectionsAPI for Directions {
    #[tracing::instrument]
    async fn route(&self, request: &WaypointRequest) -> Result<DirectionsResponse, Error> {
        let api_base = env::var("DIRECTIONS_API_BASE")?;
        let url = format!("https://{}/maps/api/directions/json", api_base);
        let key = env::var("DIRECTIONS_API_KEY")?;

        let origin: String = request.origin.into();
        let destination: String = request.destination.into();

        let res = reqwest::Client::new()
            .get(url)
            .query(&[("key", key)])
            .query(&[("origin", origin)])
            .query(&[("destination", destination)])
            .query(&[("waypoints", waypoints_param(request))])
            .query(&[("mode", "driving".to_string())])
            .send()
            .await?;

        let status_code = res.status().as_u16();

        if status_code >= 400 && status_code < 500 {
            return Err(invalid_input_error());
        } else if status_code != 200 {
            return Err(upstream_error());
        }

        let data: Response = res.json().await?;

        Ok(DirectionsResponse {
            status: DirectionsStatus::from_code(&data.status),
            plan: data.routes.into_iter().next().map(RoutePlan::from),
        })
    }
}

#[cfg(test)]
fn request_with_stops(stops: Vec<Coordinates>) -> WaypointRequest {
    WaypointRequest {
        origin: Coordinates::new(44.0, -63.0),
        destination: stops[0],
        stops,
        allow_reordering: true,
    }
}

#[test]
fn waypoints_are_pipe_joined_with_optimize_prefix() {
    let request = request_with_stops(vec![
        Coordinates::new(44.1, -63.1),
        Coordinates::new(44.2, -63.2),
    ]);

    assert_eq!(
        waypoints_param(&request),
        "optimize:true|44.1,-63.1|44.2,-63.2"
    );
}

#[test]
fn fixed_order_omits_the_optimize_prefix() {
    let mut request = request_with_stops(vec![Coordinates::new(44.1, -63.1)]);
    request.allow_reordering = false;

    assert_eq!(waypoints_param(&request), "44.1,-63.1");
}

#[test]
fn response_decodes_into_a_plan() {
    let data: Response = serde_json::from_str(
        r#"{
            "status": "OK",
            "routes": [{
                "waypoint_order": [1, 0],
                "legs": [{
                    "start_location": {"lat": 44.0, "lng": -63.0},
                    "end_location": {"lat": 44.1, "lng": -63.1},
                    "distance": {"value": 1500.0},
                    "duration": {"value": 240.0}
                }]
            }]
        }"#,
    )
    .unwrap();

    assert_eq!(DirectionsStatus::from_code(&data.status), DirectionsStatus::Ok);

    let plan = RoutePlan::from(data.routes.into_iter().next().unwrap());

    assert_eq!(plan.waypoint_order, vec![1, 0]);
    assert_eq!(plan.legs.len(), 1);
    assert_eq!(plan.legs[0].distance_meters, 1500.0);
    assert_eq!(plan.legs[0].end, Coordinates::new(44.1, -63.1));
}

#[test]
fn empty_routes_decode_to_no_plan() {
    let data: Response =
        serde_json::from_str(r#"{"status": "ZERO_RESULTS", "routes": []}"#).unwrap();

    let response = DirectionsResponse {
        status: DirectionsStatus::from_code(&data.status),
        plan: data.routes.into_iter().next().map(RoutePlan::from),
    };

    assert_eq!(response.status, DirectionsStatus::ZeroResults);
    assert!(response.plan.is_none());
}
