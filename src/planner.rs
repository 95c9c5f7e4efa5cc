//! Nearest-bin selection and waypoint sequencing. Pure computation; issuing
//! the request and rendering its result belong to the console and its
//! collaborators.

use crate::entities::{Bin, Coordinates, WaypointRequest};
use crate::error::{no_bins_available, Error};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points, in kilometers (haversine).
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Returns the bin closest to `origin`. Ties go to the bin appearing first
/// in the input.
pub fn select_nearest_bin(origin: Coordinates, bins: &[Bin]) -> Result<&Bin, Error> {
    if bins.is_empty() {
        return Err(no_bins_available());
    }

    let mut nearest = &bins[0];
    let mut min_distance = distance_km(origin, nearest.location);

    for bin in &bins[1..] {
        let distance = distance_km(origin, bin.location);

        if distance < min_distance {
            min_distance = distance;
            nearest = bin;
        }
    }

    Ok(nearest)
}

/// Builds the directions request for one planning pass. The nearest bin
/// becomes the destination and still appears among the stops; the optimizer
/// is told to reorder freely.
pub fn build_waypoint_request(
    origin: Coordinates,
    bins: &[Bin],
) -> Result<WaypointRequest, Error> {
    let nearest = select_nearest_bin(origin, bins)?;

    Ok(WaypointRequest {
        origin,
        destination: nearest.location,
        stops: bins.iter().map(|bin| bin.location).collect(),
        allow_reordering: true,
    })
}

#[cfg(test)]
fn bin_at(id: i64, latitude: f64, longitude: f64) -> Bin {
    Bin {
        id,
        location: Coordinates::new(latitude, longitude),
        note: format!("bin {}", id),
        route: "route1".into(),
        image: None,
    }
}

#[test]
fn distance_is_symmetric() {
    let halifax = Coordinates::new(44.6488, -63.5752);
    let truro = Coordinates::new(45.3654, -63.2799);

    let there = distance_km(halifax, truro);
    let back = distance_km(truro, halifax);

    assert!((there - back).abs() < 1e-9);
}

#[test]
fn distance_to_self_is_zero() {
    let point = Coordinates::new(44.6488, -63.5752);

    assert_eq!(distance_km(point, point), 0.0);
}

#[test]
fn distance_matches_known_offsets() {
    let origin = Coordinates::new(45.0, -63.0);

    // One hundredth of a degree of latitude is roughly 1.11 km.
    let near = distance_km(origin, Coordinates::new(45.01, -63.0));
    assert!((near - 1.11).abs() < 0.01, "got {}", near);

    // A full degree is roughly 111 km.
    let far = distance_km(origin, Coordinates::new(46.0, -63.0));
    assert!((far - 111.0).abs() < 0.5, "got {}", far);
}

#[test]
fn nearest_bin_minimizes_distance() {
    let origin = Coordinates::new(44.0, -63.0);
    let bins = vec![
        bin_at(1, 44.05, -63.0),
        bin_at(2, 44.02, -63.0),
        bin_at(3, 44.08, -63.0),
    ];

    let nearest = select_nearest_bin(origin, &bins).unwrap();

    assert_eq!(nearest.id, 2);
}

#[test]
fn nearby_bin_beats_distant_bin() {
    let origin = Coordinates::new(45.0, -63.0);
    let bins = vec![bin_at(1, 45.01, -63.0), bin_at(2, 46.0, -63.0)];

    assert_eq!(select_nearest_bin(origin, &bins).unwrap().id, 1);
}

#[test]
fn single_bin_is_always_nearest() {
    let bins = vec![bin_at(7, 44.0, -63.0)];

    for origin in [
        Coordinates::new(0.0, 0.0),
        Coordinates::new(44.0, -63.0),
        Coordinates::new(-80.0, 170.0),
    ] {
        assert_eq!(select_nearest_bin(origin, &bins).unwrap().id, 7);
    }
}

#[test]
fn equidistant_bins_tie_break_on_input_order() {
    let origin = Coordinates::new(44.0, -63.0);
    let bins = vec![bin_at(5, 44.03, -63.0), bin_at(6, 44.03, -63.0)];

    assert_eq!(select_nearest_bin(origin, &bins).unwrap().id, 5);
}

#[test]
fn no_bins_is_signalled_without_computing() {
    let origin = Coordinates::new(44.0, -63.0);

    let err = select_nearest_bin(origin, &[]).unwrap_err();
    assert_eq!(err.code, crate::error::no_bins_available().code);

    let err = build_waypoint_request(origin, &[]).unwrap_err();
    assert_eq!(err.code, crate::error::no_bins_available().code);
}

#[test]
fn request_targets_nearest_and_keeps_every_stop() {
    let origin = Coordinates::new(44.0, -63.0);
    let bins = vec![
        bin_at(1, 44.05, -63.0),
        bin_at(2, 44.02, -63.0),
        bin_at(3, 44.08, -63.0),
    ];

    let request = build_waypoint_request(origin, &bins).unwrap();

    assert_eq!(request.origin, origin);
    assert_eq!(request.destination, bins[1].location);
    assert!(request.allow_reordering);

    assert_eq!(request.stops.len(), 3);
    for bin in &bins {
        assert!(request.stops.contains(&bin.location));
    }
}
