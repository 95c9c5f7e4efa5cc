use async_trait::async_trait;
use std::env;

use crate::{
    api::LocationAPI,
    entities::Coordinates,
    error::{location_unavailable, Error},
};

/// One-shot location provider reading the coordinate handed to the process
/// by the host environment. Stands in for the platform geolocation prompt;
/// missing or malformed values surface as `location_unavailable`.
#[derive(Debug)]
pub struct EnvLocation;

#[async_trait]
impl LocationAPI for EnvLocation {
    #[tracing::instrument]
    async fn current_location(&self) -> Result<Coordinates, Error> {
        let latitude = env::var("CURBSIDE_START_LAT").map_err(|_| location_unavailable())?;
        let longitude = env::var("CURBSIDE_START_LNG").map_err(|_| location_unavailable())?;

        let latitude: f64 = latitude.parse().map_err(|_| location_unavailable())?;
        let longitude: f64 = longitude.parse().map_err(|_| location_unavailable())?;

        Ok(Coordinates::new(latitude, longitude))
    }
}
