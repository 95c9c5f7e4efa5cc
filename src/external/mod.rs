pub mod bin_service;
pub mod directions;
pub mod geolocation;
