pub mod app_config;
pub mod config;
pub mod geo;
pub mod point;
pub mod ports;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo::{display_meters, distance_meters, BoundingBox, Coordinates};
pub use point::{sort_by_distance, AttributeValue, Attributes, GeoPoint, Source};
pub use ports::{GeoStore, PlacesProvider};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
