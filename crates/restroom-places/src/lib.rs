pub mod client;
pub mod error;
pub mod normalize;
pub(crate) mod retry;
pub mod types;

pub use client::PlacesClient;
pub use error::PlacesError;
pub use normalize::place_to_geo_point;
pub use types::{NearbySearchResponse, PlaceResult};
