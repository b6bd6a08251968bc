//! Nearby queries against the `restrooms` table.

mod read;
mod store;
mod types;

pub use read::{find_nearby_rpc, list_restrooms_in_bbox};
pub use store::{filter_within_radius, PgGeoStore};
pub use types::{summarize_ratings, NearbyRestroomRow, RestroomFeatures, RestroomRow};
