//! Nearby-point aggregation: query the restroom store and an external places
//! provider together, drop cross-source duplicates, and cache the merged
//! answer for a short time.

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod merge;

pub use aggregator::{AggregatorSettings, NearbyAggregator, NearbyResults};
pub use cache::{QueryKey, ResultCache};
pub use error::{NearbyError, TimedOut};
pub use merge::{merge, DEFAULT_DEDUP_THRESHOLD_METERS};
pub use restroom_core::distance_meters;
