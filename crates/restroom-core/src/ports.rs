//! Collaborator interfaces consumed by the nearby aggregator.
//!
//! Implementations live in `restroom-db` (Postgres/PostGIS) and
//! `restroom-places` (Google Places); tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::geo::Coordinates;
use crate::point::GeoPoint;

/// The domain-owned store of user-contributed points.
///
/// Implementations return only points within `radius_meters` of `center`,
/// sorted nearest-first, each annotated with `distance_meters`. A failure must
/// be reported as `Err`, never as an empty list.
#[async_trait]
pub trait GeoStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn find_nearby(
        &self,
        center: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<GeoPoint>, Self::Error>;
}

/// A third-party place-search provider.
///
/// Every returned point is tagged [`crate::Source::External`] and carries a
/// `distance_meters` relative to `center`.
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn search_nearby(
        &self,
        center: Coordinates,
        radius_meters: f64,
        category: Option<&str>,
    ) -> Result<Vec<GeoPoint>, Self::Error>;
}
