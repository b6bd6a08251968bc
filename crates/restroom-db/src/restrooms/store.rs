//! [`GeoStore`] implementation over Postgres/PostGIS.
//!
//! The primary path is the `find_nearby_restrooms` RPC. Any failure there
//! (missing function, network error, bad row shape, timeout) falls back to a
//! bounding-box range scan followed by an exact Haversine filter. Both paths
//! return only points inside the radius, nearest first.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use restroom_core::{sort_by_distance, AppConfig, BoundingBox, Coordinates, GeoPoint, GeoStore};
use sqlx::PgPool;

use super::read::{find_nearby_rpc, list_restrooms_in_bbox};
use crate::DbError;

#[derive(Debug, Clone)]
pub struct PgGeoStore {
    pool: PgPool,
    meters_per_degree: f64,
    query_timeout: Duration,
}

impl PgGeoStore {
    #[must_use]
    pub fn new(pool: PgPool, meters_per_degree: f64, query_timeout: Duration) -> Self {
        Self {
            pool,
            meters_per_degree,
            query_timeout,
        }
    }

    #[must_use]
    pub fn from_app_config(pool: PgPool, config: &AppConfig) -> Self {
        Self::new(
            pool,
            config.meters_per_degree,
            Duration::from_secs(config.store_query_timeout_secs),
        )
    }

    async fn find_nearby_primary(
        &self,
        center: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<GeoPoint>, DbError> {
        let rows = self
            .with_timeout(
                "find_nearby_restrooms rpc",
                find_nearby_rpc(&self.pool, center, radius_meters),
            )
            .await?;
        let mut points: Vec<GeoPoint> = rows
            .into_iter()
            .map(super::types::NearbyRestroomRow::into_geo_point)
            .collect();
        sort_by_distance(&mut points);
        Ok(points)
    }

    async fn find_nearby_fallback(
        &self,
        center: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<GeoPoint>, DbError> {
        let bbox = BoundingBox::around(center, radius_meters, self.meters_per_degree);
        let rows = self
            .with_timeout(
                "bounding-box fallback",
                list_restrooms_in_bbox(&self.pool, &bbox),
            )
            .await?;
        let candidates = rows.len();
        let points = filter_within_radius(
            rows.into_iter().map(|row| row.into_geo_point(center)),
            center,
            radius_meters,
        );
        tracing::debug!(
            candidates,
            kept = points.len(),
            radius_meters,
            "bounding-box fallback filtered candidates"
        );
        Ok(points)
    }

    async fn with_timeout<T, F>(&self, operation: &'static str, fut: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result.map_err(DbError::from),
            Err(_) => Err(DbError::Timeout {
                operation,
                secs: self.query_timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl GeoStore for PgGeoStore {
    type Error = DbError;

    async fn find_nearby(
        &self,
        center: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<GeoPoint>, DbError> {
        let primary_err = match self.find_nearby_primary(center, radius_meters).await {
            Ok(points) => return Ok(points),
            Err(e) => e,
        };

        tracing::warn!(
            error = %primary_err,
            lat = center.lat,
            lon = center.lon,
            radius_meters,
            "geodesic rpc failed; falling back to bounding-box query"
        );

        match self.find_nearby_fallback(center, radius_meters).await {
            Ok(points) => Ok(points),
            Err(fallback_err) => {
                tracing::error!(
                    primary = %primary_err,
                    fallback = %fallback_err,
                    "restroom store unavailable on both query paths"
                );
                Err(DbError::NearbyQueryFailed {
                    primary: Box::new(primary_err),
                    fallback: Box::new(fallback_err),
                })
            }
        }
    }
}

/// Re-annotate `points` relative to `center`, keep those within
/// `radius_meters`, and sort nearest first.
pub fn filter_within_radius<I>(points: I, center: Coordinates, radius_meters: f64) -> Vec<GeoPoint>
where
    I: IntoIterator<Item = GeoPoint>,
{
    let mut kept: Vec<GeoPoint> = points
        .into_iter()
        .map(|mut point| {
            point.annotate_distance(center);
            point
        })
        .filter(|point| point.distance_meters <= radius_meters)
        .collect();
    sort_by_distance(&mut kept);
    kept
}
