//! Read operations for the `restrooms` table.

use restroom_core::{BoundingBox, Coordinates};
use sqlx::PgPool;

use super::types::{NearbyRestroomRow, RestroomRow};

/// Call the `find_nearby_restrooms` geography-index RPC.
///
/// Rows come back pre-filtered to `radius_meters`, ordered by
/// `distance_meters ASC`.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails, including when the function
/// has not been deployed.
pub async fn find_nearby_rpc(
    pool: &PgPool,
    center: Coordinates,
    radius_meters: f64,
) -> Result<Vec<NearbyRestroomRow>, sqlx::Error> {
    sqlx::query_as::<_, NearbyRestroomRow>(
        "SELECT id, name, address, lat, lon, distance_meters, \
                is_accessible, is_free, requires_key, has_changing_table, \
                is_gender_neutral, rating_count, avg_rating \
         FROM find_nearby_restrooms($1, $2, $3)",
    )
    .bind(center.lat)
    .bind(center.lon)
    .bind(radius_meters)
    .fetch_all(pool)
    .await
}

/// List restrooms whose coordinates fall inside `bbox`, with every rating
/// value collected per row.
///
/// This is a plain range scan over the `lat`/`lon` B-tree indexes and does
/// not depend on PostGIS. Rows are unordered and may lie outside the radius
/// the box was built from.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_restrooms_in_bbox(
    pool: &PgPool,
    bbox: &BoundingBox,
) -> Result<Vec<RestroomRow>, sqlx::Error> {
    sqlx::query_as::<_, RestroomRow>(
        "SELECT r.id, r.name, r.address, r.lat, r.lon, \
                r.is_accessible, r.is_free, r.requires_key, \
                r.has_changing_table, r.is_gender_neutral, \
                COALESCE(\
                    ARRAY_AGG(rt.rating) FILTER (WHERE rt.rating IS NOT NULL), \
                    ARRAY[]::SMALLINT[]\
                ) AS ratings \
         FROM restrooms r \
         LEFT JOIN ratings rt ON rt.restroom_id = r.id \
         WHERE r.lat BETWEEN $1 AND $2 \
           AND r.lon BETWEEN $3 AND $4 \
         GROUP BY r.id",
    )
    .bind(bbox.min_lat)
    .bind(bbox.max_lat)
    .bind(bbox.min_lon)
    .bind(bbox.max_lon)
    .fetch_all(pool)
    .await
}
