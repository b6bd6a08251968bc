//! Insert helpers for seeding restrooms and ratings.

use sqlx::PgPool;
use uuid::Uuid;

use crate::restrooms::RestroomFeatures;

/// Input record for inserting a restroom.
#[derive(Debug, Clone)]
pub struct NewRestroom {
    pub name: String,
    pub address: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub features: RestroomFeatures,
}

/// Insert a restroom and return its generated id.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the insert fails, e.g. out-of-range coordinates.
pub async fn insert_restroom(pool: &PgPool, restroom: &NewRestroom) -> Result<Uuid, sqlx::Error> {
    sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO restrooms \
            (name, address, lat, lon, is_accessible, is_free, requires_key, \
             has_changing_table, is_gender_neutral) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING id",
    )
    .bind(&restroom.name)
    .bind(restroom.address.as_deref())
    .bind(restroom.lat)
    .bind(restroom.lon)
    .bind(restroom.features.is_accessible)
    .bind(restroom.features.is_free)
    .bind(restroom.features.requires_key)
    .bind(restroom.features.has_changing_table)
    .bind(restroom.features.is_gender_neutral)
    .fetch_one(pool)
    .await
}

/// Record a 1-5 star rating against a restroom.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the insert fails, including when `rating` is
/// outside 1-5 or the restroom does not exist.
pub async fn insert_rating(pool: &PgPool, restroom_id: Uuid, rating: i16) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO ratings (restroom_id, rating) VALUES ($1, $2)")
        .bind(restroom_id)
        .bind(rating)
        .execute(pool)
        .await?;
    Ok(())
}
