//! Row types for the `restrooms` table and the `find_nearby_restrooms` RPC.

use restroom_core::{AttributeValue, Attributes, Coordinates, GeoPoint, Source};
use uuid::Uuid;

/// Boolean feature columns shared by both query shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct RestroomFeatures {
    pub is_accessible: bool,
    pub is_free: bool,
    pub requires_key: bool,
    pub has_changing_table: bool,
    pub is_gender_neutral: bool,
}

impl RestroomFeatures {
    fn into_attributes(self, address: Option<String>) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(
            "accessible".to_string(),
            AttributeValue::Bool(self.is_accessible),
        );
        attributes.insert(
            "fee_required".to_string(),
            AttributeValue::Bool(!self.is_free),
        );
        attributes.insert(
            "requires_key".to_string(),
            AttributeValue::Bool(self.requires_key),
        );
        attributes.insert(
            "changing_table".to_string(),
            AttributeValue::Bool(self.has_changing_table),
        );
        attributes.insert(
            "gender_neutral".to_string(),
            AttributeValue::Bool(self.is_gender_neutral),
        );
        if let Some(address) = address.filter(|a| !a.trim().is_empty()) {
            attributes.insert("address".to_string(), AttributeValue::Text(address));
        }
        attributes
    }
}

/// A row returned by `find_nearby_restrooms`, pre-filtered by radius with a
/// server-computed distance and rating summary.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NearbyRestroomRow {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub distance_meters: f64,
    #[sqlx(flatten)]
    pub features: RestroomFeatures,
    pub rating_count: i64,
    pub avg_rating: Option<f64>,
}

impl NearbyRestroomRow {
    #[must_use]
    pub fn into_geo_point(self) -> GeoPoint {
        let rating_count = u32::try_from(self.rating_count.max(0)).unwrap_or(u32::MAX);
        GeoPoint {
            id: self.id.to_string(),
            name: self.name,
            lat: self.lat,
            lon: self.lon,
            source: Source::Internal,
            average_rating: self.avg_rating.filter(|_| rating_count > 0),
            rating_count,
            attributes: self.features.into_attributes(self.address),
            distance_meters: self.distance_meters,
        }
    }
}

/// A raw `restrooms` row from the bounding-box fallback, with its individual
/// rating values collected into an array.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RestroomRow {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub lat: f64,
    pub lon: f64,
    #[sqlx(flatten)]
    pub features: RestroomFeatures,
    pub ratings: Vec<i16>,
}

impl RestroomRow {
    /// Convert to a point, computing the rating summary client-side and the
    /// distance from `center` with the Haversine formula.
    #[must_use]
    pub fn into_geo_point(self, center: Coordinates) -> GeoPoint {
        let (average_rating, rating_count) = summarize_ratings(&self.ratings);
        let mut point = GeoPoint {
            id: self.id.to_string(),
            name: self.name,
            lat: self.lat,
            lon: self.lon,
            source: Source::Internal,
            average_rating,
            rating_count,
            attributes: self.features.into_attributes(self.address),
            distance_meters: 0.0,
        };
        point.annotate_distance(center);
        point
    }
}

/// Mean and count of a set of star ratings. No ratings yields `(None, 0)`.
#[must_use]
pub fn summarize_ratings(ratings: &[i16]) -> (Option<f64>, u32) {
    if ratings.is_empty() {
        return (None, 0);
    }
    let count = u32::try_from(ratings.len()).unwrap_or(u32::MAX);
    let sum: f64 = ratings.iter().copied().map(f64::from).sum();
    (Some(sum / f64::from(count)), count)
}
