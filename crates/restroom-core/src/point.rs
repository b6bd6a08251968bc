//! The `GeoPoint` record shared by every data source.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::geo::{distance_meters, Coordinates};

/// Which backing store produced a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Internal,
    External,
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Internal => write!(f, "internal"),
            Source::External => write!(f, "external"),
        }
    }
}

/// A single feature flag or descriptive value attached to a point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Text(String),
}

pub type Attributes = BTreeMap<String, AttributeValue>;

/// A point of interest with coordinates, rating summary and provenance.
///
/// `id` is only unique within its `source`. Cross-source identity is decided
/// by spatial proximity during merge, never by comparing ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub source: Source,
    pub average_rating: Option<f64>,
    pub rating_count: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    /// Relative to the query center; never persisted.
    pub distance_meters: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lon: self.lon,
        }
    }

    #[must_use]
    pub fn distance_to_point(&self, other: &GeoPoint) -> f64 {
        distance_meters(self.lat, self.lon, other.lat, other.lon)
    }

    /// Recompute `distance_meters` relative to `center`.
    pub fn annotate_distance(&mut self, center: Coordinates) {
        self.distance_meters = distance_meters(center.lat, center.lon, self.lat, self.lon);
    }

    #[must_use]
    pub fn has_ratings(&self) -> bool {
        self.rating_count > 0 && self.average_rating.is_some()
    }
}

/// Sort points nearest-first. NaN distances sort last.
pub fn sort_by_distance(points: &mut [GeoPoint]) {
    points.sort_by(|a, b| a.distance_meters.total_cmp(&b.distance_meters));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, distance_meters: f64) -> GeoPoint {
        GeoPoint {
            id: id.to_string(),
            name: format!("Restroom {id}"),
            lat: 0.0,
            lon: 0.0,
            source: Source::Internal,
            average_rating: None,
            rating_count: 0,
            attributes: Attributes::new(),
            distance_meters,
        }
    }

    #[test]
    fn source_serializes_lowercase() {
        let json = serde_json::to_string(&Source::External).unwrap();
        assert_eq!(json, "\"external\"");
    }

    #[test]
    fn geo_point_serializes_camel_case_with_untagged_attributes() {
        let mut p = point("a", 12.0);
        p.average_rating = Some(4.5);
        p.rating_count = 2;
        p.attributes
            .insert("accessible".to_string(), AttributeValue::Bool(true));
        p.attributes.insert(
            "address".to_string(),
            AttributeValue::Text("1 Decatur St".to_string()),
        );

        let json: serde_json::Value = serde_json::to_value(&p).unwrap();
        assert_eq!(json["averageRating"].as_f64(), Some(4.5));
        assert_eq!(json["ratingCount"].as_u64(), Some(2));
        assert_eq!(json["source"].as_str(), Some("internal"));
        assert_eq!(json["attributes"]["accessible"].as_bool(), Some(true));
        assert_eq!(json["attributes"]["address"].as_str(), Some("1 Decatur St"));
    }

    #[test]
    fn empty_attributes_are_omitted() {
        let json: serde_json::Value = serde_json::to_value(point("a", 1.0)).unwrap();
        assert!(json.get("attributes").is_none());
    }

    #[test]
    fn sort_by_distance_orders_nearest_first() {
        let mut points = vec![point("far", 300.0), point("near", 5.0), point("mid", 40.0)];
        sort_by_distance(&mut points);
        let ids: Vec<&str> = points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
    }

    #[test]
    fn annotate_distance_uses_center() {
        let mut p = point("a", 0.0);
        p.lat = 1.0;
        p.annotate_distance(Coordinates { lat: 0.0, lon: 0.0 });
        assert!((p.distance_meters - 111_195.0).abs() < 120.0);
    }
}
