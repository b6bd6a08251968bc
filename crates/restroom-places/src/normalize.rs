//! Map Places results onto the shared [`GeoPoint`] shape.

use restroom_core::{AttributeValue, Attributes, Coordinates, GeoPoint, Source};

use crate::types::PlaceResult;

/// Convert one Places result into an external [`GeoPoint`].
///
/// Returns `None` when the result has no usable location or no displayable
/// name. The provider does not report distance, so it is computed from
/// `center` here.
#[must_use]
pub fn place_to_geo_point(place: PlaceResult, center: Coordinates) -> Option<GeoPoint> {
    let location = place.geometry.as_ref()?.location;
    let coordinates = Coordinates::new(location.lat, location.lng).ok()?;

    let name = place
        .name
        .filter(|n| !n.trim().is_empty())
        .or_else(|| place.vicinity.clone().filter(|v| !v.trim().is_empty()))?;

    let average_rating = place
        .rating
        .filter(|r| r.is_finite())
        .map(|r| r.clamp(0.0, 5.0));
    let rating_count = place.user_ratings_total.unwrap_or(0);

    let mut attributes = Attributes::new();
    if let Some(vicinity) = place.vicinity.filter(|v| !v.trim().is_empty()) {
        attributes.insert("vicinity".to_string(), AttributeValue::Text(vicinity));
    }
    if let Some(open_now) = place.opening_hours.and_then(|h| h.open_now) {
        attributes.insert("open_now".to_string(), AttributeValue::Bool(open_now));
    }
    if !place.types.is_empty() {
        attributes.insert(
            "place_types".to_string(),
            AttributeValue::Text(place.types.join(",")),
        );
    }

    Some(GeoPoint {
        id: place.place_id,
        name,
        lat: coordinates.lat,
        lon: coordinates.lon,
        source: Source::External,
        average_rating,
        rating_count,
        attributes,
        distance_meters: center.distance_to(&coordinates),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Geometry, LatLng, OpeningHours};

    fn center() -> Coordinates {
        Coordinates::new(29.9511, -90.0715).unwrap()
    }

    fn place(lat: f64, lng: f64) -> PlaceResult {
        PlaceResult {
            place_id: "ChIJ-cafe".to_string(),
            name: Some("Café du Monde".to_string()),
            geometry: Some(Geometry {
                location: LatLng { lat, lng },
            }),
            rating: Some(4.6),
            user_ratings_total: Some(120),
            vicinity: Some("800 Decatur St".to_string()),
            types: vec!["cafe".to_string(), "food".to_string()],
            opening_hours: Some(OpeningHours {
                open_now: Some(true),
            }),
        }
    }

    #[test]
    fn maps_full_result() {
        let point = place_to_geo_point(place(29.9515, -90.0711), center()).expect("point");
        assert_eq!(point.source, Source::External);
        assert_eq!(point.id, "ChIJ-cafe");
        assert_eq!(point.name, "Café du Monde");
        assert_eq!(point.rating_count, 120);
        assert_eq!(point.average_rating, Some(4.6));
        assert_eq!(
            point.attributes.get("open_now"),
            Some(&AttributeValue::Bool(true))
        );
        assert_eq!(
            point.attributes.get("place_types"),
            Some(&AttributeValue::Text("cafe,food".to_string()))
        );
        assert!(point.distance_meters > 50.0 && point.distance_meters < 70.0);
    }

    #[test]
    fn skips_result_without_geometry() {
        let mut p = place(0.0, 0.0);
        p.geometry = None;
        assert!(place_to_geo_point(p, center()).is_none());
    }

    #[test]
    fn skips_result_with_out_of_range_location() {
        assert!(place_to_geo_point(place(91.0, 0.0), center()).is_none());
    }

    #[test]
    fn falls_back_to_vicinity_for_name() {
        let mut p = place(29.9515, -90.0711);
        p.name = Some(String::new());
        let point = place_to_geo_point(p, center()).expect("point");
        assert_eq!(point.name, "800 Decatur St");
    }

    #[test]
    fn clamps_rating_into_star_range() {
        let mut p = place(29.9515, -90.0711);
        p.rating = Some(7.0);
        p.user_ratings_total = None;
        let point = place_to_geo_point(p, center()).expect("point");
        assert_eq!(point.average_rating, Some(5.0));
        assert_eq!(point.rating_count, 0);
    }
}
