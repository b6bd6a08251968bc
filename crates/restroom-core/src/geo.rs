//! Great-circle distance and coordinate helpers.
//!
//! Distances are computed with the Haversine formula on a sphere of mean
//! Earth radius. Nothing here validates its inputs except
//! [`Coordinates::new`]; a NaN fed to [`distance_meters`] comes back out as NaN.

use serde::{Deserialize, Serialize};

use crate::CoreError;

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Length of one degree of latitude on the sphere [`distance_meters`] uses.
/// A larger conversion factor would shrink a [`BoundingBox`] below the circle.
pub const MAX_METERS_PER_DEGREE: f64 = EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0;

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinates`] when either value is
    /// non-finite or outside `[-90, 90]` / `[-180, 180]`.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoreError> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if valid {
            Ok(Self { lat, lon })
        } else {
            Err(CoreError::InvalidCoordinates { lat, lon })
        }
    }

    #[must_use]
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        distance_meters(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Haversine great-circle distance in meters, full precision.
#[must_use]
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Round a distance to whole meters for presentation.
#[must_use]
pub fn display_meters(meters: f64) -> f64 {
    meters.round()
}

/// Rectangular lat/lon range used as an index-friendly pre-filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Box that contains every point within `radius_meters` of `center`.
    ///
    /// The latitude half-height is `radius_meters / meters_per_degree`. The
    /// longitude half-width is widened by `1 / cos(lat)` at the most poleward
    /// edge of the box so the rectangle never clips the circle east or west.
    /// When the box touches a pole or crosses the antimeridian the longitude
    /// range opens to the full `[-180, 180]`; the exact distance filter that
    /// follows removes the extra rows. `meters_per_degree` is capped at
    /// [`MAX_METERS_PER_DEGREE`].
    #[must_use]
    pub fn around(center: Coordinates, radius_meters: f64, meters_per_degree: f64) -> Self {
        let meters_per_degree = meters_per_degree.min(MAX_METERS_PER_DEGREE);
        let lat_delta = radius_meters / meters_per_degree;
        let min_lat = (center.lat - lat_delta).max(-90.0);
        let max_lat = (center.lat + lat_delta).min(90.0);

        let poleward = min_lat.abs().max(max_lat.abs());
        let cos_lat = poleward.to_radians().cos();
        let full_width = Self {
            min_lat,
            max_lat,
            min_lon: -180.0,
            max_lon: 180.0,
        };

        if poleward >= 90.0 || cos_lat <= f64::EPSILON {
            return full_width;
        }

        let lon_delta = radius_meters / (meters_per_degree * cos_lat);
        let min_lon = center.lon - lon_delta;
        let max_lon = center.lon + lon_delta;
        if min_lon < -180.0 || max_lon > 180.0 {
            return full_width;
        }

        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relative_error(actual: f64, expected: f64) -> f64 {
        ((actual - expected) / expected).abs()
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_meters(0.0, 0.0, 1.0, 0.0);
        assert!(relative_error(d, 111_195.0) < 0.001, "got {d}");
    }

    #[test]
    fn one_degree_of_longitude_at_equator_matches_latitude_degree() {
        let d = distance_meters(0.0, 10.0, 0.0, 11.0);
        assert!(relative_error(d, 111_195.0) < 0.001, "got {d}");
    }

    #[test]
    fn new_york_to_london() {
        // Published great-circle distance is ~5570 km.
        let d = distance_meters(40.7128, -74.0060, 51.5074, -0.1278);
        assert!(relative_error(d, 5_570_000.0) < 0.005, "got {d}");
    }

    #[test]
    fn identical_points_are_zero_apart() {
        assert!(distance_meters(29.9511, -90.0715, 29.9511, -90.0715).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = distance_meters(29.9511, -90.0715, 29.9515, -90.0710);
        let b = distance_meters(29.9515, -90.0710, 29.9511, -90.0715);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn new_orleans_cafe_is_tens_of_meters_from_center() {
        let d = distance_meters(29.9511, -90.0715, 29.9515, -90.0710);
        assert!((d - 65.6).abs() < 1.0, "got {d}");
    }

    #[test]
    fn nan_propagates() {
        assert!(distance_meters(f64::NAN, 0.0, 0.0, 0.0).is_nan());
    }

    #[test]
    fn display_meters_rounds_to_whole_meters() {
        assert!((display_meters(65.57) - 66.0).abs() < f64::EPSILON);
        assert!((display_meters(12.4) - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn coordinates_reject_out_of_range_and_non_finite() {
        assert!(Coordinates::new(90.1, 0.0).is_err());
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
        assert!(Coordinates::new(0.0, f64::INFINITY).is_err());
        assert!(Coordinates::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn bounding_box_contains_points_on_the_circle() {
        let center = Coordinates::new(60.0, 10.0).unwrap();
        let radius = 5_000.0;
        let bbox = BoundingBox::around(center, radius, 111_000.0);

        // Walk the circle and make sure every boundary point is inside the box.
        for step in 0..36 {
            let bearing = f64::from(step * 10).to_radians();
            let angular = radius / EARTH_RADIUS_METERS;
            let phi1 = center.lat.to_radians();
            let lambda1 = center.lon.to_radians();
            let phi2 =
                (phi1.sin() * angular.cos() + phi1.cos() * angular.sin() * bearing.cos()).asin();
            let lambda2 = lambda1
                + (bearing.sin() * angular.sin() * phi1.cos())
                    .atan2(angular.cos() - phi1.sin() * phi2.sin());
            let (lat, lon) = (phi2.to_degrees(), lambda2.to_degrees());
            assert!(bbox.contains(lat, lon), "({lat}, {lon}) outside {bbox:?}");
        }
    }

    #[test]
    fn bounding_box_opens_longitude_across_antimeridian() {
        let center = Coordinates::new(0.0, 179.99).unwrap();
        let bbox = BoundingBox::around(center, 5_000.0, 111_000.0);
        assert!((bbox.min_lon + 180.0).abs() < f64::EPSILON);
        assert!((bbox.max_lon - 180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn bounding_box_clamps_at_pole() {
        let center = Coordinates::new(89.99, 0.0).unwrap();
        let bbox = BoundingBox::around(center, 5_000.0, 111_000.0);
        assert!((bbox.max_lat - 90.0).abs() < f64::EPSILON);
        assert!((bbox.min_lon + 180.0).abs() < f64::EPSILON);
    }

    #[test]
    fn oversized_meters_per_degree_is_capped() {
        let center = Coordinates::new(29.9511, -90.0715).unwrap();
        let bbox = BoundingBox::around(center, 5_000.0, 150_000.0);
        // 4 km due north of the center.
        let north = center.lat + (4_000.0 / EARTH_RADIUS_METERS).to_degrees();
        assert!(distance_meters(center.lat, center.lon, north, center.lon) < 5_000.0);
        assert!(bbox.contains(north, center.lon), "{bbox:?}");
        assert_eq!(bbox, BoundingBox::around(center, 5_000.0, MAX_METERS_PER_DEGREE));
    }
}
