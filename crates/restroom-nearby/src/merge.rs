//! Cross-source deduplication by spatial proximity.
//!
//! Names and ids differ between the restroom store and the places provider,
//! so two records are the same place only if they sit closer together than
//! the dedup threshold. Cost is O(n·m) in the input sizes.

use restroom_core::GeoPoint;

pub const DEFAULT_DEDUP_THRESHOLD_METERS: f64 = 50.0;

/// Merge `external` into `internal`, dropping external points that lie
/// strictly closer than `threshold_meters` to any already-included point.
///
/// Every internal point is kept. Each external point is compared against the
/// internal points and against external points appended before it. When a
/// duplicate is dropped and the point it collapses into has no ratings, that
/// point adopts the duplicate's rating summary.
///
/// Output order is unspecified; callers sort afterwards.
#[must_use]
pub fn merge(
    internal: Vec<GeoPoint>,
    external: Vec<GeoPoint>,
    threshold_meters: f64,
) -> Vec<GeoPoint> {
    let mut merged = internal;
    merged.reserve(external.len());
    let mut duplicates = 0usize;

    for candidate in external {
        match nearest(&merged, &candidate) {
            Some((idx, distance)) if distance < threshold_meters => {
                duplicates += 1;
                let kept = &mut merged[idx];
                if !kept.has_ratings() && candidate.has_ratings() {
                    kept.average_rating = candidate.average_rating;
                    kept.rating_count = candidate.rating_count;
                }
                tracing::trace!(
                    kept = %kept.id,
                    dropped = %candidate.id,
                    distance,
                    "dropped external duplicate"
                );
            }
            _ => merged.push(candidate),
        }
    }

    if duplicates > 0 {
        tracing::debug!(duplicates, total = merged.len(), "merged nearby sources");
    }
    merged
}

/// Index of and distance to the point in `points` closest to `target`.
/// NaN distances never win.
fn nearest(points: &[GeoPoint], target: &GeoPoint) -> Option<(usize, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(idx, p)| (idx, p.distance_to_point(target)))
        .filter(|(_, d)| !d.is_nan())
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
