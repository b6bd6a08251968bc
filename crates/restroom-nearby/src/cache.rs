//! Process-local TTL cache for merged nearby results.
//!
//! Keys round the center to 4 decimal places (about 11 m), so near-identical
//! queries share an entry. Entries older than the TTL are misses and the
//! entry count is bounded; both are enforced by `moka`.

use std::time::Duration;

use moka::future::Cache;
use restroom_core::{Coordinates, GeoPoint};

/// Cache key: center rounded to 4 decimal places plus the exact radius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey {
    lat_e4: i64,
    lon_e4: i64,
    radius_bits: u64,
}

impl QueryKey {
    #[must_use]
    pub fn new(center: Coordinates, radius_meters: f64) -> Self {
        Self {
            lat_e4: round_e4(center.lat),
            lon_e4: round_e4(center.lon),
            // Normalise -0.0 so it hashes like 0.0.
            radius_bits: (radius_meters + 0.0).to_bits(),
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_e4(degrees: f64) -> i64 {
    // |degrees| <= 180 so the product always fits.
    (degrees * 10_000.0).round() as i64
}

pub struct ResultCache {
    /// `None` when caching is disabled.
    inner: Option<Cache<QueryKey, Vec<GeoPoint>>>,
}

impl ResultCache {
    /// A `max_entries` of zero disables caching.
    #[must_use]
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        let inner = (max_entries > 0).then(|| {
            Cache::builder()
                .max_capacity(u64::try_from(max_entries).unwrap_or(u64::MAX))
                .time_to_live(ttl)
                .build()
        });
        Self { inner }
    }

    /// Fresh results for `key`, or `None` on a miss.
    pub async fn get(&self, key: &QueryKey) -> Option<Vec<GeoPoint>> {
        self.inner.as_ref()?.get(key).await
    }

    /// Store `results` under `key`, replacing any previous entry.
    pub async fn put(&self, key: QueryKey, results: Vec<GeoPoint>) {
        if let Some(cache) = &self.inner {
            cache.insert(key, results).await;
        }
    }

    /// Apply pending evictions and drop expired entries.
    pub async fn run_pending_tasks(&self) {
        if let Some(cache) = &self.inner {
            cache.run_pending_tasks().await;
        }
    }

    /// Approximate number of live entries; exact after [`Self::run_pending_tasks`].
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.as_ref().map_or(0, Cache::entry_count)
    }
}

#[cfg(test)]
mod tests {
    use restroom_core::{Attributes, Source};

    use super::*;

    const TTL: Duration = Duration::from_millis(300);

    fn key(lat: f64, lon: f64, radius: f64) -> QueryKey {
        QueryKey::new(Coordinates::new(lat, lon).unwrap(), radius)
    }

    fn results(id: &str) -> Vec<GeoPoint> {
        vec![GeoPoint {
            id: id.to_string(),
            name: "Restroom".to_string(),
            lat: 0.0,
            lon: 0.0,
            source: Source::Internal,
            average_rating: None,
            rating_count: 0,
            attributes: Attributes::new(),
            distance_meters: 12.0,
        }]
    }

    #[test]
    fn key_rounds_to_four_decimals() {
        assert_eq!(key(29.951_14, -90.071_54, 5000.0), key(29.951_1, -90.071_5, 5000.0));
        assert_ne!(key(29.951_16, -90.0715, 5000.0), key(29.951_1, -90.0715, 5000.0));
    }

    #[test]
    fn key_distinguishes_radius() {
        assert_ne!(key(29.9511, -90.0715, 5000.0), key(29.9511, -90.0715, 1000.0));
    }

    #[tokio::test]
    async fn entry_is_fresh_until_ttl_elapses() {
        let cache = ResultCache::new(TTL, 10);
        let k = key(29.9511, -90.0715, 5000.0);
        cache.put(k, results("a")).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.get(&k).await, Some(results("a")));

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(cache.get(&k).await, None);
    }

    #[tokio::test]
    async fn put_overwrites_existing_entry() {
        let cache = ResultCache::new(TTL, 10);
        let k = key(1.0, 1.0, 100.0);
        cache.put(k, results("old")).await;
        cache.put(k, results("new")).await;
        assert_eq!(cache.get(&k).await, Some(results("new")));
        cache.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 1);
    }

    #[tokio::test]
    async fn overwrite_restarts_the_ttl() {
        let cache = ResultCache::new(TTL, 10);
        let k = key(1.0, 1.0, 100.0);
        cache.put(k, results("old")).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        cache.put(k, results("new")).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cache.get(&k).await, Some(results("new")));
    }

    #[tokio::test]
    async fn entry_count_is_bounded() {
        let cache = ResultCache::new(Duration::from_secs(300), 2);
        for i in 0..10 {
            cache.put(key(f64::from(i), 1.0, 100.0), results("x")).await;
        }
        cache.run_pending_tasks().await;
        assert!(cache.entry_count() <= 2, "count {}", cache.entry_count());
    }

    #[tokio::test]
    async fn pending_tasks_drop_expired_entries() {
        let cache = ResultCache::new(TTL, 10);
        cache.put(key(1.0, 1.0, 100.0), results("old")).await;
        cache.put(key(2.0, 2.0, 100.0), results("old")).await;
        tokio::time::sleep(Duration::from_millis(400)).await;

        cache.run_pending_tasks().await;
        assert_eq!(cache.entry_count(), 0);
    }

    #[tokio::test]
    async fn zero_capacity_disables_caching() {
        let cache = ResultCache::new(TTL, 0);
        let k = key(1.0, 1.0, 100.0);
        cache.put(k, results("a")).await;
        assert!(cache.get(&k).await.is_none());
        assert_eq!(cache.entry_count(), 0);
    }
}
