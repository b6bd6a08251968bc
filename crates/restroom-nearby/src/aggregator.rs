//! The public entry point: validate, check the cache, query both sources
//! concurrently, merge, sort, cache.
//!
//! The restroom store is authoritative: if it fails the whole call fails.
//! The places provider is supplementary: its failures become warnings and the
//! caller still gets the internal results.

use std::future::Future;
use std::time::Duration;

use restroom_core::{sort_by_distance, AppConfig, Coordinates, GeoPoint, GeoStore, PlacesProvider};
use serde::Serialize;

use crate::cache::{QueryKey, ResultCache};
use crate::error::{NearbyError, TimedOut};
use crate::merge::{merge, DEFAULT_DEDUP_THRESHOLD_METERS};

/// Tunable policy for [`NearbyAggregator`].
#[derive(Debug, Clone)]
pub struct AggregatorSettings {
    pub dedup_threshold_meters: f64,
    pub max_radius_meters: f64,
    /// Budget for the whole store call, fallback included.
    pub store_timeout: Duration,
    /// Budget for the whole provider call, retries and back-off included.
    pub places_timeout: Duration,
    /// Category hint passed to the provider.
    pub places_category: Option<String>,
    pub cache_ttl: Duration,
    pub cache_max_entries: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            dedup_threshold_meters: DEFAULT_DEDUP_THRESHOLD_METERS,
            max_radius_meters: 50_000.0,
            store_timeout: Duration::from_secs(20),
            places_timeout: Duration::from_secs(10),
            places_category: Some("restroom".to_string()),
            cache_ttl: Duration::from_secs(300),
            cache_max_entries: 1_000,
        }
    }
}

impl AggregatorSettings {
    /// The store gets its per-path timeout twice over: primary then fallback.
    /// The provider gets one per-attempt timeout for every attempt; callers
    /// holding a real client should widen it with the client's own budget,
    /// which also counts back-off.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let category = config.places_keyword.trim();
        Self {
            dedup_threshold_meters: config.dedup_threshold_meters,
            max_radius_meters: config.max_radius_meters,
            store_timeout: Duration::from_secs(config.store_query_timeout_secs.saturating_mul(2)),
            places_timeout: Duration::from_secs(config.places_timeout_secs)
                .saturating_mul(config.places_max_retries.saturating_add(1)),
            places_category: (!category.is_empty()).then(|| category.to_string()),
            cache_ttl: Duration::from_secs(config.cache_ttl_secs),
            cache_max_entries: config.cache_max_entries,
        }
    }
}

/// Merged answer for one nearby query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyResults {
    /// Nearest first.
    pub points: Vec<GeoPoint>,
    /// Non-fatal degradations, e.g. the places provider being down.
    pub warnings: Vec<String>,
    /// Whether the points came from the result cache.
    pub cached: bool,
}

pub struct NearbyAggregator<S, P> {
    store: S,
    places: Option<P>,
    cache: ResultCache,
    settings: AggregatorSettings,
}

impl<S, P> NearbyAggregator<S, P>
where
    S: GeoStore,
    P: PlacesProvider,
{
    /// `places` may be `None` when no provider is configured; results are
    /// then internal-only without a warning.
    #[must_use]
    pub fn new(store: S, places: Option<P>, settings: AggregatorSettings) -> Self {
        let cache = ResultCache::new(settings.cache_ttl, settings.cache_max_entries);
        Self {
            store,
            places,
            cache,
            settings,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Find points within `radius_meters` of (`lat`, `lon`) from both sources,
    /// deduplicated and sorted nearest first.
    ///
    /// Inputs are validated before any backend call. Results are served from
    /// cache while fresh; degraded results (provider failed) are not cached.
    ///
    /// # Errors
    ///
    /// - [`NearbyError::InvalidCoordinates`] / [`NearbyError::InvalidRadius`]
    ///   for out-of-range or non-finite input.
    /// - [`NearbyError::StoreQueryFailed`] if the restroom store fails or
    ///   times out.
    pub async fn find_nearby_aggregated(
        &self,
        lat: f64,
        lon: f64,
        radius_meters: f64,
    ) -> Result<NearbyResults, NearbyError> {
        let center = Coordinates::new(lat, lon)?;
        self.validate_radius(radius_meters)?;

        let key = QueryKey::new(center, radius_meters);
        if let Some(mut points) = self.cache.get(&key).await {
            // The entry may have been filled from a slightly different center.
            for point in &mut points {
                point.annotate_distance(center);
            }
            points.retain(|p| p.distance_meters <= radius_meters);
            sort_by_distance(&mut points);
            tracing::debug!(lat, lon, radius_meters, count = points.len(), "nearby cache hit");
            return Ok(NearbyResults {
                points,
                warnings: Vec::new(),
                cached: true,
            });
        }
        tracing::debug!(lat, lon, radius_meters, "nearby cache miss");

        let (internal, external) = tokio::join!(
            self.query_store(center, radius_meters),
            self.query_places(center, radius_meters),
        );
        let internal = internal?;

        let mut warnings = Vec::new();
        let external = match external {
            Ok(points) => points,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    lat,
                    lon,
                    radius_meters,
                    "places provider failed; returning internal results only"
                );
                warnings.push(err.to_string());
                Vec::new()
            }
        };

        // Provider radii are a hint; enforce ours.
        let external: Vec<GeoPoint> = external
            .into_iter()
            .map(|mut p| {
                p.annotate_distance(center);
                p
            })
            .filter(|p| p.distance_meters <= radius_meters)
            .collect();

        let internal_count = internal.len();
        let external_count = external.len();
        let mut points = merge(internal, external, self.settings.dedup_threshold_meters);
        for point in &mut points {
            point.annotate_distance(center);
        }
        sort_by_distance(&mut points);

        tracing::info!(
            lat,
            lon,
            radius_meters,
            internal = internal_count,
            external = external_count,
            merged = points.len(),
            degraded = !warnings.is_empty(),
            "nearby aggregation complete"
        );

        if warnings.is_empty() {
            self.cache.put(key, points.clone()).await;
        }

        Ok(NearbyResults {
            points,
            warnings,
            cached: false,
        })
    }

    fn validate_radius(&self, radius_meters: f64) -> Result<(), NearbyError> {
        let max_meters = self.settings.max_radius_meters;
        if radius_meters.is_finite() && radius_meters > 0.0 && radius_meters <= max_meters {
            Ok(())
        } else {
            Err(NearbyError::InvalidRadius {
                radius_meters,
                max_meters,
            })
        }
    }

    async fn query_store(
        &self,
        center: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<GeoPoint>, NearbyError> {
        let result = with_budget(
            "restroom store query",
            self.settings.store_timeout,
            self.store.find_nearby(center, radius_meters),
        )
        .await;
        result.map_err(|err| {
            tracing::error!(error = %err, "restroom store query failed");
            NearbyError::StoreQueryFailed(err)
        })
    }

    async fn query_places(
        &self,
        center: Coordinates,
        radius_meters: f64,
    ) -> Result<Vec<GeoPoint>, NearbyError> {
        let Some(places) = &self.places else {
            return Ok(Vec::new());
        };
        with_budget(
            "places search",
            self.settings.places_timeout,
            places.search_nearby(
                center,
                radius_meters,
                self.settings.places_category.as_deref(),
            ),
        )
        .await
        .map_err(NearbyError::ExternalProviderFailed)
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

async fn with_budget<T, E, F>(operation: &'static str, budget: Duration, fut: F) -> Result<T, BoxError>
where
    E: std::error::Error + Send + Sync + 'static,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(budget, fut).await {
        Ok(result) => result.map_err(|e| Box::new(e) as BoxError),
        Err(_) => Err(Box::new(TimedOut {
            operation,
            millis: budget.as_millis(),
        })),
    }
}
