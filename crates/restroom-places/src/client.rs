//! HTTP client for the Google Places Nearby Search API.
//!
//! Wraps `reqwest` with Places-specific status handling, API key management,
//! bounded retries, and normalisation into [`GeoPoint`]s. The API key travels
//! as a query parameter, so request URLs are stripped from every surfaced
//! error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use restroom_core::{Coordinates, GeoPoint, PlacesProvider};

use crate::error::PlacesError;
use crate::normalize::place_to_geo_point;
use crate::retry::{max_total_backoff, retry_with_backoff};
use crate::types::{NearbySearchResponse, PlaceResult};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/";
const NEARBY_SEARCH_PATH: &str = "maps/api/place/nearbysearch/json";

/// Largest radius the Nearby Search endpoint accepts.
const MAX_PROVIDER_RADIUS_METERS: f64 = 50_000.0;

/// Client for Google Places Nearby Search.
///
/// Use [`PlacesClient::new`] for production or [`PlacesClient::with_base_url`]
/// to point at a mock server in tests.
pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: Url,
    attempt_timeout: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl PlacesClient {
    /// Creates a client pointed at the production Places API.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, PlacesError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`PlacesError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, PlacesError> {
        let attempt_timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(attempt_timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent("restroom-finder/0.1 (nearby-search)")
            .build()?;

        // Exactly one trailing slash so the endpoint path joins under it.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised)
            .and_then(|u| u.join(NEARBY_SEARCH_PATH))
            .map_err(|e| PlacesError::InvalidBaseUrl(format!("{base_url}: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            attempt_timeout,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Retry transient failures up to `max_retries` extra times.
    #[must_use]
    pub fn with_retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Longest one [`Self::nearby_search`] can take: every attempt running
    /// to its timeout plus the longest back-off between them.
    #[must_use]
    pub fn call_budget(&self) -> Duration {
        self.attempt_timeout
            .saturating_mul(self.max_retries.saturating_add(1))
            .saturating_add(max_total_backoff(self.max_retries, self.backoff_base_ms))
    }

    /// Runs one Nearby Search around `center`, retrying transient failures.
    ///
    /// Results with no usable location are dropped. Only the first result
    /// page is fetched.
    ///
    /// # Errors
    ///
    /// - [`PlacesError::QuotaExceeded`] / [`PlacesError::RequestDenied`] for
    ///   key or billing problems (never retried).
    /// - [`PlacesError::Api`] for other non-OK statuses.
    /// - [`PlacesError::Http`] on network failure or non-2xx HTTP status.
    /// - [`PlacesError::Deserialize`] if the envelope is malformed.
    pub async fn nearby_search(
        &self,
        center: Coordinates,
        radius_meters: f64,
        keyword: Option<&str>,
    ) -> Result<Vec<GeoPoint>, PlacesError> {
        let url = self.build_url(center, radius_meters, keyword);
        let envelope = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_envelope(&url)
        })
        .await?;

        let total = envelope.results.len();
        let points: Vec<GeoPoint> = envelope
            .results
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<PlaceResult>(raw) {
                Ok(place) => Some(place),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping malformed Places result");
                    None
                }
            })
            .filter_map(|place| place_to_geo_point(place, center))
            .collect();

        if points.len() < total {
            tracing::debug!(
                total,
                kept = points.len(),
                "dropped Places results without a usable location"
            );
        }
        if envelope.next_page_token.is_some() {
            tracing::debug!("Places returned further pages; only the first is used");
        }
        Ok(points)
    }

    fn build_url(&self, center: Coordinates, radius_meters: f64, keyword: Option<&str>) -> Url {
        let radius = radius_meters.clamp(1.0, MAX_PROVIDER_RADIUS_METERS);
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("location", &format!("{},{}", center.lat, center.lon));
            pairs.append_pair("radius", &format!("{radius:.0}"));
            if let Some(k) = keyword.filter(|k| !k.trim().is_empty()) {
                pairs.append_pair("keyword", k);
            }
            pairs.append_pair("key", &self.api_key);
        }
        url
    }

    async fn request_envelope(&self, url: &Url) -> Result<NearbySearchResponse, PlacesError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;
        let response = response
            .error_for_status()
            .map_err(reqwest::Error::without_url)?;
        let body = response.text().await.map_err(reqwest::Error::without_url)?;

        let envelope: NearbySearchResponse =
            serde_json::from_str(&body).map_err(|e| PlacesError::Deserialize {
                context: "nearbysearch response".to_string(),
                source: e,
            })?;
        Self::check_status(&envelope)?;
        Ok(envelope)
    }

    /// Maps the envelope `status` onto [`PlacesError`]. `ZERO_RESULTS` is a
    /// successful empty answer.
    fn check_status(envelope: &NearbySearchResponse) -> Result<(), PlacesError> {
        let message = || {
            envelope
                .error_message
                .clone()
                .unwrap_or_else(|| envelope.status.clone())
        };
        match envelope.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(()),
            "OVER_QUERY_LIMIT" => Err(PlacesError::QuotaExceeded(message())),
            "REQUEST_DENIED" => Err(PlacesError::RequestDenied(message())),
            other => Err(PlacesError::Api {
                status: other.to_string(),
                message: message(),
            }),
        }
    }
}

#[async_trait]
impl PlacesProvider for PlacesClient {
    type Error = PlacesError;

    async fn search_nearby(
        &self,
        center: Coordinates,
        radius_meters: f64,
        category: Option<&str>,
    ) -> Result<Vec<GeoPoint>, PlacesError> {
        self.nearby_search(center, radius_meters, category).await
    }
}
