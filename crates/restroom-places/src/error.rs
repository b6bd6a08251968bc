use thiserror::Error;

/// Errors returned by the Google Places client.
#[derive(Debug, Error)]
pub enum PlacesError {
    /// Network or TLS failure, or a non-2xx HTTP status. The request URL is
    /// stripped so the API key never reaches logs.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// `OVER_QUERY_LIMIT`: the key's quota or billing limit is exhausted.
    #[error("Places quota exceeded: {0}")]
    QuotaExceeded(String),

    /// `REQUEST_DENIED`: invalid, restricted or missing API key.
    #[error("Places request denied: {0}")]
    RequestDenied(String),

    /// Any other non-OK status in the response envelope.
    #[error("Places API error {status}: {message}")]
    Api { status: String, message: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid Places base URL '{0}'")]
    InvalidBaseUrl(String),
}
