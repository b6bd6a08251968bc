use restroom_core::CoreError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum NearbyError {
    #[error("invalid coordinates: lat={lat}, lon={lon}")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("invalid radius {radius_meters} m: must be positive and at most {max_meters} m")]
    InvalidRadius { radius_meters: f64, max_meters: f64 },

    /// Both store query paths failed. Fatal.
    #[error("restroom store query failed: {0}")]
    StoreQueryFailed(#[source] BoxError),

    /// The external provider failed or timed out. Never returned from the
    /// aggregator; surfaced as a warning on the result instead.
    #[error("external places provider failed: {0}")]
    ExternalProviderFailed(#[source] BoxError),
}

impl NearbyError {
    /// Whether the error stems from caller input rather than a backend.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            NearbyError::InvalidCoordinates { .. } | NearbyError::InvalidRadius { .. }
        )
    }
}

impl From<CoreError> for NearbyError {
    fn from(err: CoreError) -> Self {
        let CoreError::InvalidCoordinates { lat, lon } = err;
        NearbyError::InvalidCoordinates { lat, lon }
    }
}

/// A collaborator call exceeded its time budget.
#[derive(Debug, Error)]
#[error("{operation} timed out after {millis} ms")]
pub struct TimedOut {
    pub operation: &'static str,
    pub millis: u128,
}
