use thiserror::Error;

/// Failure talking to one of the external HTTP services.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("http error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Everything that can go wrong while loading one forecast.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ForecastError {
    #[error("No data received")]
    EmptyResponse,
    #[error("failed to decode forecast: {0}")]
    Decode(String),
    #[error("failed to fetch forecast: {0}")]
    Provider(#[from] ProviderError),
}

impl ForecastError {
    pub(crate) fn decode(message: impl Into<String>) -> Self {
        ForecastError::Decode(message.into())
    }
}

/// Forward or reverse geocoding failed. Callers absorb this: reverse lookups
/// fall back to a placeholder label, forward lookups become "not found".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeocodeFailure {
    #[error("geocoding request failed: {0}")]
    Provider(#[from] ProviderError),
    #[error("no OpenWeather API key configured")]
    MissingApiKey,
}
