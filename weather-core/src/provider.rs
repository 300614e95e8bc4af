use crate::{
    Config,
    error::{GeocodeFailure, ProviderError},
    model::{ForecastRequest, PlaceCandidate, RawForecastResponse},
    provider::{
        bigdatacloud::BigDataCloudClient, open_meteo::OpenMeteoClient,
        openweather::OpenWeatherGeocoder,
    },
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::{fmt::Debug, sync::Arc, time::Duration};

pub mod bigdatacloud;
pub mod open_meteo;
pub mod openweather;

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("weather-cli/", env!("CARGO_PKG_VERSION"));

/// Source of columnar forecast data.
#[async_trait]
pub trait ForecastApi: Send + Sync + Debug {
    /// One entry per result set; an empty vector means the API had nothing.
    async fn fetch_forecast(
        &self,
        request: &ForecastRequest,
    ) -> Result<Vec<RawForecastResponse>, ProviderError>;
}

/// Fields of a reverse-geocoding answer the dashboard cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReverseGeocode {
    pub city: Option<String>,
    pub locality: Option<String>,
    pub country_name: Option<String>,
}

#[async_trait]
pub trait ReverseGeocoder: Send + Sync + Debug {
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ReverseGeocode, GeocodeFailure>;
}

/// Forward geocoding: free text to ranked places.
#[async_trait]
pub trait PlaceSearchApi: Send + Sync + Debug {
    async fn search_places(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PlaceCandidate>, GeocodeFailure>;
}

/// The three external services the dashboard talks to.
#[derive(Debug, Clone)]
pub struct Providers {
    pub forecast: Arc<dyn ForecastApi>,
    pub reverse_geocoder: Arc<dyn ReverseGeocoder>,
    pub places: Arc<dyn PlaceSearchApi>,
}

/// Construct the HTTP-backed providers from config.
///
/// A missing OpenWeather key is not an error here; place searches report
/// [`GeocodeFailure::MissingApiKey`] instead.
pub fn providers_from_config(config: &Config) -> Result<Providers, ProviderError> {
    let http = http_client()?;
    let endpoints = &config.endpoints;

    Ok(Providers {
        forecast: Arc::new(OpenMeteoClient::with_client(
            http.clone(),
            endpoints.forecast.clone(),
        )),
        reverse_geocoder: Arc::new(BigDataCloudClient::with_client(
            http.clone(),
            endpoints.reverse_geocode.clone(),
        )),
        places: Arc::new(OpenWeatherGeocoder::with_client(
            http,
            endpoints.forward_geocode.clone(),
            config.openweather_api_key(),
        )),
    })
}

pub(crate) fn http_client() -> Result<Client, ProviderError> {
    Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|error| ProviderError::Transport(error.to_string()))
}

/// Sends the request and returns the body of a successful response.
pub(crate) async fn execute(request: RequestBuilder) -> Result<String, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|error| ProviderError::Transport(error.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|error| ProviderError::Transport(error.to_string()))?;

    if status.is_success() {
        return Ok(body);
    }

    let message = extract_error_message(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });

    Err(ProviderError::Http {
        status: status.as_u16(),
        message,
    })
}

fn extract_error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    let from_json = serde_json::from_str::<Value>(trimmed).ok().and_then(|json| {
        ["reason", "message", "error", "description"]
            .into_iter()
            .filter_map(|key| json.get(key).and_then(Value::as_str))
            .map(str::trim)
            .find(|message| !message.is_empty())
            .map(str::to_string)
    });

    from_json.or_else(|| Some(truncate_body(trimmed)))
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
