use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{GeocodeFailure, ProviderError},
    model::PlaceCandidate,
};

use super::{PlaceSearchApi, execute, http_client};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const DIRECT_PATH: &str = "/geo/1.0/direct";

/// OpenWeather direct geocoding (place name to coordinates).
#[derive(Debug, Clone)]
pub struct OpenWeatherGeocoder {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl OpenWeatherGeocoder {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, ProviderError> {
        Ok(Self::with_client(http_client()?, base_url, api_key))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwPlace {
    name: String,
    #[serde(default)]
    country: String,
    state: Option<String>,
    lat: f64,
    lon: f64,
}

#[async_trait]
impl PlaceSearchApi for OpenWeatherGeocoder {
    async fn search_places(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PlaceCandidate>, GeocodeFailure> {
        let api_key = self.api_key.as_deref().ok_or(GeocodeFailure::MissingApiKey)?;
        let url = format!("{}{DIRECT_PATH}", self.base_url);
        let limit = limit.to_string();

        tracing::debug!(query, "searching places");

        let body = execute(self.http.get(&url).query(&[
            ("q", query),
            ("limit", limit.as_str()),
            ("appid", api_key),
        ]))
        .await?;

        Ok(parse_direct_body(&body)?)
    }
}

/// Keeps the service's ranking; ids are positions in that ranking.
fn parse_direct_body(body: &str) -> Result<Vec<PlaceCandidate>, ProviderError> {
    let places: Vec<OwPlace> = serde_json::from_str(body)
        .map_err(|error| ProviderError::InvalidResponse(format!("geocode payload: {error}")))?;

    Ok(places
        .into_iter()
        .enumerate()
        .map(|(index, place)| {
            PlaceCandidate::new(
                index,
                place.name,
                place.country,
                place.state,
                place.lat,
                place.lon,
            )
        })
        .collect())
}
