use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{GeocodeFailure, ProviderError};

use super::{ReverseGeocode, ReverseGeocoder, execute, http_client};

pub const DEFAULT_BASE_URL: &str = "https://api.bigdatacloud.net";
const REVERSE_PATH: &str = "/data/reverse-geocode-client";

/// Keyless client-side reverse geocoding.
#[derive(Debug, Clone)]
pub struct BigDataCloudClient {
    base_url: String,
    http: Client,
}

impl BigDataCloudClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self::with_client(http_client()?, base_url))
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BdcResponse {
    city: Option<String>,
    locality: Option<String>,
    country_name: Option<String>,
}

#[async_trait]
impl ReverseGeocoder for BigDataCloudClient {
    async fn reverse_geocode(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ReverseGeocode, GeocodeFailure> {
        let url = format!("{}{REVERSE_PATH}", self.base_url);
        let latitude = latitude.to_string();
        let longitude = longitude.to_string();

        let body = execute(self.http.get(&url).query(&[
            ("latitude", latitude.as_str()),
            ("longitude", longitude.as_str()),
            ("localityLanguage", "en"),
        ]))
        .await?;

        Ok(parse_reverse_body(&body)?)
    }
}

fn parse_reverse_body(body: &str) -> Result<ReverseGeocode, ProviderError> {
    let parsed: BdcResponse = serde_json::from_str(body).map_err(|error| {
        ProviderError::InvalidResponse(format!("reverse geocode payload: {error}"))
    })?;

    Ok(ReverseGeocode {
        city: parsed.city,
        locality: parsed.locality,
        country_name: parsed.country_name,
    })
}
