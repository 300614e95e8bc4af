//! Shared fixtures for unit tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{GeocodeFailure, ProviderError};
use crate::model::{
    CurrentBlock, ForecastRequest, PlaceCandidate, RawForecastResponse, SeriesBlock, Variable,
    VariableColumns,
};
use crate::provider::{ForecastApi, PlaceSearchApi, Providers, ReverseGeocode, ReverseGeocoder};

/// Thursday 2026-10-15T00:00:00Z.
pub const BASE_EPOCH: i64 = 1_792_022_400;

pub fn series(time: i64, time_end: i64, interval: i64, columns: VariableColumns) -> SeriesBlock {
    SeriesBlock {
        time,
        time_end,
        interval,
        columns,
    }
}

/// 21.7 °C, 55 %, 0.34 mm, 14.2 km/h, overcast; 48 hours and 7 days of data.
pub fn sample_response(latitude: f64, longitude: f64) -> RawForecastResponse {
    let current = CurrentBlock {
        time: BASE_EPOCH + 15 * 3600,
        interval: 900,
        values: VariableColumns::new()
            .with(Variable::Temperature2m, vec![21.7])
            .with(Variable::RelativeHumidity2m, vec![55.0])
            .with(Variable::Precipitation, vec![0.34])
            .with(Variable::WeatherCode, vec![3.0])
            .with(Variable::WindSpeed10m, vec![14.2]),
    };

    let hours = 48;
    let hourly = series(
        BASE_EPOCH,
        BASE_EPOCH + hours * 3600,
        3600,
        VariableColumns::new()
            .with(
                Variable::Temperature2m,
                (0..hours).map(|hour| 18.0 + (hour % 24) as f64 * 0.5).collect(),
            )
            .with(Variable::WeatherCode, vec![1.0; hours as usize]),
    );

    let days = 7;
    let daily = series(
        BASE_EPOCH,
        BASE_EPOCH + days * 86_400,
        86_400,
        VariableColumns::new()
            .with(Variable::WeatherCode, vec![0.0; days as usize])
            .with(Variable::Temperature2mMax, vec![30.6; days as usize])
            .with(Variable::Temperature2mMin, vec![23.5; days as usize]),
    );

    RawForecastResponse {
        latitude,
        longitude,
        utc_offset_seconds: 0,
        current: Some(current),
        hourly: Some(hourly),
        daily: Some(daily),
    }
}

/// Forecast API double: answers with [`sample_response`] at the requested
/// coordinates unless scripted otherwise.
#[derive(Debug, Default)]
pub struct FakeForecast {
    pub requests: Mutex<Vec<ForecastRequest>>,
    pub failures: Mutex<Vec<Result<Vec<RawForecastResponse>, ProviderError>>>,
    /// Latitude that answers slowly.
    pub slow_latitude: Option<(f64, Duration)>,
}

#[async_trait]
impl ForecastApi for FakeForecast {
    async fn fetch_forecast(
        &self,
        request: &ForecastRequest,
    ) -> Result<Vec<RawForecastResponse>, ProviderError> {
        self.requests.lock().push(request.clone());

        if let Some((latitude, delay)) = self.slow_latitude {
            if latitude == request.latitude {
                tokio::time::sleep(delay).await;
            }
        }

        let scripted = {
            let mut failures = self.failures.lock();
            if failures.is_empty() {
                None
            } else {
                Some(failures.remove(0))
            }
        };

        scripted.unwrap_or_else(|| Ok(vec![sample_response(request.latitude, request.longitude)]))
    }
}

/// Names every place after its latitude, e.g. "City 24.85, Testland".
#[derive(Debug, Default)]
pub struct FakeGeocoder {
    pub fail: bool,
}

#[async_trait]
impl ReverseGeocoder for FakeGeocoder {
    async fn reverse_geocode(
        &self,
        latitude: f64,
        _longitude: f64,
    ) -> Result<ReverseGeocode, GeocodeFailure> {
        if self.fail {
            return Err(ProviderError::Transport("offline".into()).into());
        }

        Ok(ReverseGeocode {
            city: Some(format!("City {latitude}")),
            locality: None,
            country_name: Some("Testland".into()),
        })
    }
}

#[derive(Debug, Default)]
pub struct FakePlaces {
    pub queries: Mutex<Vec<String>>,
    pub results: Mutex<Vec<(String, Vec<PlaceCandidate>)>>,
    pub fail: bool,
    /// Every lookup answers after this long.
    pub delay: Option<Duration>,
}

impl FakePlaces {
    pub fn with_place(self, query: &str, candidates: Vec<PlaceCandidate>) -> Self {
        self.results.lock().push((query.to_string(), candidates));
        self
    }
}

#[async_trait]
impl PlaceSearchApi for FakePlaces {
    async fn search_places(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PlaceCandidate>, GeocodeFailure> {
        self.queries.lock().push(query.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail {
            return Err(ProviderError::Http {
                status: 500,
                message: "boom".into(),
            }
            .into());
        }

        let mut found = self
            .results
            .lock()
            .iter()
            .find(|(known, _)| known == query)
            .map(|(_, candidates)| candidates.clone())
            .unwrap_or_default();
        found.truncate(limit);
        Ok(found)
    }
}

pub fn candidate(id: usize, name: &str, latitude: f64, longitude: f64) -> PlaceCandidate {
    PlaceCandidate::new(id, name, "PK", None, latitude, longitude)
}

pub struct Fakes {
    pub forecast: Arc<FakeForecast>,
    pub geocoder: Arc<FakeGeocoder>,
    pub places: Arc<FakePlaces>,
}

impl Fakes {
    pub fn new(forecast: FakeForecast, geocoder: FakeGeocoder, places: FakePlaces) -> Self {
        Self {
            forecast: Arc::new(forecast),
            geocoder: Arc::new(geocoder),
            places: Arc::new(places),
        }
    }

    pub fn providers(&self) -> Providers {
        Providers {
            forecast: self.forecast.clone(),
            reverse_geocoder: self.geocoder.clone(),
            places: self.places.clone(),
        }
    }
}
