use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::ProviderError,
    model::{
        CurrentBlock, ForecastRequest, Granularity, RawForecastResponse, SeriesBlock, Variable,
        VariableColumns,
    },
};

use super::{ForecastApi, execute, http_client};

pub const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
const FORECAST_PATH: &str = "/v1/forecast";

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    base_url: String,
    http: Client,
}

impl OpenMeteoClient {
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

#[derive(Debug, Serialize)]
struct ForecastQuery<'a> {
    latitude: f64,
    longitude: f64,
    timezone: &'a str,
    timeformat: &'a str,
    current: String,
    hourly: String,
    daily: String,
}

impl<'a> ForecastQuery<'a> {
    fn from_request(request: &'a ForecastRequest) -> Self {
        Self {
            latitude: request.latitude,
            longitude: request.longitude,
            timezone: &request.timezone,
            timeformat: "unixtime",
            current: join_names(&request.current),
            hourly: join_names(&request.hourly),
            daily: join_names(&request.daily),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    utc_offset_seconds: i64,
    current: Option<OmCurrent>,
    hourly: Option<OmSeries>,
    daily: Option<OmSeries>,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    time: i64,
    #[serde(default)]
    interval: i64,
    #[serde(flatten)]
    values: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct OmSeries {
    #[serde(default)]
    time: Vec<i64>,
    #[serde(flatten)]
    values: HashMap<String, Value>,
}

#[async_trait]
impl ForecastApi for OpenMeteoClient {
    async fn fetch_forecast(
        &self,
        request: &ForecastRequest,
    ) -> Result<Vec<RawForecastResponse>, ProviderError> {
        let url = format!("{}{FORECAST_PATH}", self.base_url);
        let query = ForecastQuery::from_request(request);

        tracing::debug!(
            latitude = request.latitude,
            longitude = request.longitude,
            "requesting forecast"
        );

        let body = execute(self.http.get(&url).query(&query)).await?;
        parse_forecast_body(&body, request)
    }
}

/// The API answers with an object for one location and an array when
/// several result sets are returned.
pub(crate) fn parse_forecast_body(
    body: &str,
    request: &ForecastRequest,
) -> Result<Vec<RawForecastResponse>, ProviderError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|error| ProviderError::InvalidResponse(format!("forecast payload: {error}")))?;

    let items: Vec<OmResponse> = match payload {
        Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>(),
        other => serde_json::from_value(other).map(|item| vec![item]),
    }
    .map_err(|error| ProviderError::InvalidResponse(format!("forecast payload: {error}")))?;

    items
        .into_iter()
        .map(|item| into_raw_response(item, request))
        .collect()
}

fn into_raw_response(
    item: OmResponse,
    request: &ForecastRequest,
) -> Result<RawForecastResponse, ProviderError> {
    let current = item
        .current
        .map(|current| current_block(current, &request.current))
        .transpose()?;
    let hourly = item
        .hourly
        .map(|series| series_block(series, &request.hourly, Granularity::Hourly))
        .transpose()?;
    let daily = item
        .daily
        .map(|series| series_block(series, &request.daily, Granularity::Daily))
        .transpose()?;

    Ok(RawForecastResponse {
        latitude: item.latitude,
        longitude: item.longitude,
        utc_offset_seconds: item.utc_offset_seconds,
        current,
        hourly,
        daily,
    })
}

fn current_block(
    current: OmCurrent,
    variables: &[Variable],
) -> Result<CurrentBlock, ProviderError> {
    let mut values = VariableColumns::new();
    for variable in variables {
        let value = current
            .values
            .get(variable.api_name())
            .ok_or_else(|| missing(Granularity::Current, *variable))?;
        values.push(*variable, vec![number_or_nan(value)]);
    }

    Ok(CurrentBlock {
        time: current.time,
        interval: current.interval,
        values,
    })
}

/// Base time is the first timestamp; the interval is the granularity's
/// nominal spacing, so the end time always covers every returned sample.
fn series_block(
    series: OmSeries,
    variables: &[Variable],
    granularity: Granularity,
) -> Result<SeriesBlock, ProviderError> {
    let interval = granularity.nominal_interval_secs();
    let time = series.time.first().copied().unwrap_or(0);
    let samples = i64::try_from(series.time.len()).unwrap_or(0);

    let mut columns = VariableColumns::new();
    for variable in variables {
        let values = series
            .values
            .get(variable.api_name())
            .and_then(Value::as_array)
            .ok_or_else(|| missing(granularity, *variable))?;
        columns.push(*variable, values.iter().map(number_or_nan).collect());
    }

    // An axis that overflows is malformed and reads as empty.
    let time_end = samples
        .checked_mul(interval)
        .and_then(|span| time.checked_add(span))
        .unwrap_or(time);

    Ok(SeriesBlock {
        time,
        time_end,
        interval,
        columns,
    })
}

fn missing(granularity: Granularity, variable: Variable) -> ProviderError {
    ProviderError::InvalidResponse(format!(
        "{} payload: missing {variable}",
        granularity.as_str()
    ))
}

/// Gaps in the data come back as null.
fn number_or_nan(value: &Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

fn join_names(variables: &[Variable]) -> String {
    variables
        .iter()
        .map(Variable::api_name)
        .collect::<Vec<_>>()
        .join(",")
}
