//! Turns the forecast API's columnar result set into display-ready records.
//!
//! Every series is read through [`VariableColumns::get`], so reordering the
//! variables in a [`ForecastRequest`] cannot silently swap fields.

use chrono::{DateTime, NaiveDateTime, Timelike};

use crate::error::{ForecastError, ProviderError};
use crate::location;
use crate::model::{
    CurrentBlock, CurrentConditions, DailySample, Detail, Forecast, ForecastRequest,
    HourlySample, RawForecastResponse, SeriesBlock, Variable,
};
use crate::provider::{ForecastApi, ReverseGeocoder};
use crate::units::{Measurement, round_half_up};
use crate::weather_code::WeatherCategory;

/// Fetches, labels and decodes one forecast.
///
/// The location label comes from the coordinates the API reports, which
/// may be snapped to a grid point near the requested ones.
pub async fn load_forecast(
    forecast_api: &dyn ForecastApi,
    geocoder: &dyn ReverseGeocoder,
    request: &ForecastRequest,
) -> Result<Forecast, ForecastError> {
    let responses = forecast_api
        .fetch_forecast(request)
        .await
        .map_err(|error| match error {
            ProviderError::InvalidResponse(message) => ForecastError::Decode(message),
            other => other.into(),
        })?;
    let response = first_result(&responses)?;

    let label = location::resolve_label(geocoder, response.latitude, response.longitude).await;

    decode(request, response, label)
}

pub fn first_result(
    responses: &[RawForecastResponse],
) -> Result<&RawForecastResponse, ForecastError> {
    responses.first().ok_or(ForecastError::EmptyResponse)
}

pub fn decode(
    request: &ForecastRequest,
    response: &RawForecastResponse,
    location: String,
) -> Result<Forecast, ForecastError> {
    let offset = response.utc_offset_seconds;

    let current = response
        .current
        .as_ref()
        .ok_or_else(|| ForecastError::decode("response has no current block"))?;
    let hourly = response
        .hourly
        .as_ref()
        .ok_or_else(|| ForecastError::decode("response has no hourly block"))?;
    let daily = response
        .daily
        .as_ref()
        .ok_or_else(|| ForecastError::decode("response has no daily block"))?;

    let forecast = Forecast {
        current: decode_current(current, offset, location)?,
        hourly: decode_hourly(hourly, offset)?,
        daily: decode_daily(daily, offset)?,
    };

    tracing::debug!(
        latitude = request.latitude,
        longitude = request.longitude,
        hourly = forecast.hourly.len(),
        daily = forecast.daily.len(),
        "decoded forecast"
    );

    Ok(forecast)
}

/// Number of samples in a series, `(end - start) / interval`.
///
/// A non-positive interval, a negative span or a span that is not a whole
/// number of intervals is malformed and yields an empty series.
pub fn sample_count(series: &SeriesBlock) -> usize {
    if series.interval <= 0 {
        return 0;
    }

    let Some(span) = series.time_end.checked_sub(series.time) else {
        return 0;
    };

    if span < 0 || span % series.interval != 0 {
        tracing::warn!(
            time = series.time,
            time_end = series.time_end,
            interval = series.interval,
            "series span is not a whole number of intervals"
        );
        return 0;
    }

    usize::try_from(span / series.interval).unwrap_or(0)
}

fn decode_current(
    block: &CurrentBlock,
    offset: i64,
    location: String,
) -> Result<CurrentConditions, ForecastError> {
    let local = local_time(block.time, offset)?;

    let scalar = |variable: Variable| {
        block.value(variable).ok_or_else(|| {
            ForecastError::decode(format!("current block is missing {variable}"))
        })
    };

    let temperature = scalar(Variable::Temperature2m)?;
    let humidity = scalar(Variable::RelativeHumidity2m)?;
    let wind = scalar(Variable::WindSpeed10m)?;
    let precipitation = scalar(Variable::Precipitation)?;
    let code = scalar(Variable::WeatherCode)?;

    let details = vec![
        Detail {
            id: 0,
            measurement: Measurement::Temperature,
            value: reading(temperature),
        },
        Detail {
            id: 1,
            measurement: Measurement::Humidity,
            value: reading(humidity),
        },
        Detail {
            id: 2,
            measurement: Measurement::Wind,
            value: reading(wind),
        },
        Detail {
            id: 3,
            measurement: Measurement::Precipitation,
            value: Some(finite_or_zero(precipitation)),
        },
    ];

    Ok(CurrentConditions {
        time: local.format("%A, %b %-d, %Y").to_string(),
        weekday: local.format("%A").to_string(),
        location,
        details,
        category: WeatherCategory::from_value(code),
    })
}

fn decode_hourly(series: &SeriesBlock, offset: i64) -> Result<Vec<HourlySample>, ForecastError> {
    let count = sample_count(series);
    let temperatures = column(series, Variable::Temperature2m, count, "hourly")?;
    let codes = column(series, Variable::WeatherCode, count, "hourly")?;

    (0..count)
        .map(|index| {
            let local = sample_time(series, index, offset)?;
            Ok(HourlySample {
                index,
                day: local.format("%A").to_string(),
                time: hour_label(&local),
                temperature: rounded(temperatures[index]),
                category: WeatherCategory::from_value(codes[index]),
            })
        })
        .collect()
}

fn decode_daily(series: &SeriesBlock, offset: i64) -> Result<Vec<DailySample>, ForecastError> {
    let count = sample_count(series);
    let codes = column(series, Variable::WeatherCode, count, "daily")?;
    let maxima = column(series, Variable::Temperature2mMax, count, "daily")?;
    let minima = column(series, Variable::Temperature2mMin, count, "daily")?;

    (0..count)
        .map(|index| {
            let local = sample_time(series, index, offset)?;
            Ok(DailySample {
                index,
                day: local.format("%a").to_string(),
                category: WeatherCategory::from_value(codes[index]),
                temperature_max: rounded(maxima[index]),
                temperature_min: rounded(minima[index]),
            })
        })
        .collect()
}

fn column<'a>(
    series: &'a SeriesBlock,
    variable: Variable,
    count: usize,
    block: &str,
) -> Result<&'a [f64], ForecastError> {
    let values = series
        .columns
        .get(variable)
        .ok_or_else(|| ForecastError::decode(format!("{block} block is missing {variable}")))?;

    if values.len() < count {
        return Err(ForecastError::decode(format!(
            "{block} {variable} has {} values, expected {count}",
            values.len()
        )));
    }

    Ok(values)
}

fn sample_time(
    series: &SeriesBlock,
    index: usize,
    offset: i64,
) -> Result<NaiveDateTime, ForecastError> {
    let step = i64::try_from(index)
        .ok()
        .and_then(|index| index.checked_mul(series.interval))
        .ok_or_else(|| ForecastError::decode("sample time overflows"))?;
    let epoch = series
        .time
        .checked_add(step)
        .ok_or_else(|| ForecastError::decode("sample time overflows"))?;

    local_time(epoch, offset)
}

/// Wall-clock time at the forecast location.
fn local_time(epoch: i64, offset: i64) -> Result<NaiveDateTime, ForecastError> {
    let shifted = epoch
        .checked_add(offset)
        .ok_or_else(|| ForecastError::decode("timestamp overflows"))?;

    DateTime::from_timestamp(shifted, 0)
        .map(|time| time.naive_utc())
        .ok_or_else(|| ForecastError::decode(format!("timestamp {shifted} is out of range")))
}

/// "12 AM", "1 PM", ...
fn hour_label(time: &NaiveDateTime) -> String {
    let hour = time.hour();
    let period = if hour >= 12 { "PM" } else { "AM" };
    let display = match hour % 12 {
        0 => 12,
        other => other,
    };
    format!("{display} {period}")
}

/// Gaps in the data arrive as NaN and stay missing rather than reading 0.
fn rounded(value: f64) -> Option<i64> {
    value.is_finite().then(|| round_half_up(value))
}

fn reading(value: f64) -> Option<f64> {
    rounded(value).map(|value| value as f64)
}

/// A missing precipitation reading counts as none.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
