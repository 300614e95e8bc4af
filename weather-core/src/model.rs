use std::fmt;

use serde::{Deserialize, Serialize};

use crate::units::{Measurement, UnitPreferences, format_one_decimal, round_half_up};
use crate::weather_code::WeatherCategory;

/// A forecast variable as named by the forecast API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variable {
    #[serde(rename = "temperature_2m")]
    Temperature2m,
    #[serde(rename = "relative_humidity_2m")]
    RelativeHumidity2m,
    Precipitation,
    WeatherCode,
    #[serde(rename = "wind_speed_10m")]
    WindSpeed10m,
    #[serde(rename = "temperature_2m_max")]
    Temperature2mMax,
    #[serde(rename = "temperature_2m_min")]
    Temperature2mMin,
}

impl Variable {
    pub fn api_name(&self) -> &'static str {
        match self {
            Variable::Temperature2m => "temperature_2m",
            Variable::RelativeHumidity2m => "relative_humidity_2m",
            Variable::Precipitation => "precipitation",
            Variable::WeatherCode => "weather_code",
            Variable::WindSpeed10m => "wind_speed_10m",
            Variable::Temperature2mMax => "temperature_2m_max",
            Variable::Temperature2mMin => "temperature_2m_min",
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Time resolution of one block of the forecast response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Granularity {
    Current,
    Hourly,
    Daily,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Current => "current",
            Granularity::Hourly => "hourly",
            Granularity::Daily => "daily",
        }
    }

    /// Spacing between samples of a series, in seconds.
    pub fn nominal_interval_secs(&self) -> i64 {
        match self {
            Granularity::Current => 0,
            Granularity::Hourly => 3_600,
            Granularity::Daily => 86_400,
        }
    }
}

pub const DEFAULT_DAILY_VARIABLES: &[Variable] = &[
    Variable::WeatherCode,
    Variable::Temperature2mMax,
    Variable::Temperature2mMin,
];
pub const DEFAULT_HOURLY_VARIABLES: &[Variable] = &[Variable::Temperature2m, Variable::WeatherCode];
pub const DEFAULT_CURRENT_VARIABLES: &[Variable] = &[
    Variable::Temperature2m,
    Variable::RelativeHumidity2m,
    Variable::Precipitation,
    Variable::WeatherCode,
    Variable::WindSpeed10m,
];

/// Parameters of one forecast fetch. Replacing it starts a new fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub daily: Vec<Variable>,
    pub hourly: Vec<Variable>,
    pub current: Vec<Variable>,
    pub timezone: String,
}

impl ForecastRequest {
    /// Dashboard variable set with the timezone resolved by the API.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            daily: DEFAULT_DAILY_VARIABLES.to_vec(),
            hourly: DEFAULT_HOURLY_VARIABLES.to_vec(),
            current: DEFAULT_CURRENT_VARIABLES.to_vec(),
            timezone: "auto".to_string(),
        }
    }

    pub fn with_coordinates(&self, latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            ..self.clone()
        }
    }

    pub fn variables(&self, granularity: Granularity) -> &[Variable] {
        match granularity {
            Granularity::Current => &self.current,
            Granularity::Hourly => &self.hourly,
            Granularity::Daily => &self.daily,
        }
    }
}

/// Value streams of one block, kept in request order and looked up by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariableColumns {
    columns: Vec<(Variable, Vec<f64>)>,
}

impl VariableColumns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, variable: Variable, values: Vec<f64>) {
        self.columns.push((variable, values));
    }

    pub fn with(mut self, variable: Variable, values: Vec<f64>) -> Self {
        self.push(variable, values);
        self
    }

    pub fn get(&self, variable: Variable) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(candidate, _)| *candidate == variable)
            .map(|(_, values)| values.as_slice())
    }

    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.columns.iter().map(|(variable, _)| *variable)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Single-instant block ("current").
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentBlock {
    pub time: i64,
    pub interval: i64,
    pub values: VariableColumns,
}

impl CurrentBlock {
    pub fn value(&self, variable: Variable) -> Option<f64> {
        self.values.get(variable).and_then(|values| values.first().copied())
    }
}

/// Regularly spaced time series ("hourly", "daily").
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesBlock {
    pub time: i64,
    pub time_end: i64,
    pub interval: i64,
    pub columns: VariableColumns,
}

/// One result set of the forecast API, in columnar form.
#[derive(Debug, Clone, PartialEq)]
pub struct RawForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub utc_offset_seconds: i64,
    pub current: Option<CurrentBlock>,
    pub hourly: Option<SeriesBlock>,
    pub daily: Option<SeriesBlock>,
}

/// Shown in place of a reading the forecast API left out.
pub const MISSING: &str = "--";

/// One cell of the current-conditions grid, in canonical units. `None`
/// when the API had no reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detail {
    pub id: usize,
    pub measurement: Measurement,
    pub value: Option<f64>,
}

impl Detail {
    pub fn label(&self) -> &'static str {
        self.measurement.label()
    }

    pub fn unit(&self) -> &'static str {
        self.measurement.canonical_unit()
    }

    /// Canonical metric value: one decimal for precipitation, whole
    /// numbers otherwise, [`MISSING`] when the API sent no reading.
    pub fn formatted(&self) -> String {
        match (self.measurement, self.value) {
            (_, None) => MISSING.to_string(),
            (Measurement::Precipitation, Some(value)) => format_one_decimal(value),
            (_, Some(value)) => round_half_up(value).to_string(),
        }
    }

    pub fn display(&self, units: &UnitPreferences) -> String {
        match self.value {
            Some(value) => format!(
                "{} {}",
                units.format_value(self.measurement, value),
                units.unit_label(self.measurement)
            ),
            None => MISSING.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    /// Local date, e.g. "Thursday, Oct 16, 2026".
    pub time: String,
    /// Local weekday, e.g. "Thursday".
    pub weekday: String,
    pub location: String,
    pub details: Vec<Detail>,
    pub category: WeatherCategory,
}

impl CurrentConditions {
    pub fn detail(&self, measurement: Measurement) -> Option<&Detail> {
        self.details
            .iter()
            .find(|detail| detail.measurement == measurement)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlySample {
    pub index: usize,
    pub day: String,
    pub time: String,
    pub temperature: Option<i64>,
    pub category: WeatherCategory,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySample {
    pub index: usize,
    pub day: String,
    pub category: WeatherCategory,
    pub temperature_max: Option<i64>,
    pub temperature_min: Option<i64>,
}

/// Display-ready forecast for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub current: CurrentConditions,
    pub hourly: Vec<HourlySample>,
    pub daily: Vec<DailySample>,
}

impl Forecast {
    /// First contiguous run of hourly samples falling on `day`.
    pub fn hours_for_day(&self, day: &str) -> &[HourlySample] {
        let Some(start) = self.hourly.iter().position(|sample| sample.day == day) else {
            return &[];
        };

        let len = self.hourly[start..]
            .iter()
            .take_while(|sample| sample.day == day)
            .count();

        &self.hourly[start..start + len]
    }
}

/// A forward-geocoding hit, ranked by the order the service returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub id: usize,
    pub name: String,
    pub country: String,
    pub state: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

impl PlaceCandidate {
    pub fn new(
        id: usize,
        name: impl Into<String>,
        country: impl Into<String>,
        state: Option<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        let name = name.into();
        let country = country.into();
        let state = state
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let label = match &state {
            Some(state) => format!("{name}, {state}, {country}"),
            None => format!("{name}, {country}"),
        };

        Self {
            id,
            name,
            country,
            state,
            latitude,
            longitude,
            label,
        }
    }
}

impl fmt::Display for PlaceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
