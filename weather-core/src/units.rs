//! Display-unit conversion.
//!
//! Forecast values are kept in metric units (°C, km/h, mm). Conversion
//! happens only when a value is rendered and the result is never written
//! back into the model.

use std::fmt;

use serde::{Deserialize, Serialize};

const MPH_PER_KMH: f64 = 0.621371;
const INCHES_PER_MM: f64 = 0.0393701;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "Metric",
            UnitSystem::Imperial => "Imperial",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            UnitSystem::Metric => UnitSystem::Imperial,
            UnitSystem::Imperial => UnitSystem::Metric,
        }
    }

    pub const fn all() -> &'static [UnitSystem] {
        &[UnitSystem::Metric, UnitSystem::Imperial]
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UnitSystem {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_lowercase().as_str() {
            "metric" => Ok(UnitSystem::Metric),
            "imperial" => Ok(UnitSystem::Imperial),
            _ => Err(anyhow::anyhow!(
                "Unknown unit system '{value}'. Supported systems: metric, imperial."
            )),
        }
    }
}

/// The quantities shown in the current-conditions grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Measurement {
    Temperature,
    Wind,
    Humidity,
    Precipitation,
}

impl Measurement {
    pub const fn all() -> &'static [Measurement] {
        &[
            Measurement::Temperature,
            Measurement::Wind,
            Measurement::Humidity,
            Measurement::Precipitation,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Measurement::Temperature => "Temperature",
            Measurement::Wind => "Wind",
            Measurement::Humidity => "Humidity",
            Measurement::Precipitation => "Precipitation",
        }
    }

    /// Unit the model stores this quantity in.
    pub fn canonical_unit(&self) -> &'static str {
        match self {
            Measurement::Temperature => "°C",
            Measurement::Wind => "km/h",
            Measurement::Humidity => "%",
            Measurement::Precipitation => "mm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[default]
    #[serde(rename = "c")]
    Celsius,
    #[serde(rename = "f")]
    Fahrenheit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WindUnit {
    #[default]
    #[serde(rename = "kmh")]
    KilometresPerHour,
    #[serde(rename = "mph")]
    MilesPerHour,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PrecipitationUnit {
    #[default]
    #[serde(rename = "mm")]
    Millimetres,
    #[serde(rename = "in")]
    Inches,
}

/// Which units the user wants to see.
///
/// Selecting a system resets every per-measurement unit to that system's
/// default. A per-measurement imperial unit converts that measurement even
/// while the system is metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitPreferences {
    pub system: UnitSystem,
    pub temperature: TemperatureUnit,
    pub wind: WindUnit,
    pub precipitation: PrecipitationUnit,
}

impl UnitPreferences {
    pub fn for_system(system: UnitSystem) -> Self {
        match system {
            UnitSystem::Metric => Self {
                system,
                temperature: TemperatureUnit::Celsius,
                wind: WindUnit::KilometresPerHour,
                precipitation: PrecipitationUnit::Millimetres,
            },
            UnitSystem::Imperial => Self {
                system,
                temperature: TemperatureUnit::Fahrenheit,
                wind: WindUnit::MilesPerHour,
                precipitation: PrecipitationUnit::Inches,
            },
        }
    }

    pub fn set_system(&mut self, system: UnitSystem) {
        *self = Self::for_system(system);
    }

    pub fn toggle_system(&mut self) {
        self.set_system(self.system.toggled());
    }

    /// System used to convert `measurement`. Each measurement follows its
    /// own unit; precipitation is not tied to the temperature unit.
    pub fn effective_system(&self, measurement: Measurement) -> UnitSystem {
        if self.system == UnitSystem::Imperial {
            return UnitSystem::Imperial;
        }

        let imperial_override = match measurement {
            Measurement::Temperature => self.temperature == TemperatureUnit::Fahrenheit,
            Measurement::Wind => self.wind == WindUnit::MilesPerHour,
            Measurement::Precipitation => self.precipitation == PrecipitationUnit::Inches,
            Measurement::Humidity => false,
        };

        if imperial_override {
            UnitSystem::Imperial
        } else {
            UnitSystem::Metric
        }
    }

    pub fn unit_label(&self, measurement: Measurement) -> &'static str {
        let system = self.effective_system(measurement);
        match (measurement, system) {
            (Measurement::Temperature, UnitSystem::Metric) => "°C",
            (Measurement::Temperature, UnitSystem::Imperial) => "°F",
            (Measurement::Wind, UnitSystem::Metric) => "km/h",
            (Measurement::Wind, UnitSystem::Imperial) => "mph",
            (Measurement::Precipitation, UnitSystem::Metric) => "mm",
            (Measurement::Precipitation, UnitSystem::Imperial) => "in",
            (Measurement::Humidity, _) => "%",
        }
    }

    /// Converts a canonical metric value and formats it without a unit.
    pub fn format_value(&self, measurement: Measurement, value: f64) -> String {
        let system = self.effective_system(measurement);
        match measurement {
            Measurement::Temperature => convert_temperature(value, system).to_string(),
            Measurement::Wind => convert_wind(value, system).to_string(),
            Measurement::Precipitation => convert_precipitation(value, system),
            Measurement::Humidity => round_half_up(value).to_string(),
        }
    }
}

pub fn convert_temperature(celsius: f64, system: UnitSystem) -> i64 {
    match system {
        UnitSystem::Imperial => round_half_up(celsius * 9.0 / 5.0 + 32.0),
        UnitSystem::Metric => round_half_up(celsius),
    }
}

pub fn convert_wind(kmh: f64, system: UnitSystem) -> i64 {
    match system {
        UnitSystem::Imperial => round_half_up(kmh * MPH_PER_KMH),
        UnitSystem::Metric => round_half_up(kmh),
    }
}

/// Non-finite input is shown as zero.
pub fn convert_precipitation(mm: f64, system: UnitSystem) -> String {
    let mm = if mm.is_finite() { mm } else { 0.0 };
    match system {
        UnitSystem::Imperial => format_one_decimal(mm * INCHES_PER_MM),
        UnitSystem::Metric => format_one_decimal(mm),
    }
}

/// Same as [`convert_precipitation`] for text input; anything that does not
/// parse as a number is treated as 0 mm.
pub fn convert_precipitation_text(mm: &str, system: UnitSystem) -> String {
    let value = mm.trim().parse::<f64>().unwrap_or(0.0);
    convert_precipitation(value, system)
}

/// Rounds halves towards positive infinity, so -2.5 becomes -2.
pub(crate) fn round_half_up(value: f64) -> i64 {
    // NaN saturates to 0.
    (value + 0.5).floor() as i64
}

/// One decimal, rounded on the exact binary value: 0.35 is stored just
/// below 0.35 and gives "0.3". Exact ties such as 0.25 go away from zero.
pub(crate) fn format_one_decimal(value: f64) -> String {
    let quarters = value * 4.0;
    let exact_tie = quarters.fract() == 0.0 && quarters % 2.0 != 0.0;
    let value = if exact_tie {
        value.signum() * (value.abs() * 10.0 + 0.5).floor() / 10.0
    } else {
        value
    };

    let formatted = format!("{value:.1}");
    // avoid "-0.0"
    if formatted == "-0.0" {
        "0.0".to_string()
    } else {
        formatted
    }
}
