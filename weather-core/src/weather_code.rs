use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse sky condition derived from a WMO weather interpretation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCategory {
    Sunny,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Storm,
    Unknown,
}

impl WeatherCategory {
    /// Total over every integer: codes outside the table map to `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 | 1 => Self::Sunny,
            2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            45 | 48 => Self::Fog,
            51 | 53 | 55 | 56 | 57 => Self::Drizzle,
            61 | 63 | 65 | 66 | 67 | 80 | 81 | 82 => Self::Rain,
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Storm,
            _ => Self::Unknown,
        }
    }

    /// The forecast API delivers codes as floats; anything that is not an
    /// exact integer is `Unknown`.
    pub fn from_value(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 {
            Self::from_code(value as i64)
        } else {
            Self::Unknown
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Sunny => "Sunny",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Overcast => "Overcast",
            Self::Fog => "Fog",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Storm => "Storm",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for WeatherCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}
