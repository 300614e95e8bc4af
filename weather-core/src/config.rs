use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};

use crate::model::ForecastRequest;
use crate::provider::{bigdatacloud, open_meteo, openweather};
use crate::units::UnitPreferences;

/// Overrides `openweather_api_key` from the config file when set.
pub const API_KEY_ENV: &str = "WEATHER_OPENWEATHER_API_KEY";

const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// A named place the dashboard opens on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for SavedLocation {
    fn default() -> Self {
        Self {
            name: "Karachi, PK".to_string(),
            latitude: 24.8546842,
            longitude: 67.0207055,
        }
    }
}

/// Base URLs of the external services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub forecast: String,
    pub reverse_geocode: String,
    pub forward_geocode: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            forecast: open_meteo::DEFAULT_BASE_URL.to_string(),
            reverse_geocode: bigdatacloud::DEFAULT_BASE_URL.to_string(),
            forward_geocode: openweather::DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// openweather_api_key = "..."
/// debounce_ms = 300
///
/// [units]
/// system = "imperial"
///
/// [default_location]
/// name = "Lahore, Punjab, PK"
/// latitude = 31.5497
/// longitude = 74.3436
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key for place search; reverse geocoding and forecasts need none.
    pub openweather_api_key: Option<String>,
    pub debounce_ms: u64,
    pub units: UnitPreferences,
    pub default_location: SavedLocation,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            units: UnitPreferences::default(),
            default_location: SavedLocation::default(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Returns the API key, preferring the environment over the file.
    pub fn openweather_api_key(&self) -> Option<String> {
        let from_env = env::var(API_KEY_ENV).ok();
        Self::pick_api_key(from_env, self.openweather_api_key.clone())
    }

    fn pick_api_key(from_env: Option<String>, from_file: Option<String>) -> Option<String> {
        [from_env, from_file]
            .into_iter()
            .flatten()
            .map(|key| key.trim().to_string())
            .find(|key| !key.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.openweather_api_key().is_some()
    }

    /// Store the key; a blank key removes it.
    pub fn set_openweather_api_key(&mut self, api_key: String) {
        let api_key = api_key.trim().to_string();
        self.openweather_api_key = (!api_key.is_empty()).then_some(api_key);
    }

    pub fn set_default_location(&mut self, name: impl Into<String>, latitude: f64, longitude: f64) {
        self.default_location = SavedLocation {
            name: name.into(),
            latitude,
            longitude,
        };
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Forecast request for the default location.
    pub fn default_request(&self) -> ForecastRequest {
        ForecastRequest::new(self.default_location.latitude, self.default_location.longitude)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml = self.to_toml_string()?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(path = %path.display(), "configuration saved");
        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents).context("Invalid configuration TOML")?;

        if cfg.debounce_ms == 0 {
            return Err(anyhow!("debounce_ms must be greater than zero"));
        }

        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::{PrecipitationUnit, UnitSystem};

    #[test]
    fn empty_file_yields_defaults() {
        let cfg = Config::from_toml_str("").expect("config");

        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.debounce(), Duration::from_millis(300));
        assert_eq!(cfg.endpoints.forecast, "https://api.open-meteo.com");
        assert_eq!(cfg.default_location.name, "Karachi, PK");
    }

    #[test]
    fn default_request_targets_default_location() {
        let mut cfg = Config::default();
        cfg.set_default_location("Lahore, PK", 31.5497, 74.3436);

        let request = cfg.default_request();
        assert_eq!(request.latitude, 31.5497);
        assert_eq!(request.longitude, 74.3436);
        assert_eq!(request.timezone, "auto");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            openweather_api_key = "KEY"

            [units]
            system = "imperial"
            precipitation = "mm"

            [endpoints]
            forecast = "http://localhost:8080"
            "#,
        )
        .expect("config");

        assert_eq!(cfg.openweather_api_key.as_deref(), Some("KEY"));
        assert_eq!(cfg.units.system, UnitSystem::Imperial);
        assert_eq!(cfg.units.precipitation, PrecipitationUnit::Millimetres);
        assert_eq!(cfg.endpoints.forecast, "http://localhost:8080");
        assert_eq!(cfg.endpoints.reverse_geocode, "https://api.bigdatacloud.net");
        assert_eq!(cfg.debounce_ms, 300);
    }

    #[test]
    fn zero_debounce_is_rejected() {
        let err = Config::from_toml_str("debounce_ms = 0").unwrap_err();
        assert!(err.to_string().contains("debounce_ms"));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(Config::from_toml_str("units = 3").is_err());
    }

    #[test]
    fn toml_round_trip_preserves_settings() {
        let mut cfg = Config::default();
        cfg.set_openweather_api_key("  KEY  ".into());
        cfg.units.set_system(UnitSystem::Imperial);

        let text = cfg.to_toml_string().expect("serialize");
        let parsed = Config::from_toml_str(&text).expect("parse");

        assert_eq!(parsed, cfg);
        assert_eq!(parsed.openweather_api_key.as_deref(), Some("KEY"));
    }

    #[test]
    fn blank_key_clears_stored_key() {
        let mut cfg = Config::default();
        cfg.set_openweather_api_key("KEY".into());
        cfg.set_openweather_api_key("   ".into());

        assert_eq!(cfg.openweather_api_key, None);
    }

    #[test]
    fn environment_key_wins_over_file_key() {
        let picked = Config::pick_api_key(Some("ENV".into()), Some("FILE".into()));
        assert_eq!(picked.as_deref(), Some("ENV"));

        let picked = Config::pick_api_key(Some(" ".into()), Some("FILE".into()));
        assert_eq!(picked.as_deref(), Some("FILE"));

        assert_eq!(Config::pick_api_key(None, None), None);
    }
}
