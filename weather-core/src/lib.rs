//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Clients for the forecast and geocoding services
//! - Decoding of columnar forecasts into display-ready records
//! - Unit conversion and weather-code classification
//! - The dashboard controller that owns the view state
//!
//! It is used by `weather-cli`, but any other front end can drive the
//! [`Dashboard`] the same way.

pub mod config;
pub mod dashboard;
pub mod decoder;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod search;
pub mod units;
pub mod weather_code;

#[cfg(test)]
mod test_support;

pub use config::{Config, Endpoints, SavedLocation};
pub use dashboard::{Dashboard, DashboardStatus, DashboardViewState};
pub use error::{ForecastError, GeocodeFailure, ProviderError};
pub use model::{Forecast, ForecastRequest, PlaceCandidate};
pub use provider::{Providers, providers_from_config};
pub use units::{Measurement, UnitPreferences, UnitSystem};
pub use weather_code::WeatherCategory;
