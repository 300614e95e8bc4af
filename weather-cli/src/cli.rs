use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use inquire::Select;
use weather_core::{
    Config, Dashboard, DashboardStatus, Providers, UnitPreferences, UnitSystem,
    providers_from_config, search,
    units::{PrecipitationUnit, TemperatureUnit, WindUnit},
};

use crate::{configure, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather dashboard in your terminal")]
pub struct Cli {
    /// Verbose logging to stderr (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the place-search API key, unit system and default location.
    Configure,

    /// Show the dashboard for a place, coordinates, or the default location.
    Show {
        /// Place name; the best match is shown.
        place: Option<String>,

        #[arg(long, requires = "lon", conflicts_with = "place", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", conflicts_with = "place", allow_negative_numbers = true)]
        lon: Option<f64>,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// List places matching a name.
    Search {
        text: String,

        /// Choose one of the matches and show its dashboard.
        #[arg(long)]
        pick: bool,

        #[command(flatten)]
        display: DisplayArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct DisplayArgs {
    /// Unit system; resets the per-measurement units below.
    #[arg(long, value_enum)]
    pub units: Option<UnitsArg>,

    #[arg(long, value_enum)]
    pub temp: Option<TempArg>,

    #[arg(long, value_enum)]
    pub wind: Option<WindArg>,

    #[arg(long, value_enum)]
    pub precip: Option<PrecipArg>,

    /// Day for the hourly forecast, e.g. "friday" or "fri". Defaults to today.
    #[arg(long)]
    pub day: Option<String>,

    /// Print the dashboard state as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitsArg {
    Metric,
    Imperial,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum TempArg {
    C,
    F,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum WindArg {
    Kmh,
    Mph,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PrecipArg {
    Mm,
    In,
}

impl DisplayArgs {
    /// Applies the flags on top of the configured preferences.
    pub fn preferences(&self, mut units: UnitPreferences) -> UnitPreferences {
        if let Some(system) = self.units {
            units.set_system(match system {
                UnitsArg::Metric => UnitSystem::Metric,
                UnitsArg::Imperial => UnitSystem::Imperial,
            });
        }

        if let Some(temp) = self.temp {
            units.temperature = match temp {
                TempArg::C => TemperatureUnit::Celsius,
                TempArg::F => TemperatureUnit::Fahrenheit,
            };
        }

        if let Some(wind) = self.wind {
            units.wind = match wind {
                WindArg::Kmh => WindUnit::KilometresPerHour,
                WindArg::Mph => WindUnit::MilesPerHour,
            };
        }

        if let Some(precip) = self.precip {
            units.precipitation = match precip {
                PrecipArg::Mm => PrecipitationUnit::Millimetres,
                PrecipArg::In => PrecipitationUnit::Inches,
            };
        }

        units
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        match self.command {
            Command::Configure => {
                configure::run().await?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Show {
                place,
                lat,
                lon,
                display,
            } => {
                let config = Config::load()?;
                let dashboard = dashboard(&config)?;

                match (place, lat.zip(lon)) {
                    (Some(place), _) => {
                        require_api_key(&config)?;
                        dashboard.submit_query(&place).await;
                    }
                    (None, Some((latitude, longitude))) => {
                        dashboard.set_coordinates(latitude, longitude).await;
                    }
                    (None, None) => {
                        dashboard.start().await;
                    }
                }

                print_dashboard(&dashboard, &config, &display)
            }
            Command::Search {
                text,
                pick,
                display,
            } => {
                let config = Config::load()?;
                require_api_key(&config)?;

                let providers = providers(&config)?;
                let candidates = search::lookup(providers.places.as_ref(), &text)
                    .await
                    .with_context(|| format!("Place search for '{text}' failed"))?;

                if candidates.is_empty() {
                    println!("No cities found.");
                    return Ok(ExitCode::FAILURE);
                }

                if !pick {
                    for candidate in &candidates {
                        println!(
                            "{}  ({:.4}, {:.4})",
                            candidate.label, candidate.latitude, candidate.longitude
                        );
                    }
                    return Ok(ExitCode::SUCCESS);
                }

                let candidate = Select::new("Show weather for:", candidates).prompt()?;
                let dashboard =
                    Dashboard::new(providers, config.default_request(), config.debounce());
                dashboard.select_place(candidate).await;

                print_dashboard(&dashboard, &config, &display)
            }
        }
    }
}

fn providers(config: &Config) -> anyhow::Result<Providers> {
    providers_from_config(config).context("Failed to set up the weather services")
}

fn dashboard(config: &Config) -> anyhow::Result<Dashboard> {
    Ok(Dashboard::new(
        providers(config)?,
        config.default_request(),
        config.debounce(),
    ))
}

fn require_api_key(config: &Config) -> anyhow::Result<()> {
    if !config.has_api_key() {
        bail!(
            "No OpenWeather API key configured; place search needs one.\n\
             Hint: run `weather configure` or set {}.",
            weather_core::config::API_KEY_ENV
        );
    }
    Ok(())
}

fn print_dashboard(
    dashboard: &Dashboard,
    config: &Config,
    display: &DisplayArgs,
) -> anyhow::Result<ExitCode> {
    let state = dashboard.snapshot();
    let units = display.preferences(config.units);
    tracing::debug!(status = ?state.status(), "rendering dashboard");

    if display.json {
        println!("{}", render::render_json(&state, &units)?);
    } else {
        print!("{}", render::render_dashboard(&state, &units, display.day.as_deref()));
    }

    Ok(match state.status() {
        DashboardStatus::Error | DashboardStatus::NotFound => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}
