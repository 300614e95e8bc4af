//! Interactive `weather configure` flow.

use anyhow::{Context, Result, bail};
use inquire::{Password, PasswordDisplayMode, Select, Text};
use weather_core::{Config, UnitSystem, providers_from_config, search};

pub async fn run() -> Result<()> {
    let mut config = Config::load()?;

    let help = if config.openweather_api_key.is_some() {
        "Leave empty to keep the saved key"
    } else {
        "Needed for place search; get one at https://openweathermap.org/api"
    };
    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message(help)
        .prompt()?;
    if !api_key.trim().is_empty() {
        config.set_openweather_api_key(api_key);
    }

    let systems = UnitSystem::all().to_vec();
    let cursor = systems
        .iter()
        .position(|system| *system == config.units.system)
        .unwrap_or(0);
    let system = Select::new("Unit system:", systems)
        .with_starting_cursor(cursor)
        .prompt()?;
    if system != config.units.system {
        config.units.set_system(system);
    }

    let place = Text::new("Default location:")
        .with_help_message(&format!(
            "Currently {}; leave empty to keep it",
            config.default_location.name
        ))
        .prompt()?;
    let place = place.trim();

    if !place.is_empty() {
        if !config.has_api_key() {
            bail!("Searching for a default location needs an OpenWeather API key.");
        }

        let providers = providers_from_config(&config)?;
        let candidates = search::lookup(providers.places.as_ref(), place)
            .await
            .with_context(|| format!("Place search for '{place}' failed"))?;

        if candidates.is_empty() {
            bail!("No cities found for '{place}'.");
        }

        let chosen = Select::new("Pick your default location:", candidates).prompt()?;
        config.set_default_location(chosen.label, chosen.latitude, chosen.longitude);
    }

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
