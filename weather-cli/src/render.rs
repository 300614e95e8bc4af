//! Terminal rendering of the dashboard view state.

use std::fmt;

use anyhow::Context;
use weather_core::model::MISSING;
use weather_core::{DashboardViewState, Forecast, Measurement, UnitPreferences};

pub fn render_dashboard(
    state: &DashboardViewState,
    units: &UnitPreferences,
    day: Option<&str>,
) -> String {
    DashboardView { state, units, day }.to_string()
}

pub fn render_json(state: &DashboardViewState, units: &UnitPreferences) -> anyhow::Result<String> {
    let document = serde_json::json!({
        "status": state.status(),
        "units": units,
        "state": state,
    });
    serde_json::to_string_pretty(&document).context("Failed to serialize dashboard state")
}

struct DashboardView<'a> {
    state: &'a DashboardViewState,
    units: &'a UnitPreferences,
    day: Option<&'a str>,
}

impl fmt::Display for DashboardView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;

        if state.not_found {
            writeln!(f, "No search result found!")?;
            if !state.submitted_query.is_empty() {
                writeln!(f, "Nothing matched '{}'.", state.submitted_query)?;
            }
            return Ok(());
        }

        if let Some(error) = &state.error {
            writeln!(f, "Something went wrong")?;
            writeln!(f, "{error}")?;
            return writeln!(f, "Run the command again to retry.");
        }

        if state.loading {
            return writeln!(f, "Loading...");
        }

        let Some(forecast) = &state.forecast else {
            return writeln!(f, "No forecast loaded.");
        };

        self.current(f, forecast)?;
        writeln!(f)?;
        self.daily(f, forecast)?;
        writeln!(f)?;
        self.hourly(f, forecast)
    }
}

impl DashboardView<'_> {
    fn current(&self, f: &mut fmt::Formatter<'_>, forecast: &Forecast) -> fmt::Result {
        let current = &forecast.current;
        writeln!(f, "{}", current.location)?;
        writeln!(f, "{}", current.time)?;

        if let Some(temperature) = current.detail(Measurement::Temperature) {
            writeln!(
                f,
                "{}  {}",
                current.category,
                temperature.display(self.units)
            )?;
        }

        writeln!(f)?;
        for detail in &current.details {
            writeln!(f, "  {:<14}{}", detail.label(), detail.display(self.units))?;
        }
        Ok(())
    }

    fn daily(&self, f: &mut fmt::Formatter<'_>, forecast: &Forecast) -> fmt::Result {
        writeln!(f, "Daily forecast")?;
        for sample in &forecast.daily {
            writeln!(
                f,
                "  {:<5}{:<15}{} / {}",
                sample.day,
                sample.category,
                self.degrees(sample.temperature_max),
                self.degrees(sample.temperature_min)
            )?;
        }
        Ok(())
    }

    fn hourly(&self, f: &mut fmt::Formatter<'_>, forecast: &Forecast) -> fmt::Result {
        let Some(day) = selected_day(forecast, self.day) else {
            return writeln!(
                f,
                "Hourly forecast: no data for '{}'",
                self.day.unwrap_or_default()
            );
        };

        writeln!(f, "Hourly forecast ({day})")?;
        for sample in forecast.hours_for_day(day) {
            writeln!(
                f,
                "  {:>5}  {:<15}{}",
                sample.time,
                sample.category,
                self.degrees(sample.temperature)
            )?;
        }
        Ok(())
    }

    fn degrees(&self, celsius: Option<i64>) -> String {
        match celsius {
            Some(celsius) => format!(
                "{}°",
                self.units
                    .format_value(Measurement::Temperature, celsius as f64)
            ),
            None => MISSING.to_string(),
        }
    }
}

/// Today at the location unless a day was asked for; "fri" matches "Friday".
fn selected_day<'a>(forecast: &'a Forecast, requested: Option<&str>) -> Option<&'a str> {
    let Some(requested) = requested.map(str::trim) else {
        return Some(&forecast.current.weekday);
    };
    if requested.is_empty() {
        return None;
    }

    let requested = requested.to_lowercase();
    forecast
        .hourly
        .iter()
        .map(|sample| sample.day.as_str())
        .find(|day| day.to_lowercase().starts_with(&requested))
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::model::{CurrentConditions, DailySample, Detail, HourlySample};
    use weather_core::{UnitSystem, WeatherCategory};

    fn hour(index: usize, day: &str, time: &str, temperature: Option<i64>) -> HourlySample {
        HourlySample {
            index,
            day: day.into(),
            time: time.into(),
            temperature,
            category: WeatherCategory::Sunny,
        }
    }

    fn forecast() -> Forecast {
        let details = [
            (Measurement::Temperature, 22.0),
            (Measurement::Humidity, 55.0),
            (Measurement::Wind, 14.0),
            (Measurement::Precipitation, 0.3),
        ]
        .into_iter()
        .enumerate()
        .map(|(id, (measurement, value))| Detail {
            id,
            measurement,
            value: Some(value),
        })
        .collect();

        Forecast {
            current: CurrentConditions {
                time: "Thursday, Oct 15, 2026".into(),
                weekday: "Thursday".into(),
                location: "Karachi, Pakistan".into(),
                details,
                category: WeatherCategory::Overcast,
            },
            hourly: vec![
                hour(0, "Thursday", "10 PM", Some(20)),
                hour(1, "Thursday", "11 PM", Some(19)),
                hour(2, "Friday", "12 AM", Some(18)),
            ],
            daily: vec![DailySample {
                index: 0,
                day: "Thu".into(),
                category: WeatherCategory::Rain,
                temperature_max: Some(31),
                temperature_min: Some(24),
            }],
        }
    }

    fn ready() -> DashboardViewState {
        DashboardViewState {
            forecast: Some(forecast()),
            ..DashboardViewState::default()
        }
    }

    #[test]
    fn metric_dashboard_shows_current_daily_and_todays_hours() {
        let output = render_dashboard(&ready(), &UnitPreferences::default(), None);

        assert!(output.starts_with("Karachi, Pakistan\nThursday, Oct 15, 2026\n"));
        assert!(output.contains("Overcast  22 °C"));
        assert!(output.contains("Humidity      55 %"));
        assert!(output.contains("Precipitation 0.3 mm"));
        assert!(output.contains("Thu  Rain           31° / 24°"));
        assert!(output.contains("Hourly forecast (Thursday)"));
        assert!(output.contains("10 PM"));
        assert!(!output.contains("12 AM"));
    }

    #[test]
    fn imperial_preferences_convert_every_section() {
        let units = UnitPreferences::for_system(UnitSystem::Imperial);
        let output = render_dashboard(&ready(), &units, None);

        assert!(output.contains("Overcast  72 °F"));
        assert!(output.contains("Wind          9 mph"));
        assert!(output.contains("Precipitation 0.0 in"));
        assert!(output.contains("88° / 75°"));
    }

    #[test]
    fn missing_readings_render_as_placeholders() {
        let mut state = ready();
        if let Some(forecast) = state.forecast.as_mut() {
            forecast.current.details[0].value = None;
            forecast.hourly[0].temperature = None;
            forecast.daily[0].temperature_min = None;
        }

        let output = render_dashboard(&state, &UnitPreferences::default(), None);

        assert!(output.contains("Overcast  --\n"));
        assert!(output.contains("Temperature   --\n"));
        assert!(output.contains("Thu  Rain           31° / --"));
        assert!(output.contains("10 PM  Sunny          --"));
        assert!(!output.contains("0 °C"));
    }

    #[test]
    fn day_prefix_selects_hourly_list() {
        let output = render_dashboard(&ready(), &UnitPreferences::default(), Some("fri"));

        assert!(output.contains("Hourly forecast (Friday)"));
        assert!(output.contains("12 AM"));
        assert!(!output.contains("10 PM"));
    }

    #[test]
    fn unknown_day_is_reported() {
        let output = render_dashboard(&ready(), &UnitPreferences::default(), Some("sunday"));
        assert!(output.contains("Hourly forecast: no data for 'sunday'"));
    }

    #[test]
    fn not_found_outranks_forecast() {
        let state = DashboardViewState {
            not_found: true,
            submitted_query: "Zzzzz".into(),
            ..ready()
        };

        let output = render_dashboard(&state, &UnitPreferences::default(), None);
        assert_eq!(output, "No search result found!\nNothing matched 'Zzzzz'.\n");
    }

    #[test]
    fn error_state_offers_retry() {
        let state = DashboardViewState {
            error: Some("No data received".into()),
            ..DashboardViewState::default()
        };

        let output = render_dashboard(&state, &UnitPreferences::default(), None);
        assert!(output.starts_with("Something went wrong\nNo data received\n"));
    }

    #[test]
    fn json_carries_status_and_state() {
        let json = render_json(&ready(), &UnitPreferences::default()).expect("json");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["status"], "ready");
        assert_eq!(value["units"]["system"], "metric");
        assert_eq!(
            value["state"]["forecast"]["current"]["category"],
            "Overcast"
        );
    }
}
