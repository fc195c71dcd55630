use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode};
use weather_core::{
    Config, Coordinates, FixedLocation, IpLocationProvider, LocationProvider, WeatherRequest,
    WeatherService,
};

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current weather for a city or a location")]
pub struct Cli {
    /// Print the result as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the OpenWeather API key and an optional default location.
    Configure,

    /// Show weather for a city name.
    City {
        /// City name; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Show weather for a latitude/longitude pair.
    Coords {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Show weather for the configured location, or your IP-based location.
    Here,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if matches!(self.command, Command::Configure) {
            return configure(config_or_default(Config::load()));
        }

        let config = Config::load()?;

        let request = match self.command {
            Command::Configure => return configure(config),
            Command::City { name } => WeatherRequest::city(name.join(" ")),
            Command::Coords { lat, lon } => WeatherRequest::coordinate(lat, lon),
            Command::Here => resolve_here(&config).await?.into(),
        };
        tracing::debug!(?request, "Resolved weather request");

        let service = WeatherService::from_config(&config)?;

        let weather = service
            .lookup(&request)
            .await
            .context("Could not fetch current weather")?;

        if self.json {
            println!("{}", output::render_json(&weather)?);
        } else {
            println!("{}", output::render_text(&weather));
        }

        Ok(())
    }
}

/// `configure` must still work when the existing file cannot be parsed.
fn config_or_default(loaded: Result<Config>) -> Config {
    loaded.unwrap_or_else(|err| {
        tracing::warn!("{err:#}; starting from an empty configuration");
        Config::default()
    })
}

async fn resolve_here(config: &Config) -> Result<Coordinates> {
    let located = match config.location {
        Some(coords) => FixedLocation(coords).current_location().await,
        None => IpLocationProvider::new().current_location().await,
    };

    located.context(
        "Could not determine your location.\n\
         Hint: run `weather configure` to save a default location, or use `weather coords`.",
    )
}

fn configure(mut config: Config) -> Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    config.set_api_key(api_key.trim().to_string());

    let save_location = Confirm::new("Save a default location for `weather here`?")
        .with_default(config.location.is_some())
        .prompt()?;

    if save_location {
        let latitude = CustomType::<f64>::new("Latitude:").prompt()?;
        let longitude = CustomType::<f64>::new("Longitude:").prompt()?;
        config.set_location(Some(Coordinates { latitude, longitude }));
    } else {
        config.set_location(None);
    }

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
