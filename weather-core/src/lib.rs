//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather current-weather provider
//! - The lookup service that turns a city name or coordinate into [`CurrentWeather`]
//! - Location sources for "weather where I am"
//!
//! It is used by `weather-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod provider;
pub mod service;

pub use config::{Config, CredentialSource, EnvCredentials, Layered, StaticCredential};
pub use error::{ErrorKind, LocationError, WeatherError};
pub use location::{FixedLocation, IpLocationProvider, LocationProvider};
pub use model::{ConditionCategory, Coordinates, CurrentWeather, WeatherRequest};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use service::{Subscription, WeatherService};
