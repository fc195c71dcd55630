use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::WeatherError;

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// What to look up.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherRequest {
    Coordinate { latitude: f64, longitude: f64 },
    CityName { name: String },
}

impl WeatherRequest {
    pub fn coordinate(latitude: f64, longitude: f64) -> Self {
        WeatherRequest::Coordinate { latitude, longitude }
    }

    pub fn city(name: impl Into<String>) -> Self {
        WeatherRequest::CityName { name: name.into() }
    }

    /// Reject requests that must never reach the network.
    pub fn validate(&self) -> Result<(), WeatherError> {
        match self {
            WeatherRequest::Coordinate { .. } => Ok(()),
            WeatherRequest::CityName { name } => {
                if name.trim().is_empty() {
                    Err(WeatherError::InvalidRequest("city name is empty".to_string()))
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl From<Coordinates> for WeatherRequest {
    fn from(c: Coordinates) -> Self {
        WeatherRequest::coordinate(c.latitude, c.longitude)
    }
}

/// Trim a city name and collapse inner whitespace runs to single spaces.
pub fn normalize_city_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Display category derived from the provider's condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionCategory {
    Thunderstorm,
    Drizzle,
    Rain,
    Snow,
    Fog,
    Clear,
    Cloudy,
    Unknown,
}

impl ConditionCategory {
    /// See: https://openweathermap.org/weather-conditions
    pub fn from_code(code: i32) -> Self {
        match code {
            200..=232 => Self::Thunderstorm,
            300..=321 => Self::Drizzle,
            500..=531 => Self::Rain,
            600..=622 => Self::Snow,
            701..=781 => Self::Fog,
            800 => Self::Clear,
            801..=804 => Self::Cloudy,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thunderstorm => "thunderstorm",
            Self::Drizzle => "drizzle",
            Self::Rain => "rain",
            Self::Snow => "snow",
            Self::Fog => "fog",
            Self::Clear => "clear",
            Self::Cloudy => "cloudy",
            Self::Unknown => "unknown",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Thunderstorm => "Thunderstorm",
            Self::Drizzle => "Drizzle",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Fog => "Fog / haze",
            Self::Clear => "Clear",
            Self::Cloudy => "Cloudy",
            Self::Unknown => "Unknown",
        }
    }

    /// Symbol name in the SF Symbols set.
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Thunderstorm => "cloud.bolt.rain",
            Self::Drizzle => "cloud.drizzle",
            Self::Rain => "cloud.rain",
            Self::Snow => "cloud.snow",
            Self::Fog => "cloud.fog",
            Self::Clear => "sun.min",
            Self::Cloudy => "cloud",
            Self::Unknown => "nosign",
        }
    }
}

impl std::fmt::Display for ConditionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions for one place, temperatures in degrees Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub city_name: String,
    pub country: String,
    pub temperature: f64,
    pub feels_like_temperature: f64,
    pub minimum_temperature: f64,
    pub maximum_temperature: f64,
    pub condition_code: i32,
    pub observed_at: Option<DateTime<Utc>>,
}

impl CurrentWeather {
    pub fn temperature_string(&self) -> String {
        format_temperature(self.temperature)
    }

    pub fn feels_like_temperature_string(&self) -> String {
        format_temperature(self.feels_like_temperature)
    }

    pub fn minimum_temperature_string(&self) -> String {
        format_temperature(self.minimum_temperature)
    }

    pub fn maximum_temperature_string(&self) -> String {
        format_temperature(self.maximum_temperature)
    }

    pub fn category(&self) -> ConditionCategory {
        ConditionCategory::from_code(self.condition_code)
    }
}

/// Round half away from zero to a whole degree; negative zero prints as "0".
pub fn format_temperature(value: f64) -> String {
    let rounded = value.round();
    // -0.0 == 0.0, so this also clears the sign bit.
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.0}")
}
