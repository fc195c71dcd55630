use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::{
    error::WeatherError,
    model::{CurrentWeather, WeatherRequest, normalize_city_name},
};

use super::WeatherProvider;

pub const DEFAULT_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_ENDPOINT.to_string(),
            http: Client::new(),
        }
    }

    /// Point the provider at a different current-weather endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Apply a whole-request timeout instead of the transport default.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, WeatherError> {
        self.http = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The exact URL a lookup for `request` will GET.
    ///
    /// City names are normalized and percent-encoded by hand: `RequestBuilder::query`
    /// form-encodes spaces as `+`, and the endpoint expects `%20`.
    pub fn request_url(&self, request: &WeatherRequest) -> Result<Url, WeatherError> {
        request.validate()?;

        let location = match request {
            WeatherRequest::CityName { name } => {
                format!("q={}", urlencoding::encode(&normalize_city_name(name)))
            }
            WeatherRequest::Coordinate { latitude, longitude } => {
                format!("lat={latitude}&lon={longitude}")
            }
        };

        let mut url = Url::parse(&self.base_url).map_err(|e| {
            WeatherError::InvalidRequest(format!("invalid endpoint URL '{}': {e}", self.base_url))
        })?;

        let own = format!(
            "{location}&units=metric&appid={}",
            urlencoding::encode(&self.api_key)
        );
        // Parameters already on the endpoint (e.g. `lang=tr`) are kept ahead of ours.
        let query = match url.query() {
            Some(existing) if !existing.is_empty() => format!("{existing}&{own}"),
            _ => own,
        };
        url.set_query(Some(&query));

        Ok(url)
    }

    async fn fetch_current(
        &self,
        request: &WeatherRequest,
    ) -> Result<CurrentWeather, WeatherError> {
        let url = self.request_url(request)?;
        tracing::debug!(?request, endpoint = %self.base_url, "Requesting current weather");

        let res = self.http.get(url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::Status {
                status,
                body: truncate_body(&body),
            });
        }

        let parsed = RawWeatherResponse::parse(&body)?;
        CurrentWeather::try_from(parsed)
    }
}

/// Wire shape of the current-weather endpoint. Unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWeatherResponse {
    pub name: String,
    pub main: RawMain,
    pub weather: Vec<RawCondition>,
    pub sys: RawSys,
    #[serde(default)]
    pub dt: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMain {
    pub temp: f64,
    pub feels_like: f64,
    pub temp_min: f64,
    pub temp_max: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCondition {
    pub id: i32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSys {
    pub country: String,
}

impl RawWeatherResponse {
    /// Decode a body, rejecting an empty `weather` array.
    pub fn parse(body: &str) -> Result<Self, WeatherError> {
        let parsed: RawWeatherResponse = serde_json::from_str(body)?;
        if parsed.weather.is_empty() {
            return Err(WeatherError::Decode(
                "response contained no weather conditions".to_string(),
            ));
        }
        Ok(parsed)
    }
}

impl TryFrom<RawWeatherResponse> for CurrentWeather {
    type Error = WeatherError;

    fn try_from(raw: RawWeatherResponse) -> Result<Self, Self::Error> {
        let condition_code = raw
            .weather
            .first()
            .map(|w| w.id)
            .ok_or_else(|| {
                WeatherError::Decode("response contained no weather conditions".to_string())
            })?;

        Ok(CurrentWeather {
            city_name: raw.name,
            country: raw.sys.country,
            temperature: raw.main.temp,
            feels_like_temperature: raw.main.feels_like,
            minimum_temperature: raw.main.temp_min,
            maximum_temperature: raw.main.temp_max,
            condition_code,
            observed_at: raw.dt.and_then(unix_to_utc),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(
        &self,
        request: &WeatherRequest,
    ) -> Result<CurrentWeather, WeatherError> {
        self.fetch_current(request).await
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
