use crate::{
    Config, CredentialSource, CurrentWeather, WeatherRequest, error::WeatherError,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod openweather;

/// Source of current conditions for a resolved request.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_weather(
        &self,
        request: &WeatherRequest,
    ) -> Result<CurrentWeather, WeatherError>;
}

/// Construct the OpenWeather provider from config and a credential source.
pub fn provider_from_config(
    config: &Config,
    credentials: &dyn CredentialSource,
) -> anyhow::Result<OpenWeatherProvider> {
    let api_key = credentials.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
             Hint: run `weather configure` or set OPENWEATHER_API_KEY."
        )
    })?;

    let mut provider = OpenWeatherProvider::new(api_key);

    if let Some(base_url) = config.base_url() {
        provider = provider.with_base_url(base_url);
    }

    if let Some(secs) = config.timeout_secs() {
        provider = provider.with_timeout(Duration::from_secs(secs))?;
    }

    Ok(provider)
}
