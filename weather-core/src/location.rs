//! Location sources that resolve "where am I" into coordinates.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{error::LocationError, model::Coordinates};

pub const IPAPI_ENDPOINT: &str = "https://ipapi.co/json/";

#[async_trait]
pub trait LocationProvider: Send + Sync + std::fmt::Debug {
    async fn current_location(&self) -> Result<Coordinates, LocationError>;
}

/// A location known ahead of time (config file or command-line flags).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        Ok(self.0)
    }
}

/// Approximate location from the public IP address.
#[derive(Debug, Clone)]
pub struct IpLocationProvider {
    endpoint: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    error: bool,
    reason: Option<String>,
}

impl IpLocationProvider {
    pub fn new() -> Self {
        Self::with_endpoint(IPAPI_ENDPOINT)
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            http: Client::new(),
        }
    }
}

impl Default for IpLocationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for IpLocationProvider {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        let res = self.http.get(&self.endpoint).send().await?;

        let status = res.status();
        if !status.is_success() {
            tracing::warn!(%status, "IP geolocation request failed");
            return Err(LocationError::Unavailable);
        }

        let data: IpApiResponse = res.json().await?;

        if data.error {
            return Err(LocationError::Other(
                data.reason.unwrap_or_else(|| "IP geolocation refused".to_string()),
            ));
        }

        match (data.latitude, data.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates { latitude, longitude }),
            _ => Err(LocationError::Unavailable),
        }
    }
}
