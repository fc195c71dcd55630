use reqwest::StatusCode;

/// Coarse classification of a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The request was rejected before any network call was made.
    InvalidRequest,
    /// Network, DNS, or non-2xx HTTP status.
    TransportFailure,
    /// The body was malformed, incomplete, or had no weather conditions.
    DecodeFailure,
}

/// Errors produced by a single weather lookup.
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("OpenWeather request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to decode OpenWeather response: {0}")]
    Decode(String),
}

impl WeatherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            WeatherError::Transport(_) | WeatherError::Status { .. } => {
                ErrorKind::TransportFailure
            }
            WeatherError::Decode(_) => ErrorKind::DecodeFailure,
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::Decode(err.to_string())
    }
}

/// Errors from a location source.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    Unavailable,
    #[error("Location error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for LocationError {
    fn from(err: reqwest::Error) -> Self {
        LocationError::Other(err.to_string())
    }
}
