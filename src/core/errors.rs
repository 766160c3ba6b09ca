use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {code} - {message}")]
    ApiError { code: i32, message: String },

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Connection timeout: {0}")]
    ConnectionTimeout(String),

    /// A raw payload lacked an expected field or carried an unparseable value.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A side/type/status code outside the known set.
    #[error("Unrecognized {field}: {value}")]
    UnrecognizedEnum { field: &'static str, value: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not supported by this exchange: {0}")]
    NotSupported(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),
}

impl ExchangeError {
    /// Errors raised by the request executor or real-time channel rather
    /// than by normalization.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_)
                | Self::ApiError { .. }
                | Self::AuthError(_)
                | Self::NetworkError(_)
                | Self::ConnectionTimeout(_)
        )
    }

    pub(crate) fn malformed(context: &str, err: impl std::fmt::Display) -> Self {
        Self::MalformedResponse(format!("{}: {}", context, err))
    }

    pub(crate) fn unrecognized(field: &'static str, value: impl ToString) -> Self {
        Self::UnrecognizedEnum {
            field,
            value: value.to_string(),
        }
    }
}
