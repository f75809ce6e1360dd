//! Error types for the notebook jobs client.

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Form error: {0}")]
    Form(#[from] FormError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors talking to the scheduling service.
///
/// Every variant is a rejected request: the service never reports failures
/// inside an otherwise successful payload.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {endpoint} failed: {reason}")]
    RequestFailed { endpoint: String, reason: String },

    #[error("Scheduler returned {status} for {endpoint}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Create-form submission errors.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("One or more of the fields has an error: {}", fields.join(", "))]
    FieldErrors { fields: Vec<String> },

    #[error("Runtime environment {name} is not available")]
    UnknownEnvironment { name: String },
}

/// Result type alias for the client.
pub type Result<T> = std::result::Result<T, Error>;
