/*!
 * Error types for the doctran pipeline.
 *
 * This module contains custom error types for different parts of the pipeline,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when talking to an AI provider API.
///
/// Every adapter normalizes its failures into these variants; `code()`
/// exposes a stable machine-readable identifier for callers that need to
/// branch on the failure class without matching the enum.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The request exceeded the configured wall-clock timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The API responded with a non-success HTTP status
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// A 200 response whose body carries an error payload
    #[error("API returned an error payload: {0}")]
    ResponseError(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// Anything else
    #[error("Unknown provider error: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Stable machine-readable code for this failure class.
    pub fn code(&self) -> &'static str {
        match self {
            ProviderError::Timeout(_) => "timeout",
            ProviderError::ApiError { .. } => "api_error",
            ProviderError::ResponseError(_) => "response_error",
            ProviderError::ParseError(_) => "parse_error",
            ProviderError::ConnectionError(_) => "connection_error",
            ProviderError::AuthenticationError(_) => "auth_error",
            ProviderError::Unknown(_) => "unknown_error",
        }
    }
}

/// Errors that can occur during segment extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Malformed or incomplete document; aborts the whole extraction
    #[error("structural error in document: {0}")]
    Structural(String),

    /// The document could not be read at all
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors. These are always fatal to the call that hit them
/// and are never silently defaulted.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required secret is absent from the environment
    #[error("missing required secret {variable} for provider {provider}")]
    MissingSecret { provider: String, variable: String },

    /// No usable model could be resolved for the provider
    #[error("no model configured for provider {0}")]
    MissingModel(String),

    /// The target (or source) language is absent or not a valid ISO 639 code
    #[error("invalid language: {0}")]
    InvalidLanguage(String),

    /// Catch-all for malformed configuration values
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors surfaced by the segment store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying database failure
    #[error("database error: {0}")]
    Database(String),

    /// Stored payload could not be decoded
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        StoreError::Database(error.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        StoreError::Corrupt(error.to_string())
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from document extraction
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from the segment store
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
