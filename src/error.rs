// src/error.rs

use thiserror::Error;

/// Global Client Error Enum.
/// Centralizes the failure taxonomy of every remote call and local operation.
#[derive(Debug, Error)]
pub enum AppError {
    /// No bearer token in the token store. Fatal for any authenticated call.
    #[error("Token not found. Please log in.")]
    MissingToken,

    /// Stored token is present but unusable (malformed or expired).
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// A required input (e.g. tryout id) was not provided.
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    /// The backend answered with a non-success status.
    #[error("Remote error {status}: {message}")]
    Remote { status: u16, message: String },

    /// Transport-level failure (connection refused, timeout, ...).
    #[error("Network error: {0}")]
    Network(String),

    /// Local state and the attempt record disagree (e.g. question id not in the order list).
    #[error("Data inconsistency: {0}")]
    Inconsistency(String),

    /// Request payload failed validation before being sent.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Response body could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Local file system failure (token store, export output).
    #[error("IO error: {0}")]
    Io(String),
}

impl AppError {
    /// Status code for `Remote` errors, `None` for everything else.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Converts `reqwest::Error` into the matching client error.
/// Status errors keep their code, body decoding failures become `Decode`.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            AppError::Remote {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::MissingParameter(format!("invalid base url: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}
