use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("External service error ({status}): {message}")]
    ExternalService { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Could not decode response: {0}")]
    Decode(String),

    #[error("Client not configured: {0}")]
    NotConfigured(String),
}

/// Error body returned by the booking API (`{ "status": "error", "message": "..." }`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl AppError {
    /// Maps a non-success HTTP status and its raw body onto the taxonomy.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.message.or(parsed.error))
            .unwrap_or_else(|| body.to_string());

        match status {
            401 | 403 => AppError::Auth(message),
            404 => AppError::NotFound(message),
            400 | 422 => AppError::BadRequest(message),
            409 => AppError::Conflict(message),
            _ => AppError::ExternalService { status, message },
        }
    }

    /// Whether repeating the same request might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Transport(_) => true,
            AppError::ExternalService { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return AppError::Decode(err.to_string());
        }

        if let Some(status) = err.status() {
            return AppError::ExternalService {
                status: status.as_u16(),
                message: err.to_string(),
            };
        }

        tracing::error!("Request failed: {}", err);
        AppError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}
