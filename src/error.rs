use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The browser process or its automation connection could not be started.
    #[error("Browser session error: {0}")]
    Session(String),

    #[error("Navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A lookup inside an already loaded page failed.
    #[error("Element error: {0}")]
    Element(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid value for {key}: {value:?} ({reason})")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error("Export failed: {0}")]
    Export(String),

    /// The request body could not be read as the expected JSON.
    #[error("Malformed request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Scrape(ScrapeError::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Scrape(e) => {
                tracing::error!("Scrape failed: {e}");
                (StatusCode::BAD_GATEWAY, e.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Export(msg) => {
                tracing::error!("Export failed: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = axum::Json(json!({ "error": message }));
        (status, body).into_response()
    }
}
