use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, warn};

/// Failures surfaced by the key validator and the translation orchestrator.
///
/// Every variant is reported to the caller as-is; nothing here is retried.
#[derive(Error, Debug)]
pub enum AppError {
    /// No file or no API key in the request. Raised before any remote call.
    #[error("Missing file or API key")]
    MissingInput,

    /// The request body could not be read (bad JSON, broken multipart).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// DeepL refused the API key.
    #[error("Invalid API key")]
    CredentialRejected,

    /// DeepL could not be reached at all.
    #[error("Failed to connect to DeepL")]
    Connectivity(#[source] reqwest::Error),

    #[error("Upload failed: {0}")]
    UploadRejected(String),

    #[error("Translation failed: {0}")]
    RemoteJobError(String),

    #[error("Download failed: {0}")]
    DownloadRejected(String),

    /// The job did not reach a terminal status within the wait budget.
    #[error("Translation timed out after {}s", .waited.as_secs())]
    Timeout { waited: Duration },

    /// DeepL answered with a body we could not make sense of.
    #[error("Unexpected response from DeepL: {0}")]
    UnexpectedResponse(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingInput | AppError::InvalidRequest(_) | AppError::UploadRejected(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::CredentialRejected => StatusCode::UNAUTHORIZED,
            AppError::Connectivity(_)
            | AppError::RemoteJobError(_)
            | AppError::DownloadRejected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            AppError::UnexpectedResponse(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        if status.is_server_error() {
            match &self {
                AppError::Connectivity(source) => {
                    error!(status = %status, source = %source, "{}", message)
                }
                _ => error!(status = %status, "{}", message),
            }
        } else {
            warn!(status = %status, "{}", message);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
