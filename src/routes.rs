use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Multipart,
        State,
    },
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;
use crate::translate::{ApiKey, SourceDocument, Usage};

/// Name used when the `file` part carries no filename.
const DEFAULT_UPLOAD_NAME: &str = "document.pdf";

/// The full application: routes, body limit, tracing and CORS.
pub fn create_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.system_config.max_upload_bytes;

    create_routes()
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/check-key", post(check_key))
        .route("/api/translate", post(translate))
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct CheckKeyRequest {
    #[serde(rename = "apiKey", default)]
    api_key: Option<String>,
}

async fn check_key(
    State(state): State<AppState>,
    payload: Result<Json<CheckKeyRequest>, JsonRejection>,
) -> Result<Json<Usage>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::InvalidRequest(e.body_text()))?;
    let api_key = request.api_key.and_then(ApiKey::new);

    let usage = state.key_validator().validate(api_key).await?;
    Ok(Json(usage))
}

async fn translate(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::InvalidRequest(e.body_text()))?;

    let mut file = None;
    let mut api_key = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidRequest(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_UPLOAD_NAME)
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
                file = Some(SourceDocument { filename, data });
            }
            Some("apiKey") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::InvalidRequest(e.body_text()))?;
                api_key = ApiKey::new(text);
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    let document = state.orchestrator().translate(file, api_key).await?;

    Ok((
        [
            (header::CONTENT_TYPE, document.content_type.to_string()),
            (header::CONTENT_DISPOSITION, document.content_disposition()),
        ],
        document.data,
    )
        .into_response())
}
