use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};
use tracing::{info_span, warn, Instrument};

use crate::error::GatewayError;
use crate::state::AppState;
use crate::translate::{TranslationRequest, TranslationResult};

/// GET /health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "Service is running"
    }))
}

/// POST /translate
///
/// The body is parsed by hand so that malformed JSON maps to 500 and missing
/// fields to 400, before any upstream is contacted.
pub async fn translate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<TranslationResult>, GatewayError> {
    let request_id = state.generate_request_id();
    let span = info_span!("translate", request_id = %request_id);
    run_translate(&state, &body).instrument(span).await.map(Json)
}

async fn run_translate(
    state: &AppState,
    body: &[u8],
) -> Result<TranslationResult, GatewayError> {
    let request = TranslationRequest::from_json(body).map_err(|e| {
        warn!("Rejected translate request: {}", e);
        e
    })?;
    state.gateway.translate(&request).await
}

/// GET /languages
pub async fn languages(State(state): State<AppState>) -> Result<Json<Value>, GatewayError> {
    let request_id = state.generate_request_id();
    let span = info_span!("languages", request_id = %request_id);

    let languages = state.gateway.list_languages().instrument(span).await?;
    Ok(Json(languages))
}
