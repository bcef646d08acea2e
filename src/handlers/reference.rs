use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::{
    models::{ApiResponse, ReferenceData},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reference", get(get_reference))
        .route("/health", get(health_check))
}

/// GET /api/reference - countries, genres and statuses for the editor selects
pub async fn get_reference() -> Json<ApiResponse<ReferenceData>> {
    Json(ApiResponse::ok(ReferenceData::get()))
}

/// GET /api/health
pub async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    Json(ApiResponse::ok(json!({
        "status": "healthy",
        "service": "otaku-card",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "store": state.store.backend(),
        "endpoints": {
            "cards": "/api/cards",
            "validate": "/api/validate-card",
            "upload": "/api/upload",
            "reference": "/api/reference",
            "health": "/api/health"
        }
    })))
}
