use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::{
    errors::{ApiJson, AppError, Result},
    models::{ApiResponse, Card, CardPatch, CardSubmission, DeleteResponse, NewCard},
    render::{
        export::{content_disposition, MAX_SCALE, MIN_SCALE},
        export_png, render_preview, DimensionPreset, ExportOptions, Theme,
    },
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// Upscale factor, 1-4. Defaults to `EXPORT_SCALE`.
    pub scale: Option<u32>,
    /// Theme name (classic, sakura, midnight)
    pub theme: Option<String>,
    /// Layout preset (standard, compact)
    pub preset: Option<String>,
}

/// Card CRUD and export, nested under `/api/cards`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_card).get(list_cards))
        .route("/:id", get(get_card).put(update_card).delete(delete_card))
        .route("/:id/export", get(export_card))
}

/// `/validate-card`, mounted beside the card routes.
pub fn validation_router() -> Router<AppState> {
    Router::new().route("/validate-card", post(validate_card))
}

fn parse_id(raw: &str) -> Result<i32> {
    raw.parse::<i32>()
        .map_err(|_| AppError::BadRequest("Invalid ID format".to_string()))
}

fn not_found() -> AppError {
    AppError::NotFound("Card not found".to_string())
}

/// POST /api/cards
pub async fn create_card(
    State(state): State<AppState>,
    ApiJson(card): ApiJson<NewCard>,
) -> Result<(StatusCode, Json<ApiResponse<Card>>)> {
    card.validate()?;
    let created = state.store.create(card).await?;
    tracing::info!(id = created.id, username = %created.username, "created card");
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

/// GET /api/cards
pub async fn list_cards(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Card>>>> {
    let cards = state.store.get_all().await?;
    Ok(Json(ApiResponse::ok(cards)))
}

/// GET /api/cards/:id
pub async fn get_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Card>>> {
    let id = parse_id(&id)?;
    let card = state.store.get_by_id(id).await?.ok_or_else(not_found)?;
    Ok(Json(ApiResponse::ok(card)))
}

/// PUT /api/cards/:id - only the fields present in the body are changed
pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<CardPatch>,
) -> Result<Json<ApiResponse<Card>>> {
    let id = parse_id(&id)?;
    patch.validate()?;
    let card = state.store.update(id, patch).await?.ok_or_else(not_found)?;
    tracing::info!(id, "updated card");
    Ok(Json(ApiResponse::ok(card)))
}

/// DELETE /api/cards/:id
pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeleteResponse>>> {
    let id = parse_id(&id)?;
    if !state.store.delete(id).await? {
        return Err(not_found());
    }
    tracing::info!(id, "deleted card");
    Ok(Json(ApiResponse::ok(DeleteResponse { deleted: true })))
}

/// POST /api/validate-card - checks a payload without storing it
pub async fn validate_card(
    ApiJson(submission): ApiJson<CardSubmission>,
) -> Result<Json<ApiResponse<CardSubmission>>> {
    submission.card.validate()?;
    Ok(Json(ApiResponse::ok(submission)))
}

/// GET /api/cards/:id/export - the card as a PNG download
pub async fn export_card(
    State(state): State<AppState>,
    Path(id): Path<String>,
    params: std::result::Result<Query<ExportParams>, QueryRejection>,
) -> Result<Response> {
    let id = parse_id(&id)?;
    let Query(params) = params.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let opts = ExportOptions::with_scale(params.scale.unwrap_or(state.config.export_scale));
    if !(MIN_SCALE..=MAX_SCALE).contains(&opts.scale) {
        return Err(AppError::BadRequest(format!(
            "Scale must be between {} and {}",
            MIN_SCALE, MAX_SCALE
        )));
    }
    let theme = match params.theme.as_deref() {
        Some(name) => Theme::by_name(name)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown theme: {}", name)))?,
        None => Theme::default(),
    };
    let preset = match params.preset.as_deref() {
        Some(name) => DimensionPreset::parse(name)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown preset: {}", name)))?,
        None => DimensionPreset::default(),
    };

    let card = state.store.get_by_id(id).await?.ok_or_else(not_found)?;
    let disposition = content_disposition(&card.username);

    let exported = tokio::task::spawn_blocking(move || {
        let username = card.username.clone();
        let mut layout = render_preview(&NewCard::from(card), &theme, preset);
        export_png(&mut layout, &username, &opts)
    })
    .await
    .map_err(|e| AppError::Internal(format!("export task failed: {}", e)))?
    .map_err(|e| AppError::Internal(format!("export failed for card {}: {}", id, e)))?;

    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        exported.png,
    )
        .into_response())
}
