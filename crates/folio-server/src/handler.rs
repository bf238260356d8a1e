use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use folio_catalog::{featured, GalleryQuery, HOME_FEATURED_LIMIT};
use folio_gate::{AdminSession, Credentials, SessionState};
use folio_types::{ArtworkId, ArtworkPatch, ArtworkRecord, Category, CategoryFilter, NewArtwork};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::contact::ContactMessage;
use crate::error::{ServerError, ServerResult};
use crate::state::{Admin, AppState, BearerToken};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let categories: Vec<String> = Category::ALL
        .iter()
        .map(|c| c.label().to_string())
        .collect();
    Json(json!({
        "name": "folio-server",
        "version": env!("CARGO_PKG_VERSION"),
        "backend": state.catalog.backend_name(),
        "admin_policy": state.gate.policy_name(),
        "categories": categories,
        "catalog": state.catalog.status(),
        "contact": state.contact.is_some(),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub category: Option<String>,
    pub available: Option<bool>,
}

/// Gallery listing with the filter bar's query.
pub async fn list_handler(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Json<Vec<ArtworkRecord>> {
    let category = params
        .category
        .as_deref()
        .map(|c| c.parse::<CategoryFilter>().unwrap_or_default())
        .unwrap_or_default();
    let query = GalleryQuery {
        category,
        available_only: params.available.unwrap_or(false),
    };
    let snapshot = state.catalog.snapshot();
    Json(query.apply(&snapshot).into_iter().cloned().collect())
}

#[derive(Debug, Default, Deserialize)]
pub struct FeaturedParams {
    pub limit: Option<usize>,
}

pub async fn featured_handler(
    State(state): State<AppState>,
    Query(params): Query<FeaturedParams>,
) -> Json<Vec<ArtworkRecord>> {
    let snapshot = state.catalog.snapshot();
    let limit = params.limit.unwrap_or(HOME_FEATURED_LIMIT);
    Json(featured(&snapshot, limit).into_iter().cloned().collect())
}

pub async fn get_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Json<ArtworkRecord>> {
    let id = ArtworkId::new(id);
    state
        .catalog
        .get(&id)
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(id.to_string()))
}

pub async fn create_handler(
    State(state): State<AppState>,
    Admin(session): Admin,
    Json(input): Json<NewArtwork>,
) -> ServerResult<(StatusCode, Json<ArtworkRecord>)> {
    let record = state.catalog.add(input).await?;
    tracing::info!(id = %record.id, admin = %session.admin.name, "artwork added");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_handler(
    State(state): State<AppState>,
    Admin(session): Admin,
    Path(id): Path<String>,
    Json(patch): Json<ArtworkPatch>,
) -> ServerResult<Json<ArtworkRecord>> {
    let id = ArtworkId::new(id);
    state.catalog.update(&id, patch).await?;
    tracing::info!(%id, admin = %session.admin.name, "artwork updated");
    state
        .catalog
        .get(&id)
        .map(Json)
        .ok_or_else(|| ServerError::NotFound(id.to_string()))
}

pub async fn delete_handler(
    State(state): State<AppState>,
    Admin(session): Admin,
    Path(id): Path<String>,
) -> ServerResult<StatusCode> {
    let id = ArtworkId::new(id);
    state.catalog.delete(&id).await?;
    tracing::info!(%id, admin = %session.admin.name, "artwork deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn refresh_handler(
    State(state): State<AppState>,
    Admin(_): Admin,
) -> ServerResult<Json<serde_json::Value>> {
    let snapshot = state.catalog.refresh().await?;
    Ok(Json(json!({
        "revision": state.catalog.status().revision,
        "count": snapshot.len(),
    })))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> ServerResult<Json<AdminSession>> {
    let session = state.gate.log_in(&credentials).await?;
    Ok(Json(session))
}

pub async fn session_handler(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Json<SessionState> {
    Json(state.gate.state(&token))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> ServerResult<StatusCode> {
    state.gate.log_out(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn contact_handler(
    State(state): State<AppState>,
    Json(message): Json<ContactMessage>,
) -> ServerResult<Json<serde_json::Value>> {
    message.validate()?;
    let relay = state.contact.as_ref().ok_or(ServerError::ContactDisabled)?;
    relay.send(&message).await?;
    Ok(Json(json!({ "sent": true })))
}
