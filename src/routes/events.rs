//! Event routes: create, list, fetch, update, delete.
//!
//! Update and delete are owner-scoped in the store, so a stranger's request
//! looks exactly like a request for a missing event.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{Creator, EventFilter};
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use crate::state_structs::EventPayload;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_PER_PAGE: u64 = 10;
const MAX_PER_PAGE: u64 = 100;

const NOT_FOUND_OR_NOT_OWNER: &str = "Event not found or unauthorized";

/// Positive integer path segment, or `default` for anything else.
fn page_param(raw: &str, default: u64) -> u64 {
    raw.trim().parse::<u64>().ok().filter(|n| *n > 0).unwrap_or(default)
}

fn parse_event_id(raw: &str, message: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(message))
}

pub async fn create_event(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<EventPayload>,
) -> ApiResult<Json<Value>> {
    let new_event = payload.into_new_event(user.user_id()?)?;
    let event = app_state.store.create_event(new_event).await?;
    tracing::info!("Event {} created by {}", event.id, user.id);

    Ok(Json(json!({
        "success": true,
        "message": "Event created successfully",
        "data": event,
    })))
}

pub async fn all_events(
    State(app_state): State<AppState>,
    Path((page_no, per_page)): Path<(String, String)>,
    Query(filter): Query<EventFilter>,
) -> ApiResult<Json<Value>> {
    let page_no = page_param(&page_no, DEFAULT_PAGE);
    let per_page = page_param(&per_page, DEFAULT_PER_PAGE).min(MAX_PER_PAGE);
    let offset = (page_no - 1).saturating_mul(per_page);

    let (total, events) = app_state.store.list_events(&filter, offset, per_page).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Events fetched successfully",
        "data": {
            "totalCount": [{ "count": total }],
            "events": events,
        },
    })))
}

pub async fn single_event(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_event_id(&id, "Event not found")?;
    let event = app_state
        .store
        .find_event(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;

    let creator: Vec<Creator> = app_state
        .store
        .find_user_by_id(event.created_by)
        .await?
        .iter()
        .map(Creator::from)
        .collect();

    let mut data = serde_json::to_value(&event).map_err(anyhow::Error::from)?;
    data["creator"] = json!(creator);

    Ok(Json(json!({
        "success": true,
        "message": "Event fetched successfully",
        "data": data,
    })))
}

pub async fn update_event(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<EventPayload>,
) -> ApiResult<Json<Value>> {
    let id = parse_event_id(&id, NOT_FOUND_OR_NOT_OWNER)?;
    let changes = payload.into_changes()?;

    let event = app_state
        .store
        .update_event(id, user.user_id()?, changes)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND_OR_NOT_OWNER))?;

    Ok(Json(json!({
        "success": true,
        "message": "Event updated successfully",
        "data": event,
    })))
}

pub async fn delete_event(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_event_id(&id, NOT_FOUND_OR_NOT_OWNER)?;

    let event = app_state
        .store
        .delete_event(id, user.user_id()?)
        .await?
        .ok_or_else(|| ApiError::not_found(NOT_FOUND_OR_NOT_OWNER))?;
    tracing::info!("Event {} deleted by {}", event.id, user.id);

    Ok(Json(json!({
        "success": true,
        "message": "Event deleted successfully",
        "data": event,
    })))
}

pub async fn my_events(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let events = app_state.store.events_by_creator(user.user_id()?).await?;

    Ok(Json(json!({
        "success": true,
        "data": events,
    })))
}
