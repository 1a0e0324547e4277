//! Track / untrack routes: a user's saved-events list.

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::User;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

async fn caller(app_state: &AppState, user: &AuthUser) -> ApiResult<User> {
    app_state
        .store
        .find_user_by_id(user.user_id()?)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn track_event(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user = caller(&app_state, &user).await?;
    let event_id = Uuid::parse_str(&event_id).map_err(|_| ApiError::not_found("Event not found"))?;

    if app_state.store.find_event(event_id).await?.is_none() {
        return Err(ApiError::not_found("Event not found"));
    }
    if !app_state.store.track_event(user.id, event_id).await? {
        return Err(ApiError::bad_request("Event already tracked"));
    }

    Ok(Json(json!({ "success": true, "message": "Event tracked successfully" })))
}

pub async fn untrack_event(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user = caller(&app_state, &user).await?;

    // An unparseable id can never have been tracked.
    let untracked = match Uuid::parse_str(&event_id) {
        Ok(event_id) => app_state.store.untrack_event(user.id, event_id).await?,
        Err(_) => false,
    };
    if !untracked {
        return Err(ApiError::bad_request("Event is not tracked"));
    }

    Ok(Json(json!({ "success": true, "message": "Event untracked successfully" })))
}

pub async fn my_tracked_events(
    State(app_state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<Value>> {
    let user = caller(&app_state, &user).await?;
    let events = app_state.store.tracked_events(user.id).await?;

    Ok(Json(json!({ "success": true, "data": events })))
}
