//! Auth routes for registration, login, logout and user listing

use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde_json::json;

use crate::auth::{
    AUTH_COOKIE, AuthUser,
    models::{LoginRequest, LoginResponse, RegisterRequest, UserInfo},
    password::{hash_password, verify_password},
};
use crate::database::models::{DuplicateEmail, NewUser};
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use crate::state_structs::non_blank;

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// A concurrent registration can still win the race after the lookup.
fn registration_error(e: anyhow::Error) -> ApiError {
    if e.is::<DuplicateEmail>() {
        ApiError::bad_request("User already exists")
    } else {
        e.into()
    }
}

pub async fn register(
    State(app_state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(name), Some(email), Some(password)) = (
        non_blank(payload.name),
        non_blank(payload.email),
        payload.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Name, email and password are required"));
    };
    let email = normalize_email(&email);

    if app_state.store.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("User already exists"));
    }

    let password_hash = hash_password(&password)?;
    let user = app_state
        .store
        .create_user(NewUser {
            name,
            email,
            password_hash,
        })
        .await
        .map_err(registration_error)?;
    tracing::info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "data": UserInfo::from(&user),
        })),
    ))
}

pub async fn login(
    State(app_state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    let invalid = || ApiError::not_found("Invalid email or password");

    let email = payload.email.as_deref().map(normalize_email).ok_or_else(invalid)?;
    let password = payload.password.ok_or_else(invalid)?;

    let user = app_state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&password, &user.password_hash)? {
        tracing::info!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    let token = app_state
        .token_service
        .issue(&user.email, &user.id.to_string())?;

    let cookie = Cookie::build((AUTH_COOKIE, token.clone()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(app_state.cookie_secure)
        .path("/")
        .max_age(time::Duration::seconds(app_state.token_service.ttl().num_seconds()));

    Ok((
        jar.add(cookie),
        Json(LoginResponse::new(token, UserInfo::from(&user))),
    ))
}

/// Stateless tokens cannot be revoked; this only clears the cookie.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    (
        jar.remove(Cookie::build(AUTH_COOKIE).path("/")),
        Json(json!({ "success": true, "message": "Logged out successfully" })),
    )
}

pub async fn all_users(
    State(app_state): State<AppState>,
    Extension(_caller): Extension<AuthUser>,
) -> ApiResult<Json<serde_json::Value>> {
    let users = app_state.store.list_users().await?;
    Ok(Json(json!({
        "success": true,
        "count": users.len(),
        "users": users,
    })))
}
