//! Authentication Models
//!
//! Data structures for authentication requests, responses, and the identity
//! attached to authenticated requests.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::jwt::Claims;
use crate::database::models::User;
use crate::error::ApiError;

/// Authenticated user information extracted from a verified token.
///
/// Lives in the request extensions for the duration of one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

impl AuthUser {
    /// Parse the subject back into a store key.
    ///
    /// Every token we issue carries a UUID subject, so failure here means the
    /// identity cannot own anything in this store.
    pub fn user_id(&self) -> Result<Uuid, ApiError> {
        Uuid::parse_str(&self.id).map_err(|_| {
            tracing::warn!(sub = %self.id, "authenticated subject is not a user id");
            ApiError::Unauthenticated
        })
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
        }
    }
}

/// Registration request payload
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Login request payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Body returned after a successful login
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: UserInfo,
    pub token: String,
}

impl LoginResponse {
    pub fn new(token: String, user: UserInfo) -> Self {
        Self {
            success: true,
            message: "Successfully logged in".to_string(),
            user,
            token,
        }
    }
}
