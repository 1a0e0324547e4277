//! # Authentication Module
//!
//! Token issuance and verification, the request gate in front of protected
//! routes, and password hashing for the login flow.

pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;

pub use jwt::TokenService;
pub use middleware::{AUTH_COOKIE, AuthMiddleware};
pub use models::AuthUser;
