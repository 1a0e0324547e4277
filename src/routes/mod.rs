// # Routes Module
//
// - HTTP route handlers, mounted under `/api/v1` by `server::build_router`.
// - Handlers behind the authenticator read the caller from `Extension<AuthUser>`
//   and make their own ownership decisions.

/// Health check and banner endpoints
pub mod health;

/// Registration, login, logout and user listing
pub mod auth;

/// Event CRUD and listing
pub mod events;

/// Per-user event tracking
pub mod tracking;
