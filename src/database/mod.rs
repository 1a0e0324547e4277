//! # Database Module
//!
//! Storage for users, events and tracked events. Handlers talk to the
//! [`Store`] trait; PostgreSQL backs it in production and an in-memory map
//! backs it when no database is configured.

pub mod connection;
pub mod memory;
pub mod migrations;
pub mod models;

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub use connection::{DatabaseConfig, DatabaseConnection};
pub use memory::MemoryStore;
pub use models::*;

/// Persistence operations used by the route handlers.
///
/// Owner-scoped mutations return `None` both when the event does not exist
/// and when `owner` did not create it.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;

    async fn create_event(&self, event: NewEvent) -> Result<Event>;
    /// Matching events ordered by date ascending, plus the total match count.
    async fn list_events(&self, filter: &EventFilter, offset: u64, limit: u64) -> Result<(u64, Vec<Event>)>;
    async fn find_event(&self, id: Uuid) -> Result<Option<Event>>;
    async fn update_event(&self, id: Uuid, owner: Uuid, changes: EventChanges) -> Result<Option<Event>>;
    async fn delete_event(&self, id: Uuid, owner: Uuid) -> Result<Option<Event>>;
    /// Events created by `owner`, newest first.
    async fn events_by_creator(&self, owner: Uuid) -> Result<Vec<Event>>;

    /// Returns `false` if the event was already tracked.
    async fn track_event(&self, user: Uuid, event: Uuid) -> Result<bool>;
    /// Returns `false` if the event was not tracked.
    async fn untrack_event(&self, user: Uuid, event: Uuid) -> Result<bool>;
    async fn tracked_events(&self, user: Uuid) -> Result<Vec<Event>>;
}
