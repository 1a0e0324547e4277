// Database Connection Management
//
// PostgreSQL connection pooling using tokio-postgres and deadpool, and the
// SQL implementation of the `Store` trait.
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::time::Duration;
use tokio_postgres::Row;
use tokio_postgres::error::SqlState;
use uuid::Uuid;

use crate::database::Store;
use crate::database::models::{DuplicateEmail, Event, EventChanges, EventFilter, FromRow, NewEvent, NewUser, User};

const EVENT_COLUMNS: &str =
    "id, title, image, category, date, time, location, description, created_by, created_at, updated_at";
const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub max_size: usize,
    pub timeouts: deadpool_postgres::Timeouts,
}

impl DatabaseConfig {
    /// Create configuration from database URL
    pub fn from_url(url: &str, max_size: usize) -> Result<Self> {
        let parsed = url::Url::parse(url).context("Failed to parse database URL")?;

        if parsed.scheme() != "postgresql" && parsed.scheme() != "postgres" {
            anyhow::bail!("Invalid database URL scheme, expected postgresql or postgres");
        }

        Ok(Self {
            host: parsed.host_str().unwrap_or("localhost").to_string(),
            port: parsed.port().unwrap_or(5432),
            user: parsed.username().to_string(),
            password: parsed.password().unwrap_or("").to_string(),
            dbname: parsed.path().trim_start_matches('/').to_string(),
            max_size,
            timeouts: deadpool_postgres::Timeouts {
                wait: Some(Duration::from_secs(30)),
                create: Some(Duration::from_secs(30)),
                recycle: Some(Duration::from_secs(30)),
            },
        })
    }
}

/// Database connection wrapper
#[derive(Debug, Clone)]
pub struct DatabaseConnection {
    pool: Pool,
}

impl DatabaseConnection {
    /// Create a new database connection with the provided configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self> {
        let masked_host = format!("{}:{}/{}", config.host, config.port, config.dbname);
        tracing::info!("🔌 Connecting to database: {}", masked_host);

        let mut pg_config = tokio_postgres::Config::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.dbname(&config.dbname);

        let tls_connector = TlsConnector::builder()
            .build()
            .context("Failed to build TLS connector")?;
        let tls = MakeTlsConnector::new(tls_connector);

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, tls, mgr_config);

        let pool = Pool::builder(mgr)
            .max_size(config.max_size)
            .wait_timeout(config.timeouts.wait)
            .create_timeout(config.timeouts.create)
            .recycle_timeout(config.timeouts.recycle)
            .runtime(deadpool_postgres::Runtime::Tokio1)
            .build()
            .context("Failed to create database pool")?;

        let connection = Self { pool };
        connection.health_check().await?;

        tracing::info!("✅ Database connection established successfully");
        Ok(connection)
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        let client = self
            .pool
            .get()
            .await
            .context("Failed to get connection for health check")?;

        client
            .query("SELECT 1", &[])
            .await
            .context("Database health check failed")?;
        Ok(())
    }

    async fn query_events(&self, sql: &str, params: &[&(dyn tokio_postgres::types::ToSql + Sync)]) -> Result<Vec<Event>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let rows = client.query(sql, params).await.context("Failed to query events")?;
        rows.iter().map(Event::from_row).collect()
    }
}

fn first<T: FromRow>(row: Option<Row>) -> Result<Option<T>> {
    row.as_ref().map(T::from_row).transpose()
}

#[async_trait]
impl Store for DatabaseConnection {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let row = client
            .query_one(
                &format!(
                    "INSERT INTO users (id, name, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
                ),
                &[&Uuid::new_v4(), &user.name, &user.email, &user.password_hash],
            )
            .await
            .map_err(|e| match e.code() {
                Some(code) if *code == SqlState::UNIQUE_VIOLATION => DuplicateEmail(user.email.clone()).into(),
                _ => anyhow::Error::new(e).context("Failed to insert user"),
            })?;
        User::from_row(&row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let row = client
            .query_opt(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"), &[&email])
            .await
            .context("Failed to query user by email")?;
        first(row)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let row = client
            .query_opt(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"), &[&id])
            .await
            .context("Failed to query user by id")?;
        first(row)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let rows = client
            .query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"), &[])
            .await
            .context("Failed to list users")?;
        rows.iter().map(User::from_row).collect()
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let row = client
            .query_one(
                &format!(
                    "INSERT INTO events (id, title, image, category, date, time, location, description, created_by) \
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {EVENT_COLUMNS}"
                ),
                &[
                    &Uuid::new_v4(),
                    &event.title,
                    &event.image,
                    &event.category.as_str(),
                    &event.date,
                    &event.time,
                    &event.location,
                    &event.description,
                    &event.created_by,
                ],
            )
            .await
            .context("Failed to insert event")?;
        Event::from_row(&row)
    }

    async fn list_events(&self, filter: &EventFilter, offset: u64, limit: u64) -> Result<(u64, Vec<Event>)> {
        // NULL parameters disable the corresponding filter.
        let where_clause = "($1::TEXT IS NULL OR category = $1) AND ($2::TEXT IS NULL OR location = $2)";
        let offset = i64::try_from(offset).context("offset out of range")?;
        let limit = i64::try_from(limit).context("limit out of range")?;

        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let total: i64 = client
            .query_one(
                &format!("SELECT COUNT(*) FROM events WHERE {where_clause}"),
                &[&filter.category, &filter.location],
            )
            .await
            .context("Failed to count events")?
            .try_get(0)?;

        let rows = client
            .query(
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM events WHERE {where_clause} \
                     ORDER BY date ASC, created_at ASC OFFSET $3 LIMIT $4"
                ),
                &[&filter.category, &filter.location, &offset, &limit],
            )
            .await
            .context("Failed to list events")?;
        let events = rows.iter().map(Event::from_row).collect::<Result<Vec<_>>>()?;

        Ok((total.max(0) as u64, events))
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let row = client
            .query_opt(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"), &[&id])
            .await
            .context("Failed to query event")?;
        first(row)
    }

    async fn update_event(&self, id: Uuid, owner: Uuid, changes: EventChanges) -> Result<Option<Event>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let row = client
            .query_opt(
                &format!(
                    "UPDATE events SET \
                       title = COALESCE($3, title), \
                       image = COALESCE($4, image), \
                       category = COALESCE($5, category), \
                       date = COALESCE($6, date), \
                       time = COALESCE($7, time), \
                       location = COALESCE($8, location), \
                       description = COALESCE($9, description), \
                       updated_at = $10 \
                     WHERE id = $1 AND created_by = $2 RETURNING {EVENT_COLUMNS}"
                ),
                &[
                    &id,
                    &owner,
                    &changes.title,
                    &changes.image,
                    &changes.category.map(|c| c.as_str()),
                    &changes.date,
                    &changes.time,
                    &changes.location,
                    &changes.description,
                    &Utc::now(),
                ],
            )
            .await
            .context("Failed to update event")?;
        first(row)
    }

    async fn delete_event(&self, id: Uuid, owner: Uuid) -> Result<Option<Event>> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let row = client
            .query_opt(
                &format!("DELETE FROM events WHERE id = $1 AND created_by = $2 RETURNING {EVENT_COLUMNS}"),
                &[&id, &owner],
            )
            .await
            .context("Failed to delete event")?;
        first(row)
    }

    async fn events_by_creator(&self, owner: Uuid) -> Result<Vec<Event>> {
        self.query_events(
            &format!("SELECT {EVENT_COLUMNS} FROM events WHERE created_by = $1 ORDER BY created_at DESC"),
            &[&owner],
        )
        .await
    }

    async fn track_event(&self, user: Uuid, event: Uuid) -> Result<bool> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let inserted = client
            .execute(
                "INSERT INTO tracked_events (user_id, event_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                &[&user, &event],
            )
            .await
            .context("Failed to track event")?;
        Ok(inserted == 1)
    }

    async fn untrack_event(&self, user: Uuid, event: Uuid) -> Result<bool> {
        let client = self.pool.get().await.context("Failed to get DB connection")?;
        let deleted = client
            .execute(
                "DELETE FROM tracked_events WHERE user_id = $1 AND event_id = $2",
                &[&user, &event],
            )
            .await
            .context("Failed to untrack event")?;
        Ok(deleted == 1)
    }

    async fn tracked_events(&self, user: Uuid) -> Result<Vec<Event>> {
        let columns = EVENT_COLUMNS
            .split(", ")
            .map(|c| format!("e.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        self.query_events(
            &format!(
                "SELECT {columns} FROM tracked_events t JOIN events e ON e.id = t.event_id \
                 WHERE t.user_id = $1 ORDER BY t.tracked_at"
            ),
            &[&user],
        )
        .await
    }
}
