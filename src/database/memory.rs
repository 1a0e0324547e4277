//! In-process store used when `DATABASE_URL` is unset, and by the tests.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::database::Store;
use crate::database::models::{DuplicateEmail, Event, EventChanges, EventFilter, NewEvent, NewUser, User};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    events: HashMap<Uuid, Event>,
    /// Per user, tracked event ids in the order they were tracked.
    tracked: HashMap<Uuid, Vec<Uuid>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut inner = self.inner.write();
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(DuplicateEmail(user.email).into());
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.inner.read().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.inner.read().users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let mut users: Vec<User> = self.inner.read().users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn create_event(&self, event: NewEvent) -> Result<Event> {
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            title: event.title,
            image: event.image,
            category: event.category,
            date: event.date,
            time: event.time,
            location: event.location,
            description: event.description,
            created_by: event.created_by,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().events.insert(event.id, event.clone());
        Ok(event)
    }

    async fn list_events(&self, filter: &EventFilter, offset: u64, limit: u64) -> Result<(u64, Vec<Event>)> {
        let inner = self.inner.read();
        let mut matching: Vec<&Event> = inner.events.values().filter(|e| filter.matches(e)).collect();
        matching.sort_by_key(|e| (e.date, e.created_at));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect();
        Ok((total, page))
    }

    async fn find_event(&self, id: Uuid) -> Result<Option<Event>> {
        Ok(self.inner.read().events.get(&id).cloned())
    }

    async fn update_event(&self, id: Uuid, owner: Uuid, changes: EventChanges) -> Result<Option<Event>> {
        let mut inner = self.inner.write();
        match inner.events.get_mut(&id) {
            Some(event) if event.created_by == owner => {
                changes.apply_to(event, Utc::now());
                Ok(Some(event.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_event(&self, id: Uuid, owner: Uuid) -> Result<Option<Event>> {
        let mut inner = self.inner.write();
        if !inner.events.get(&id).is_some_and(|e| e.created_by == owner) {
            return Ok(None);
        }

        let removed = inner.events.remove(&id);
        for ids in inner.tracked.values_mut() {
            ids.retain(|tracked| *tracked != id);
        }
        Ok(removed)
    }

    async fn events_by_creator(&self, owner: Uuid) -> Result<Vec<Event>> {
        let inner = self.inner.read();
        let mut events: Vec<Event> = inner
            .events
            .values()
            .filter(|e| e.created_by == owner)
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(events)
    }

    async fn track_event(&self, user: Uuid, event: Uuid) -> Result<bool> {
        let mut inner = self.inner.write();
        let ids = inner.tracked.entry(user).or_default();
        if ids.contains(&event) {
            return Ok(false);
        }
        ids.push(event);
        Ok(true)
    }

    async fn untrack_event(&self, user: Uuid, event: Uuid) -> Result<bool> {
        let mut inner = self.inner.write();
        let Some(ids) = inner.tracked.get_mut(&user) else {
            return Ok(false);
        };
        let before = ids.len();
        ids.retain(|tracked| *tracked != event);
        Ok(ids.len() != before)
    }

    async fn tracked_events(&self, user: Uuid) -> Result<Vec<Event>> {
        let inner = self.inner.read();
        Ok(inner
            .tracked
            .get(&user)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.events.get(id).cloned())
            .collect())
    }
}
