// Database Models
//
// Users, events and the write-side payloads the store accepts. Field names
// serialize the way the frontend reads them (`_id`, camelCase).

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_postgres::Row;
use uuid::Uuid;

/// Trait for converting from tokio-postgres Row
pub trait FromRow {
    fn from_row(row: &Row) -> Result<Self>
    where
        Self: Sized;
}

// ============================================================================
// USER MODELS
// ============================================================================

/// User account information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for User {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Minimal creator view embedded in single-event responses.
#[derive(Debug, Clone, Serialize)]
pub struct Creator {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<&User> for Creator {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

// ============================================================================
// EVENT MODELS
// ============================================================================

/// `create_user` was given an email that is already registered.
#[derive(Debug, Error)]
#[error("email {0} already registered")]
pub struct DuplicateEmail(pub String);

#[derive(Debug, Error)]
#[error("unknown event category: {0}")]
pub struct UnknownCategory(pub String);

/// The fixed set of categories an event may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    Entertainment,
    Conference,
    #[serde(rename = "Expo & Exhibition")]
    ExpoAndExhibition,
    #[serde(rename = "Workshop & Training")]
    WorkshopAndTraining,
    #[serde(rename = "Meetup & Networking")]
    MeetupAndNetworking,
    #[serde(rename = "Sports & Fitness")]
    SportsAndFitness,
    Education,
    #[serde(rename = "Cultural & Festival")]
    CulturalAndFestival,
}

impl EventCategory {
    pub const ALL: [EventCategory; 8] = [
        Self::Entertainment,
        Self::Conference,
        Self::ExpoAndExhibition,
        Self::WorkshopAndTraining,
        Self::MeetupAndNetworking,
        Self::SportsAndFitness,
        Self::Education,
        Self::CulturalAndFestival,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entertainment => "Entertainment",
            Self::Conference => "Conference",
            Self::ExpoAndExhibition => "Expo & Exhibition",
            Self::WorkshopAndTraining => "Workshop & Training",
            Self::MeetupAndNetworking => "Meetup & Networking",
            Self::SportsAndFitness => "Sports & Fitness",
            Self::Education => "Education",
            Self::CulturalAndFestival => "Cultural & Festival",
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A listed event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub image: Option<String>,
    pub category: EventCategory,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub description: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FromRow for Event {
    fn from_row(row: &Row) -> Result<Self> {
        let category: String = row.try_get("category")?;
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            image: row.try_get("image")?,
            category: category.parse()?,
            date: row.try_get("date")?,
            time: row.try_get("time")?,
            location: row.try_get("location")?,
            description: row.try_get("description")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub image: Option<String>,
    pub category: EventCategory,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub description: String,
    pub created_by: Uuid,
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct EventChanges {
    pub title: Option<String>,
    pub image: Option<String>,
    pub category: Option<EventCategory>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl EventChanges {
    pub fn apply_to(self, event: &mut Event, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            event.title = title;
        }
        if let Some(image) = self.image {
            event.image = Some(image);
        }
        if let Some(category) = self.category {
            event.category = category;
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(time) = self.time {
            event.time = time;
        }
        if let Some(location) = self.location {
            event.location = location;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        event.updated_at = now;
    }
}

/// Optional exact-match filters for event listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventFilter {
    pub category: Option<String>,
    pub location: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.category
            .as_deref()
            .is_none_or(|c| c == event.category.as_str())
            && self
                .location
                .as_deref()
                .is_none_or(|l| l == event.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_round_trip_through_serde_and_from_str() {
        for category in EventCategory::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
            assert_eq!(category.as_str().parse::<EventCategory>().unwrap(), category);
        }
        assert!("Concert".parse::<EventCategory>().is_err());
    }

    #[test]
    fn test_user_serialization_hides_hash() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ann".into(),
            email: "ann@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert_eq!(value["_id"], user.id.to_string());
        assert!(value.get("createdAt").is_some());
    }

    #[test]
    fn test_changes_only_touch_given_fields() {
        let now = Utc::now();
        let mut event = Event {
            id: Uuid::new_v4(),
            title: "Old".into(),
            image: None,
            category: EventCategory::Conference,
            date: NaiveDate::from_ymd_opt(2026, 5, 1).unwrap(),
            time: "10:00".into(),
            location: "Dhaka".into(),
            description: "desc".into(),
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        };

        EventChanges {
            title: Some("New".into()),
            ..Default::default()
        }
        .apply_to(&mut event, now);

        assert_eq!(event.title, "New");
        assert_eq!(event.location, "Dhaka");
        assert_eq!(event.category, EventCategory::Conference);
    }
}
