// --- Event request structs and their validation ---
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{EventCategory, EventChanges, NewEvent};
use crate::error::ApiError;

/// Body of create-event and update-event requests.
///
/// Everything is optional at the wire level so that a missing field yields
/// a readable 400 instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct EventPayload {
    pub title: Option<String>,
    pub category: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    /// URL of an already hosted image
    pub image: Option<String>,
}

impl EventPayload {
    /// Validate a full event for creation, owned by `owner`.
    pub fn into_new_event(self, owner: Uuid) -> Result<NewEvent, ApiError> {
        let missing = || ApiError::bad_request("Required fields are missing");

        let title = non_blank(self.title).ok_or_else(missing)?;
        let category = non_blank(self.category).ok_or_else(missing)?;
        let date = non_blank(self.date).ok_or_else(missing)?;
        let time = non_blank(self.time).ok_or_else(missing)?;
        let location = non_blank(self.location).ok_or_else(missing)?;
        let description = non_blank(self.description).ok_or_else(missing)?;

        Ok(NewEvent {
            title,
            image: non_blank(self.image),
            category: parse_category(&category)?,
            date: parse_event_date(&date)?,
            time,
            location,
            description,
            created_by: owner,
        })
    }

    /// Validate whichever fields were supplied for a partial update.
    pub fn into_changes(self) -> Result<EventChanges, ApiError> {
        Ok(EventChanges {
            title: non_blank(self.title),
            image: non_blank(self.image),
            category: non_blank(self.category).map(|c| parse_category(&c)).transpose()?,
            date: non_blank(self.date).map(|d| parse_event_date(&d)).transpose()?,
            time: non_blank(self.time),
            location: non_blank(self.location),
            description: non_blank(self.description),
        })
    }
}

/// Trimmed value, or `None` when absent or blank.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_category(raw: &str) -> Result<EventCategory, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::bad_request(format!("Invalid event category: {raw}")))
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp (date part kept).
pub fn parse_event_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| ApiError::bad_request(format!("Invalid event date: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full() -> EventPayload {
        EventPayload {
            title: Some("RustConf".into()),
            category: Some("Conference".into()),
            date: Some("2026-11-20".into()),
            time: Some("09:00".into()),
            location: Some("Dhaka".into()),
            description: Some("Talks".into()),
            image: None,
        }
    }

    #[test]
    fn test_full_payload_becomes_event() {
        let owner = Uuid::new_v4();
        let event = full().into_new_event(owner).unwrap();

        assert_eq!(event.created_by, owner);
        assert_eq!(event.category, EventCategory::Conference);
        assert_eq!(event.date, NaiveDate::from_ymd_opt(2026, 11, 20).unwrap());
    }

    #[test]
    fn test_missing_or_blank_field_rejected() {
        let payload = EventPayload {
            location: Some("   ".into()),
            ..full()
        };
        let err = payload.into_new_event(Uuid::new_v4()).unwrap_err();
        assert_eq!(err.to_string(), "Required fields are missing");

        let payload = EventPayload {
            title: None,
            ..full()
        };
        assert!(payload.into_new_event(Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_unknown_category_rejected() {
        let payload = EventPayload {
            category: Some("Concert".into()),
            ..full()
        };
        assert!(matches!(
            payload.into_new_event(Uuid::new_v4()),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_dates() {
        assert_eq!(
            parse_event_date("2026-01-31T18:30:00.000Z").unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
        );
        assert!(parse_event_date("31/01/2026").is_err());
    }

    #[test]
    fn test_changes_keep_only_supplied_fields() {
        let changes = EventPayload {
            title: Some("New".into()),
            category: Some("Education".into()),
            ..Default::default()
        }
        .into_changes()
        .unwrap();

        assert_eq!(changes.title.as_deref(), Some("New"));
        assert_eq!(changes.category, Some(EventCategory::Education));
        assert!(changes.location.is_none());
        assert!(changes.date.is_none());
    }
}
