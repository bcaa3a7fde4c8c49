//! Wire types for the todo API.
//!
//! # Design
//! The server and the client core share these definitions, so the JSON
//! shape is fixed in one place. Field names are camelCase on the wire
//! (`dueDate`, `createdAt`, `updatedAt`).
//!
//! `UpdateTodo` uses `Patch<T>` for every optional field so a request can
//! distinguish "key omitted" from "key present with `null`". The service
//! decides what each of those means per field.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use validator::{Validate, ValidationError};

use crate::timestamp;

/// A single todo item as stored and returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Urgency of a todo, carried on the wire as `0`, `1` or `2`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Priority {
    #[default]
    Low = 0,
    Medium = 1,
    High = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("priority must be 0 (low), 1 (medium) or 2 (high), got {0}")]
pub struct InvalidPriority(pub i64);

impl TryFrom<i64> for Priority {
    type Error = InvalidPriority;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Priority::Low),
            1 => Ok(Priority::Medium),
            2 => Ok(Priority::High),
            other => Err(InvalidPriority(other)),
        }
    }
}

impl From<Priority> for i64 {
    fn from(priority: Priority) -> Self {
        priority as i64
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", i64::from(*self))
    }
}

/// Request payload for creating a new todo. New todos always start out
/// incomplete; there is no `completed` field.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    #[validate(
        custom(function = "not_blank", message = "title must not be blank"),
        length(max = 255, message = "title must be at most 255 characters")
    )]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Defaults to `Priority::Low` when omitted or `null`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// RFC 3339, or a local date-time without offset read as UTC.
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
}

impl CreateTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: None,
            due_date: None,
        }
    }
}

/// Request payload for replacing an existing todo.
///
/// `title` is always required. `description` and `dueDate` are overwritten
/// on every update, so omitting them clears the stored value. `completed`
/// and `priority` are only changed when a value is supplied.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    #[validate(
        custom(function = "not_blank", message = "title must not be blank"),
        length(max = 255, message = "title must be at most 255 characters")
    )]
    pub title: String,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub completed: Patch<bool>,
    #[serde(default, skip_serializing_if = "Patch::is_absent")]
    pub priority: Patch<Priority>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_patch",
        skip_serializing_if = "Patch::is_absent"
    )]
    pub due_date: Patch<DateTime<Utc>>,
}

impl UpdateTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: Patch::Absent,
            completed: Patch::Absent,
            priority: Patch::Absent,
            due_date: Patch::Absent,
        }
    }
}

fn not_blank(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// One field of a partial update.
///
/// `Absent` is produced by `#[serde(default)]` when the key is missing,
/// `Null` when the key carries JSON `null`, and `Value` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    /// The supplied value, if any. `Absent` and `Null` both yield `None`.
    pub fn into_value(self) -> Option<T> {
        match self {
            Patch::Value(value) => Some(value),
            Patch::Absent | Patch::Null => None,
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Patch::Null, Patch::Value)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Patch::from)
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Value(value) => value.serialize(serializer),
            Patch::Absent | Patch::Null => serializer.serialize_none(),
        }
    }
}

/// Payload of the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
    pub service: String,
    pub version: String,
    pub environment: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_serializes_with_camel_case_fields() {
        let now = DateTime::parse_from_rfc3339("2024-05-01T08:30:00Z").unwrap().with_timezone(&Utc);
        let todo = Todo {
            id: 7,
            title: "Test".to_string(),
            description: None,
            completed: false,
            priority: Priority::High,
            due_date: Some(now),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["priority"], 2);
        assert_eq!(json["description"], serde_json::Value::Null);
        assert_eq!(json["dueDate"], "2024-05-01T08:30:00Z");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("due_date").is_none());
    }

    #[test]
    fn priority_rejects_out_of_range_levels() {
        assert_eq!(serde_json::from_str::<Priority>("1").unwrap(), Priority::Medium);
        assert!(serde_json::from_str::<Priority>("3").is_err());
        assert!(serde_json::from_str::<Priority>("-1").is_err());
        assert_eq!(Priority::try_from(9), Err(InvalidPriority(9)));
    }

    #[test]
    fn priorities_are_ordered() {
        assert!(Priority::Low < Priority::Medium);
        assert!(Priority::Medium < Priority::High);
    }

    #[test]
    fn create_todo_fields_default_when_omitted() {
        let input: CreateTodo = serde_json::from_str(r#"{"title":"No extras"}"#).unwrap();
        assert_eq!(input.title, "No extras");
        assert!(input.description.is_none());
        assert!(input.priority.is_none());
        assert!(input.due_date.is_none());
    }

    #[test]
    fn create_todo_accepts_null_priority() {
        let input: CreateTodo = serde_json::from_str(r#"{"title":"x","priority":null}"#).unwrap();
        assert!(input.priority.is_none());
    }

    #[test]
    fn create_todo_rejects_missing_title() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"priority":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn blank_title_fails_validation() {
        assert!(CreateTodo::new("   ").validate().is_err());
        assert!(CreateTodo::new("").validate().is_err());
        assert!(UpdateTodo::new("\t").validate().is_err());
        assert!(CreateTodo::new("Buy milk").validate().is_ok());
    }

    #[test]
    fn title_length_is_counted_in_characters() {
        assert!(CreateTodo::new("é".repeat(255)).validate().is_ok());
        assert!(CreateTodo::new("a".repeat(256)).validate().is_err());
    }

    #[test]
    fn update_distinguishes_absent_from_null() {
        let input: UpdateTodo =
            serde_json::from_str(r#"{"title":"t","description":null,"completed":true}"#).unwrap();
        assert_eq!(input.description, Patch::Null);
        assert_eq!(input.completed, Patch::Value(true));
        assert_eq!(input.priority, Patch::Absent);
        assert_eq!(input.due_date, Patch::Absent);
    }

    #[test]
    fn update_serializes_only_present_patches() {
        let mut input = UpdateTodo::new("t");
        input.description = Patch::Null;
        input.priority = Patch::Value(Priority::Medium);
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["description"], serde_json::Value::Null);
        assert_eq!(json["priority"], 1);
        assert!(json.get("completed").is_none());
        assert!(json.get("dueDate").is_none());
    }

    #[test]
    fn due_date_accepts_local_date_time() {
        let create: CreateTodo =
            serde_json::from_str(r#"{"title":"x","dueDate":"2024-05-01T10:00:00"}"#).unwrap();
        let expected = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z").unwrap().with_timezone(&Utc);
        assert_eq!(create.due_date, Some(expected));

        let update: UpdateTodo =
            serde_json::from_str(r#"{"title":"x","dueDate":"2024-05-01T10:00:00"}"#).unwrap();
        assert_eq!(update.due_date, Patch::Value(expected));
        let update: UpdateTodo = serde_json::from_str(r#"{"title":"x","dueDate":null}"#).unwrap();
        assert_eq!(update.due_date, Patch::Null);
        let update: UpdateTodo = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(update.due_date, Patch::Absent);
    }

    #[test]
    fn due_date_rejects_unparseable_text() {
        let result: Result<CreateTodo, _> = serde_json::from_str(r#"{"title":"x","dueDate":"soon"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn patch_into_value_collapses_absent_and_null() {
        assert_eq!(Patch::<i32>::Absent.into_value(), None);
        assert_eq!(Patch::<i32>::Null.into_value(), None);
        assert_eq!(Patch::Value(3).into_value(), Some(3));
    }
}
