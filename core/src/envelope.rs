//! Uniform response envelope.
//!
//! Every endpoint answers with `{code, message, data, total, timestamp}`.
//! `code` repeats the HTTP status, `data` is `null` on failures, and
//! `total` is only set by list endpoints and bulk deletes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SUCCESS_MESSAGE: &str = "success";
pub const CREATED_MESSAGE: &str = "Created successfully";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
    pub total: Option<u64>,
    pub timestamp: DateTime<Utc>,
}

impl<T> Envelope<T> {
    pub fn new(code: u16, message: impl Into<String>, data: Option<T>, total: Option<u64>) -> Self {
        Self {
            code,
            message: message.into(),
            data,
            total,
            timestamp: Utc::now(),
        }
    }

    pub fn success(data: T) -> Self {
        Self::new(200, SUCCESS_MESSAGE, Some(data), None)
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self::new(200, message, Some(data), None)
    }

    pub fn created(data: T) -> Self {
        Self::new(201, CREATED_MESSAGE, Some(data), None)
    }

    /// A failure envelope: `data` and `total` are always `null`.
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::new(code, message, None, None)
    }
}

impl<T> Envelope<Vec<T>> {
    /// A list payload whose `total` is its length.
    pub fn list(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        Self::new(200, SUCCESS_MESSAGE, Some(items), Some(total))
    }
}

impl Envelope<()> {
    /// Result of a bulk delete: no payload, `total` carries the affected rows.
    pub fn affected(message: impl Into<String>, count: u64) -> Self {
        Self::new(200, message, None, Some(count))
    }
}
