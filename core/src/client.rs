//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip, keeping the core
//! deterministic and free of I/O dependencies.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use url::form_urlencoded;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{CreateTodo, HealthStatus, Priority, Todo, UpdateTodo};

/// Path prefix under which the server mounts every route.
pub const API_PREFIX: &str = "/api/v1";

/// Synchronous, stateless client for the todo API.
#[derive(Debug, Clone)]
pub struct TodoClient {
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{API_PREFIX}{route}", self.base_url)
    }

    fn request(&self, method: HttpMethod, route: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(route),
            headers: Vec::new(),
            body: None,
        }
    }

    fn json_request<T: serde::Serialize>(
        &self,
        method: HttpMethod,
        route: &str,
        input: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: self.url(route),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    pub fn build_list_todos(&self, completed: Option<bool>) -> HttpRequest {
        self.request(HttpMethod::Get, &with_completed("/todos", completed))
    }

    pub fn build_get_todo(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/todos/{id}"))
    }

    pub fn build_create_todo(&self, input: &CreateTodo) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/todos", input)
    }

    pub fn build_update_todo(&self, id: i64, input: &UpdateTodo) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/todos/{id}"), input)
    }

    pub fn build_toggle_todo(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Patch, &format!("/todos/{id}/toggle"))
    }

    pub fn build_delete_todo(&self, id: i64) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/todos/{id}"))
    }

    pub fn build_delete_completed(&self) -> HttpRequest {
        self.request(HttpMethod::Delete, "/todos/completed")
    }

    pub fn build_delete_all(&self) -> HttpRequest {
        self.request(HttpMethod::Delete, "/todos/all")
    }

    pub fn build_search_todos(&self, title: &str) -> HttpRequest {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("title", title)
            .finish();
        self.request(HttpMethod::Get, &format!("/todos/search?{query}"))
    }

    pub fn build_todos_by_priority(&self, priority: Priority) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/todos/priority/{priority}"))
    }

    pub fn build_upcoming_todos(&self, due_by: DateTime<Utc>) -> HttpRequest {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("dueDate", &due_by.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            .finish();
        self.request(HttpMethod::Get, &format!("/todos/upcoming?{query}"))
    }

    pub fn build_count_todos(&self, completed: Option<bool>) -> HttpRequest {
        self.request(HttpMethod::Get, &with_completed("/todos/count", completed))
    }

    pub fn build_health(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/health")
    }

    /// Parses any list-shaped response: list, search, priority and upcoming.
    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        payload(decode(&response, 200)?)
    }

    pub fn parse_get_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        payload(decode(&response, 200)?)
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        payload(decode(&response, 201)?)
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        payload(decode(&response, 200)?)
    }

    pub fn parse_toggle_todo(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        payload(decode(&response, 200)?)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        decode::<serde_json::Value>(&response, 200)?;
        Ok(())
    }

    /// Number of rows removed by `delete_completed` or `delete_all`.
    pub fn parse_bulk_delete(&self, response: HttpResponse) -> Result<u64, ApiError> {
        let envelope = decode::<serde_json::Value>(&response, 200)?;
        envelope
            .total
            .ok_or_else(|| ApiError::DeserializationError("envelope has no total".to_string()))
    }

    pub fn parse_count_todos(&self, response: HttpResponse) -> Result<u64, ApiError> {
        payload(decode(&response, 200)?)
    }

    pub fn parse_health(&self, response: HttpResponse) -> Result<HealthStatus, ApiError> {
        payload(decode(&response, 200)?)
    }
}

fn with_completed(route: &str, completed: Option<bool>) -> String {
    match completed {
        Some(completed) => format!("{route}?completed={completed}"),
        None => route.to_string(),
    }
}

/// Check the status, then decode the envelope.
///
/// Error statuses still try to decode the envelope so its `message` can be
/// surfaced; a body that is not an envelope falls back to the raw text.
fn decode<T: DeserializeOwned>(response: &HttpResponse, expected: u16) -> Result<Envelope<T>, ApiError> {
    if response.status != expected {
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&response.body)
            .map(|envelope| envelope.message)
            .unwrap_or_else(|_| response.body.clone());
        if response.status == 404 {
            return Err(ApiError::NotFound { message });
        }
        return Err(ApiError::HttpError {
            status: response.status,
            message,
        });
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

fn payload<T>(envelope: Envelope<T>) -> Result<T, ApiError> {
    envelope
        .data
        .ok_or_else(|| ApiError::DeserializationError("envelope has no data".to_string()))
}
