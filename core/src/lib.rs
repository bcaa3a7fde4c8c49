//! Wire types and a synchronous API client core for the todo service.
//!
//! # Overview
//! The server crate and any client share the types in this crate, so the
//! JSON contract lives in one place. `TodoClient` builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network
//! (host-does-IO pattern).
//!
//! # Design
//! - `TodoClient` is stateless: it holds only `base_url`.
//! - Each endpoint is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - Every response is an `Envelope<T>`; `parse_*` unwraps it.

pub mod client;
pub mod envelope;
pub mod error;
pub mod http;
pub mod timestamp;
pub mod types;

pub use client::{TodoClient, API_PREFIX};
pub use envelope::Envelope;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use timestamp::InvalidTimestamp;
pub use types::{CreateTodo, HealthStatus, InvalidPriority, Patch, Priority, Todo, UpdateTodo};
