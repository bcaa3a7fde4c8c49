//! REST service for todo items.
//!
//! # Overview
//! Requests flow `api` → `service` → `store`. The API layer validates input
//! and wraps every result in `todo_core::Envelope`; the service applies the
//! update and toggle rules; the store persists records in SQLite or memory.
//!
//! # Design
//! - No global state: the store is opened once, wrapped in `TodoService`,
//!   and cloned into every handler through `AppState`.
//! - "Not found" is an ordinary `None` from the service. Only storage
//!   failures are errors, and they surface as a generic 500.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod service;
pub mod store;

pub use crate::config::AppConfig;
pub use crate::error::AppError;
pub use crate::service::TodoService;

/// Shared per-request state.
#[derive(Clone)]
pub struct AppState {
    pub service: TodoService,
    pub environment: Arc<str>,
}

impl AppState {
    pub fn new(service: TodoService, environment: &str) -> Self {
        Self {
            service,
            environment: Arc::from(environment),
        }
    }
}

/// Router over a fresh in-memory store.
pub fn app() -> Router {
    let service = TodoService::new(Arc::new(store::MemoryStore::new()));
    api::router(AppState::new(service, "development"))
}

/// Serve `state` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
