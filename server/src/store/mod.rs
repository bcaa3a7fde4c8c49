//! Persistence for todo records.
//!
//! # Design
//! `TodoStore` is the only thing the service knows about storage. It is
//! handed to `TodoService::new` as an `Arc<dyn TodoStore>`, so the backend
//! is picked once at startup and nothing else holds global state.
//!
//! Read-modify-write goes through `modify`, which applies a mutation while
//! the backend holds its lock (memory) or transaction (SQLite). Toggle and
//! update are therefore atomic per record.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use todo_core::{Priority, Todo};

use crate::config::{StoreBackend, StoreConfig};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A change applied to one stored record.
///
/// The store restores `id` and `created_at` afterwards and stamps
/// `updated_at`, so a mutation cannot touch them.
pub type Mutation = Box<dyn FnOnce(&mut Todo) + Send>;

/// Fields of a record that does not exist yet. New records are always
/// incomplete; the store assigns `id` and both timestamps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
}

/// Selection for `TodoStore::query`. Results are always ordered by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoQuery {
    All,
    Completed(bool),
    /// Case-insensitive substring match on the title.
    TitleContains(String),
    Priority(Priority),
    /// Incomplete records whose due date is set and not after the instant.
    DueBy(DateTime<Utc>),
}

impl TodoQuery {
    pub fn matches(&self, todo: &Todo) -> bool {
        match self {
            TodoQuery::All => true,
            TodoQuery::Completed(completed) => todo.completed == *completed,
            TodoQuery::TitleContains(needle) => todo.title.to_lowercase().contains(&needle.to_lowercase()),
            TodoQuery::Priority(priority) => todo.priority == *priority,
            TodoQuery::DueBy(threshold) => {
                !todo.completed && todo.due_date.is_some_and(|due| due <= *threshold)
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to prepare database directory {}: {source}", .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait TodoStore: Send + Sync {
    async fn insert(&self, todo: NewTodo) -> Result<Todo, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<Todo>, StoreError>;

    /// Apply `mutation` to the record with `id` and persist it. Returns
    /// `None` without calling the mutation if the record does not exist.
    async fn modify(&self, id: i64, mutation: Mutation) -> Result<Option<Todo>, StoreError>;

    async fn query(&self, query: TodoQuery) -> Result<Vec<Todo>, StoreError>;

    /// Number of records, optionally restricted to one completion state.
    async fn count(&self, completed: Option<bool>) -> Result<u64, StoreError>;

    /// Returns whether a record was removed.
    async fn remove(&self, id: i64) -> Result<bool, StoreError>;

    /// Remove every record, or every record in one completion state.
    /// Returns the number removed.
    async fn remove_where(&self, completed: Option<bool>) -> Result<u64, StoreError>;
}

/// Open the backend named by the configuration.
pub fn open(config: &StoreConfig) -> Result<Arc<dyn TodoStore>, StoreError> {
    let store: Arc<dyn TodoStore> = match (config.backend, &config.path) {
        (StoreBackend::Memory, _) => Arc::new(MemoryStore::new()),
        (StoreBackend::Sqlite, Some(path)) => Arc::new(SqliteStore::open(path)?),
        (StoreBackend::Sqlite, None) => Arc::new(SqliteStore::open_in_memory()?),
    };
    Ok(store)
}
