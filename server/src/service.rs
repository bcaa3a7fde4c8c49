//! Business rules for todos on top of a `TodoStore`.
//!
//! Missing records are reported as `None` or `false`, never as errors.
//! The only error is a storage failure. Input is validated by the API
//! layer before it gets here.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use todo_core::{CreateTodo, Priority, Todo, UpdateTodo};
use tracing::{debug, info};

use crate::store::{NewTodo, StoreError, TodoQuery, TodoStore};

#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    /// All todos, or only those in the given completion state.
    pub async fn list(&self, completed: Option<bool>) -> Result<Vec<Todo>, StoreError> {
        let query = completed.map_or(TodoQuery::All, TodoQuery::Completed);
        debug!(?query, "listing todos");
        self.store.query(query).await
    }

    pub async fn get(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        self.store.find(id).await
    }

    /// New todos start incomplete; priority defaults to low.
    pub async fn create(&self, input: CreateTodo) -> Result<Todo, StoreError> {
        let todo = self
            .store
            .insert(NewTodo {
                title: input.title,
                description: input.description,
                priority: input.priority.unwrap_or_default(),
                due_date: input.due_date,
            })
            .await?;
        info!(id = todo.id, "created todo");
        Ok(todo)
    }

    /// Replace a todo's fields.
    ///
    /// `title`, `description` and `due_date` are always overwritten, so an
    /// omitted or null description or due date clears the stored value.
    /// `completed` and `priority` keep their stored value unless a value
    /// is supplied.
    pub async fn update(&self, id: i64, input: UpdateTodo) -> Result<Option<Todo>, StoreError> {
        let UpdateTodo {
            title,
            description,
            completed,
            priority,
            due_date,
        } = input;
        let updated = self
            .store
            .modify(
                id,
                Box::new(move |todo: &mut Todo| {
                    todo.title = title;
                    todo.description = description.into_value();
                    todo.due_date = due_date.into_value();
                    if let Some(completed) = completed.into_value() {
                        todo.completed = completed;
                    }
                    if let Some(priority) = priority.into_value() {
                        todo.priority = priority;
                    }
                }),
            )
            .await?;
        if updated.is_some() {
            info!(id, "updated todo");
        }
        Ok(updated)
    }

    pub async fn toggle(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        let toggled = self
            .store
            .modify(id, Box::new(|todo: &mut Todo| todo.completed = !todo.completed))
            .await?;
        if let Some(todo) = &toggled {
            info!(id, completed = todo.completed, "toggled todo");
        }
        Ok(toggled)
    }

    /// Returns whether a todo with `id` existed and was removed.
    pub async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let removed = self.store.remove(id).await?;
        if removed {
            info!(id, "deleted todo");
        }
        Ok(removed)
    }

    /// Remove every completed todo and return how many there were.
    pub async fn delete_completed(&self) -> Result<u64, StoreError> {
        let removed = self.store.remove_where(Some(true)).await?;
        info!(removed, "deleted completed todos");
        Ok(removed)
    }

    pub async fn delete_all(&self) -> Result<u64, StoreError> {
        let removed = self.store.remove_where(None).await?;
        info!(removed, "deleted all todos");
        Ok(removed)
    }

    /// Todos whose title contains `needle`, ignoring case.
    pub async fn search_by_title(&self, needle: &str) -> Result<Vec<Todo>, StoreError> {
        debug!(needle, "searching todos");
        self.store.query(TodoQuery::TitleContains(needle.to_string())).await
    }

    pub async fn by_priority(&self, priority: Priority) -> Result<Vec<Todo>, StoreError> {
        self.store.query(TodoQuery::Priority(priority)).await
    }

    /// Incomplete todos due at or before `threshold`.
    pub async fn upcoming(&self, threshold: DateTime<Utc>) -> Result<Vec<Todo>, StoreError> {
        self.store.query(TodoQuery::DueBy(threshold)).await
    }

    pub async fn count(&self, completed: Option<bool>) -> Result<u64, StoreError> {
        self.store.count(completed).await
    }
}
