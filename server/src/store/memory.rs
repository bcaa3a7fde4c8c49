use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use todo_core::Todo;
use tokio::sync::RwLock;

use super::{Mutation, NewTodo, StoreError, TodoQuery, TodoStore};

/// Volatile store backed by an ordered map. Ids come from a counter that
/// never goes backwards, so removed ids are not handed out again.
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, Todo>,
    last_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn insert(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let now = Utc::now();
        let todo = Todo {
            id: table.last_id,
            title: todo.title,
            description: todo.description,
            completed: false,
            priority: todo.priority,
            due_date: todo.due_date,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(todo.id, todo.clone());
        Ok(todo)
    }

    async fn find(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn modify(&self, id: i64, mutation: Mutation) -> Result<Option<Todo>, StoreError> {
        let mut table = self.table.write().await;
        let Some(todo) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        let created_at = todo.created_at;
        mutation(&mut *todo);
        todo.id = id;
        todo.created_at = created_at;
        todo.updated_at = Utc::now();
        Ok(Some(todo.clone()))
    }

    async fn query(&self, query: TodoQuery) -> Result<Vec<Todo>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.values().filter(|todo| query.matches(todo)).cloned().collect())
    }

    async fn count(&self, completed: Option<bool>) -> Result<u64, StoreError> {
        let table = self.table.read().await;
        let count = match completed {
            None => table.rows.len(),
            Some(completed) => table.rows.values().filter(|todo| todo.completed == completed).count(),
        };
        Ok(count as u64)
    }

    async fn remove(&self, id: i64) -> Result<bool, StoreError> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }

    async fn remove_where(&self, completed: Option<bool>) -> Result<u64, StoreError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        match completed {
            None => table.rows.clear(),
            Some(completed) => table.rows.retain(|_, todo| todo.completed != completed),
        }
        Ok((before - table.rows.len()) as u64)
    }
}
