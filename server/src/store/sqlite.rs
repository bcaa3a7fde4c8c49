//! SQLite-backed todo store.
//!
//! Timestamps are stored as INTEGER microseconds since the Unix epoch, so
//! every `DateTime<Utc>` round-trips and SQL compares them numerically.
//! Title search goes through `fold_case`, a Unicode lowercase function
//! registered on the connection.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use todo_core::{Priority, Todo};
use tokio::sync::Mutex;
use tracing::debug;

use super::{Mutation, NewTodo, StoreError, TodoQuery, TodoStore};

const SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT,
        completed INTEGER NOT NULL DEFAULT 0,
        priority INTEGER NOT NULL DEFAULT 0,
        due_date INTEGER,
        created_at INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_todos_completed
    ON todos(completed);

    CREATE INDEX IF NOT EXISTS idx_todos_priority
    ON todos(priority);
";

const COLUMNS: &str = "id, title, description, completed, priority, due_date, created_at, updated_at";

/// Persistent store over a single SQLite connection.
///
/// `AUTOINCREMENT` keeps ids from being reused after deletes.
pub struct SqliteStore {
    db: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let db = Connection::open(path)?;
        db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        debug!(path = %path.display(), "opened sqlite store");
        Self::initialize(db)
    }

    /// Open a private in-memory database. Contents vanish with the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(db: Connection) -> Result<Self, StoreError> {
        db.create_scalar_function(
            "fold_case",
            1,
            FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
            |ctx| Ok(ctx.get::<String>(0)?.to_lowercase()),
        )?;
        db.execute_batch(SCHEMA)?;
        Ok(Self { db: Mutex::new(db) })
    }
}

fn encode_time(time: &DateTime<Utc>) -> i64 {
    time.timestamp_micros()
}

fn decode_time(index: usize, raw: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_micros(raw).ok_or(rusqlite::Error::IntegralValueOutOfRange(index, raw))
}

fn row_to_todo(row: &Row<'_>) -> rusqlite::Result<Todo> {
    let priority: i64 = row.get(4)?;
    let due_date: Option<i64> = row.get(5)?;
    let created_at: i64 = row.get(6)?;
    let updated_at: i64 = row.get(7)?;
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        completed: row.get(3)?,
        priority: Priority::try_from(priority)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Integer, Box::new(e)))?,
        due_date: due_date.map(|raw| decode_time(5, raw)).transpose()?,
        created_at: decode_time(6, created_at)?,
        updated_at: decode_time(7, updated_at)?,
    })
}

fn select_one(db: &Connection, id: i64) -> rusqlite::Result<Option<Todo>> {
    db.query_row(&format!("SELECT {COLUMNS} FROM todos WHERE id = ?1"), [id], row_to_todo)
        .optional()
}

/// `WHERE` clause and its parameters for a query.
fn filter_clause(query: &TodoQuery) -> (&'static str, Vec<Value>) {
    match query {
        TodoQuery::All => ("", Vec::new()),
        TodoQuery::Completed(completed) => ("WHERE completed = ?1", vec![Value::Integer(i64::from(*completed))]),
        TodoQuery::TitleContains(needle) => (
            "WHERE instr(fold_case(title), fold_case(?1)) > 0",
            vec![Value::Text(needle.clone())],
        ),
        TodoQuery::Priority(priority) => ("WHERE priority = ?1", vec![Value::Integer(i64::from(*priority))]),
        TodoQuery::DueBy(threshold) => (
            "WHERE completed = 0 AND due_date IS NOT NULL AND due_date <= ?1",
            vec![Value::Integer(encode_time(threshold))],
        ),
    }
}

#[async_trait]
impl TodoStore for SqliteStore {
    async fn insert(&self, todo: NewTodo) -> Result<Todo, StoreError> {
        let db = self.db.lock().await;
        let now = encode_time(&Utc::now());
        db.execute(
            "INSERT INTO todos (title, description, completed, priority, due_date, created_at, updated_at)
             VALUES (?1, ?2, 0, ?3, ?4, ?5, ?5)",
            params![
                todo.title,
                todo.description,
                i64::from(todo.priority),
                todo.due_date.as_ref().map(encode_time),
                now,
            ],
        )?;
        let id = db.last_insert_rowid();
        let stored = select_one(&db, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        Ok(stored)
    }

    async fn find(&self, id: i64) -> Result<Option<Todo>, StoreError> {
        let db = self.db.lock().await;
        Ok(select_one(&db, id)?)
    }

    async fn modify(&self, id: i64, mutation: Mutation) -> Result<Option<Todo>, StoreError> {
        let mut db = self.db.lock().await;
        let tx = db.transaction()?;
        let Some(mut todo) = select_one(&tx, id)? else {
            return Ok(None);
        };
        mutation(&mut todo);
        tx.execute(
            "UPDATE todos
             SET title = ?1, description = ?2, completed = ?3, priority = ?4, due_date = ?5, updated_at = ?6
             WHERE id = ?7",
            params![
                todo.title,
                todo.description,
                todo.completed,
                i64::from(todo.priority),
                todo.due_date.as_ref().map(encode_time),
                encode_time(&Utc::now()),
                id,
            ],
        )?;
        let stored = select_one(&tx, id)?;
        tx.commit()?;
        Ok(stored)
    }

    async fn query(&self, query: TodoQuery) -> Result<Vec<Todo>, StoreError> {
        let db = self.db.lock().await;
        let (clause, values) = filter_clause(&query);
        let mut stmt = db.prepare(&format!("SELECT {COLUMNS} FROM todos {clause} ORDER BY id"))?;
        let todos = stmt
            .query_map(params_from_iter(values.iter()), row_to_todo)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(todos)
    }

    async fn count(&self, completed: Option<bool>) -> Result<u64, StoreError> {
        let db = self.db.lock().await;
        let count: i64 = match completed {
            None => db.query_row("SELECT COUNT(*) FROM todos", [], |row| row.get(0))?,
            Some(completed) => db.query_row(
                "SELECT COUNT(*) FROM todos WHERE completed = ?1",
                [completed],
                |row| row.get(0),
            )?,
        };
        Ok(count as u64)
    }

    async fn remove(&self, id: i64) -> Result<bool, StoreError> {
        let db = self.db.lock().await;
        Ok(db.execute("DELETE FROM todos WHERE id = ?1", [id])? > 0)
    }

    async fn remove_where(&self, completed: Option<bool>) -> Result<u64, StoreError> {
        let db = self.db.lock().await;
        let removed = match completed {
            None => db.execute("DELETE FROM todos", [])?,
            Some(completed) => db.execute("DELETE FROM todos WHERE completed = ?1", [completed])?,
        };
        Ok(removed as u64)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn new_todo(title: &str) -> NewTodo {
        NewTodo {
            title: title.to_string(),
            description: Some("details".to_string()),
            priority: Priority::Medium,
            due_date: None,
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[tokio::test]
    async fn insert_then_find_returns_stored_row() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = store.insert(new_todo("Buy milk")).await.unwrap();
        assert_eq!(created.id, 1);
        assert!(!created.completed);
        assert_eq!(created.priority, Priority::Medium);
        assert_eq!(created.created_at, created.updated_at);
        let found = store.find(created.id).await.unwrap();
        assert_eq!(found, Some(created));
    }

    #[tokio::test]
    async fn autoincrement_never_reuses_ids() {
        let store = SqliteStore::open_in_memory().unwrap();
        let first = store.insert(new_todo("a")).await.unwrap();
        let second = store.insert(new_todo("b")).await.unwrap();
        assert!(store.remove(second.id).await.unwrap());
        let third = store.insert(new_todo("c")).await.unwrap();
        assert!(third.id > second.id);
        assert!(first.id < second.id);
    }

    #[tokio::test]
    async fn modify_persists_mutation() {
        let store = SqliteStore::open_in_memory().unwrap();
        let created = store.insert(new_todo("a")).await.unwrap();
        let due = at("2030-01-01T09:00:00Z");
        let modified = store
            .modify(
                created.id,
                Box::new(move |todo: &mut Todo| {
                    todo.completed = true;
                    todo.due_date = Some(due);
                    todo.description = None;
                }),
            )
            .await
            .unwrap()
            .unwrap();
        assert!(modified.completed);
        assert_eq!(modified.due_date, Some(due));
        assert!(modified.description.is_none());
        assert_eq!(store.find(created.id).await.unwrap(), Some(modified));
    }

    #[tokio::test]
    async fn modify_missing_row_returns_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = store.modify(42, Box::new(|todo: &mut Todo| todo.completed = true)).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn title_search_is_case_insensitive() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(new_todo("TEST case")).await.unwrap();
        store.insert(new_todo("unrelated")).await.unwrap();
        let found = store.query(TodoQuery::TitleContains("test".to_string())).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "TEST case");
    }

    #[tokio::test]
    async fn title_search_folds_non_ascii_case() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert(new_todo("ÉTÉ plans")).await.unwrap();
        store.insert(new_todo("winter")).await.unwrap();
        let found = store.query(TodoQuery::TitleContains("été".to_string())).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "ÉTÉ plans");
        let found = store.query(TodoQuery::TitleContains("PLANS".to_string())).await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn due_dates_outside_four_digit_years_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let new_year = |year| NaiveDate::from_ymd_opt(year, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap().and_utc();
        let far = new_year(10000);
        let ancient = new_year(-1);
        let normal = at("2024-06-01T00:00:00Z");
        for (title, due) in [("far", far), ("ancient", ancient), ("normal", normal)] {
            let mut todo = new_todo(title);
            todo.due_date = Some(due);
            let created = store.insert(todo).await.unwrap();
            assert_eq!(created.due_date, Some(due));
        }

        let all = store.query(TodoQuery::All).await.unwrap();
        assert_eq!(all.len(), 3);

        let found = store.query(TodoQuery::DueBy(normal)).await.unwrap();
        let titles: Vec<_> = found.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["ancient", "normal"]);
    }

    #[tokio::test]
    async fn due_by_filters_in_sql() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (title, due) in [
            ("soon", Some("2024-06-01T00:00:00Z")),
            ("later", Some("2024-07-01T00:00:00Z")),
            ("never", None),
        ] {
            let mut todo = new_todo(title);
            todo.due_date = due.map(at);
            store.insert(todo).await.unwrap();
        }
        let done = store.insert(new_todo("done")).await.unwrap();
        store
            .modify(
                done.id,
                Box::new(|todo: &mut Todo| {
                    todo.completed = true;
                    todo.due_date = Some(at("2024-01-01T00:00:00Z"));
                }),
            )
            .await
            .unwrap();

        let found = store.query(TodoQuery::DueBy(at("2024-06-01T00:00:00Z"))).await.unwrap();
        let titles: Vec<_> = found.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["soon"]);
    }

    #[tokio::test]
    async fn count_and_remove_where_by_completion() {
        let store = SqliteStore::open_in_memory().unwrap();
        for title in ["a", "b", "c"] {
            store.insert(new_todo(title)).await.unwrap();
        }
        store.modify(1, Box::new(|todo: &mut Todo| todo.completed = true)).await.unwrap();
        assert_eq!(store.count(Some(true)).await.unwrap(), 1);
        assert_eq!(store.count(Some(false)).await.unwrap(), 2);
        assert_eq!(store.remove_where(Some(true)).await.unwrap(), 1);
        assert_eq!(store.count(None).await.unwrap(), 2);
        assert_eq!(store.remove_where(None).await.unwrap(), 2);
        assert_eq!(store.query(TodoQuery::All).await.unwrap(), Vec::new());
    }

    #[tokio::test]
    async fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("todos.db");
        let created = {
            let store = SqliteStore::open(&path).unwrap();
            store.insert(new_todo("persisted")).await.unwrap()
        };
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.find(created.id).await.unwrap(), Some(created));
    }
}
