use std::{str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use sqlx::{
    Pool, Row, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
};

use crate::domain::{
    repository::TodoRepository,
    todo::{CreateTodo, DUE_DATE_FORMAT, Todo, TodoId, UpdateTodo},
};

const COLUMNS: &str = "id, title, completed, due_date, priority, category, created_at";

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid database url {database_url}"))?
            .create_if_missing(true);
        // Every connection to an in-memory database gets its own empty database,
        // so keep exactly one alive for the lifetime of the pool.
        let pool_options = if is_memory_url(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;
        Ok(Self { pool: Arc::new(pool) })
    }

    /// Waits for checked-out connections to return, then closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                due_date TEXT,
                priority TEXT NOT NULL DEFAULT 'medium',
                category TEXT NOT NULL DEFAULT 'other',
                created_at TEXT NOT NULL
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn reset(&self) -> Result<()> {
        sqlx::query("DROP TABLE IF EXISTS todos").execute(&*self.pool).await?;
        self.init().await
    }

    async fn create(&self, input: CreateTodo) -> Result<Todo> {
        let created_at = format_timestamp(Utc::now());
        let result = sqlx::query(
            "INSERT INTO todos (title, completed, due_date, priority, category, created_at)
             VALUES (?1, 0, ?2, ?3, ?4, ?5)",
        )
        .bind(&input.title)
        .bind(input.due_date.map(format_date))
        .bind(&input.priority)
        .bind(&input.category)
        .bind(&created_at)
        .execute(&*self.pool)
        .await?;
        Ok(Todo {
            id: TodoId(result.last_insert_rowid()),
            title: input.title,
            completed: false,
            due_date: input.due_date,
            priority: input.priority,
            category: input.category,
            created_at: parse_timestamp(&created_at)?,
        })
    }

    async fn get(&self, id: TodoId) -> Result<Option<Todo>> {
        let row = sqlx::query(&format!("SELECT {COLUMNS} FROM todos WHERE id = ?1"))
            .bind(id.0)
            .fetch_optional(&*self.pool)
            .await?;
        row.map(row_to_todo).transpose()
    }

    async fn list(&self) -> Result<Vec<Todo>> {
        let rows = sqlx::query(&format!("SELECT {COLUMNS} FROM todos ORDER BY created_at DESC, id DESC"))
            .fetch_all(&*self.pool)
            .await?;
        rows.into_iter().map(row_to_todo).collect()
    }

    async fn update(&self, id: TodoId, input: UpdateTodo) -> Result<Option<Todo>> {
        let Some(mut todo) = self.get(id).await? else { return Ok(None) };
        input.apply(&mut todo);

        sqlx::query(
            "UPDATE todos SET title = ?2, completed = ?3, due_date = ?4, priority = ?5, category = ?6
             WHERE id = ?1",
        )
        .bind(todo.id.0)
        .bind(&todo.title)
        .bind(todo.completed)
        .bind(todo.due_date.map(format_date))
        .bind(&todo.priority)
        .bind(&todo.category)
        .execute(&*self.pool)
        .await?;

        Ok(Some(todo))
    }

    async fn toggle(&self, id: TodoId) -> Result<Option<Todo>> {
        let row = sqlx::query(&format!(
            "UPDATE todos SET completed = NOT completed WHERE id = ?1 RETURNING {COLUMNS}"
        ))
        .bind(id.0)
        .fetch_optional(&*self.pool)
        .await?;
        row.map(row_to_todo).transpose()
    }

    async fn delete(&self, id: TodoId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id.0)
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_todo(row: SqliteRow) -> Result<Todo> {
    let due_date: Option<String> = row.try_get("due_date")?;
    let created_at: String = row.try_get("created_at")?;

    Ok(Todo {
        id: TodoId(row.try_get("id")?),
        title: row.try_get("title")?,
        completed: row.try_get("completed")?,
        due_date: due_date
            .map(|d| NaiveDate::parse_from_str(&d, DUE_DATE_FORMAT).with_context(|| format!("stored due_date {d:?}")))
            .transpose()?,
        priority: row.try_get("priority")?,
        category: row.try_get("category")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DUE_DATE_FORMAT).to_string()
}

// Fixed-width so that `ORDER BY created_at` on the text column is chronological.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("stored created_at {raw:?}"))?
        .with_timezone(&Utc))
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn repo() -> SqliteTodoRepository {
        let repo = SqliteTodoRepository::connect("sqlite::memory:").await.unwrap();
        repo.init().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let repo = repo().await;
        let a = repo.create(CreateTodo::new("a")).await.unwrap();
        let b = repo.create(CreateTodo::new("b")).await.unwrap();
        assert!(repo.delete(b.id).await.unwrap());
        let c = repo.create(CreateTodo::new("c")).await.unwrap();
        assert!(c.id.0 > b.id.0);
        assert!(b.id.0 > a.id.0);
    }

    #[tokio::test]
    async fn round_trips_through_rows() {
        let repo = repo().await;
        let input = CreateTodo {
            title: "Buy milk".into(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 15),
            priority: "high".into(),
            category: "errands".into(),
        };
        let created = repo.create(input).await.unwrap();
        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn toggle_flips_and_misses_unknown_ids() {
        let repo = repo().await;
        let created = repo.create(CreateTodo::new("x")).await.unwrap();
        assert!(repo.toggle(created.id).await.unwrap().unwrap().completed);
        assert!(!repo.toggle(created.id).await.unwrap().unwrap().completed);
        assert!(repo.toggle(TodoId(999)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn init_is_idempotent_and_reset_clears() {
        let repo = repo().await;
        repo.create(CreateTodo::new("kept")).await.unwrap();
        repo.init().await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);
        repo.reset().await.unwrap();
        assert!(repo.list().await.unwrap().is_empty());
    }
}
