use async_trait::async_trait;
use super::todo::{CreateTodo, Todo, TodoId, UpdateTodo};

#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    /// Creates the schema if it does not exist yet.
    async fn init(&self) -> anyhow::Result<()>;
    /// Drops all stored todos along with the schema, then recreates it.
    async fn reset(&self) -> anyhow::Result<()>;
    async fn create(&self, input: CreateTodo) -> anyhow::Result<Todo>;
    async fn get(&self, id: TodoId) -> anyhow::Result<Option<Todo>>;
    /// Newest first.
    async fn list(&self) -> anyhow::Result<Vec<Todo>>;
    async fn update(&self, id: TodoId, input: UpdateTodo) -> anyhow::Result<Option<Todo>>;
    async fn toggle(&self, id: TodoId) -> anyhow::Result<Option<Todo>>;
    async fn delete(&self, id: TodoId) -> anyhow::Result<bool>;
}
