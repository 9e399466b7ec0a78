use crate::domain::repository::TodoRepository;
use crate::domain::todo::{Todo, TodoDraft, TodoId, UpdateTodo};
use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("todo {0} not found")]
    NotFound(TodoId),

    #[error("store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn create(&self, draft: TodoDraft) -> Result<Todo>;
    async fn get(&self, id: TodoId) -> Result<Todo>;
    async fn list(&self) -> Result<Vec<Todo>>;
    async fn update(&self, id: TodoId, input: UpdateTodo) -> Result<Todo>;
    async fn toggle(&self, id: TodoId) -> Result<Todo>;
    async fn delete(&self, id: TodoId) -> Result<()>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn create(&self, draft: TodoDraft) -> Result<Todo> {
        let input = draft.resolve().ok_or_else(|| ServiceError::Validation("Title is required".into()))?;
        Ok(self.repo.create(input).await?)
    }

    async fn get(&self, id: TodoId) -> Result<Todo> {
        self.repo.get(id).await?.ok_or(ServiceError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<Todo>> { Ok(self.repo.list().await?) }

    async fn update(&self, id: TodoId, input: UpdateTodo) -> Result<Todo> {
        self.repo.update(id, input).await?.ok_or(ServiceError::NotFound(id))
    }

    async fn toggle(&self, id: TodoId) -> Result<Todo> {
        self.repo.toggle(id).await?.ok_or(ServiceError::NotFound(id))
    }

    async fn delete(&self, id: TodoId) -> Result<()> {
        if self.repo.delete(id).await? { Ok(()) } else { Err(ServiceError::NotFound(id)) }
    }
}
