use axum::extract::{Path, State, rejection::JsonRejection};
use axum::{Json, Router, routing::{get, patch, put}};
use axum::http::StatusCode;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::application::todo_service::TodoService;
use crate::domain::todo::{DueDateInput, Todo, TodoDraft, TodoId, UpdateTodo};
use crate::http::types::{ApiError, Message, TodoMessage};

#[derive(Clone)]
pub struct AppState<S: TodoService> { pub service: S }

pub fn router<S: TodoService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/todos", get(list_todos::<S>).post(create_todo::<S>))
        .route("/todos/:id", put(update_todo::<S>).delete(delete_todo::<S>))
        .route("/todos/:id/toggle", patch(toggle_todo::<S>))
        .with_state(state)
}

#[derive(Deserialize)]
struct CreateBody {
    title: Option<String>,
    due_date: Option<Value>,
    priority: Option<String>,
    category: Option<String>,
}

/// `due_date` is tri-state on update: absent, present-but-falsy, present.
#[derive(Deserialize)]
struct UpdateBody {
    title: Option<String>,
    completed: Option<bool>,
    priority: Option<String>,
    category: Option<String>,
    #[serde(default, deserialize_with = "present")]
    due_date: Option<Value>,
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

async fn list_todos<S: TodoService>(State(state): State<AppState<S>>) -> Result<Json<Vec<Todo>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

async fn create_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    payload: Result<Json<CreateBody>, JsonRejection>,
) -> Result<(StatusCode, Json<TodoMessage>), ApiError> {
    let Json(body) = payload?;
    let draft = TodoDraft {
        title: body.title,
        due_date: body.due_date.as_ref().map(DueDateInput::from_json).unwrap_or_default(),
        priority: body.priority,
        category: body.category,
    };
    let todo = state.service.create(draft).await?;
    Ok((StatusCode::CREATED, Json(TodoMessage { todo, message: "Todo created!".into() })))
}

async fn update_todo<S: TodoService>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<TodoMessage>, ApiError> {
    let id = parse_id(&id)?;
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            // Unknown ids win over malformed bodies.
            state.service.get(id).await?;
            return Err(rejection.into());
        }
    };
    let input = UpdateTodo {
        title: body.title,
        completed: body.completed,
        due_date: body.due_date.as_ref().and_then(|v| DueDateInput::from_json(v).on_update()),
        priority: body.priority,
        category: body.category,
    };
    let todo = state.service.update(id, input).await?;
    Ok(Json(TodoMessage { todo, message: "Todo updated!".into() }))
}

async fn delete_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<Message>, ApiError> {
    let id = parse_id(&id)?;
    state.service.delete(id).await?;
    Ok(Json(Message { message: "Todo deleted!" }))
}

async fn toggle_todo<S: TodoService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Json<TodoMessage>, ApiError> {
    let id = parse_id(&id)?;
    let todo = state.service.toggle(id).await?;
    let message = if todo.completed { "Todo completed!" } else { "Todo uncompleted!" };
    Ok(Json(TodoMessage { todo, message: message.into() }))
}

// Non-numeric ids cannot name a stored todo.
fn parse_id(s: &str) -> Result<TodoId, ApiError> { s.parse().map(TodoId).map_err(|_| ApiError::NotFound) }
