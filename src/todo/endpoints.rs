//! The JSON API for the to-do list.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    ApiError, AppState, Error,
    database_id::{TodoId, UserId},
    db::lock_connection,
    dates::parse_date,
    todo::{Priority, Todo, TodoBuilder, delete_todo, get_todos, save_todo, toggle_todo},
};

/// The state needed to manage to-do items.
#[derive(Debug, Clone)]
pub struct TodoState {
    db_connection: Arc<Mutex<Connection>>,
    user_id: UserId,
}

impl FromRef<AppState> for TodoState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id,
        }
    }
}

/// The JSON body for saving a to-do item. Leave out `id` to create a new item.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoForm {
    #[serde(default)]
    pub id: Option<TodoId>,
    pub task: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl TodoForm {
    /// # Errors
    /// Returns [Error::InvalidDate] for an unreadable due date or
    /// [Error::EmptyField] for an empty task.
    pub fn into_builder(self) -> Result<TodoBuilder, Error> {
        let due_date = match self.due_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(parse_date(text).ok_or_else(|| Error::InvalidDate(text.to_owned()))?),
        };

        let builder = Todo::build(&self.task, self.priority, due_date)
            .id(self.id)
            .completed(self.completed);
        builder.validate()?;

        Ok(builder)
    }
}

pub async fn get_todos_endpoint(State(state): State<TodoState>) -> Result<Json<Vec<Todo>>, ApiError> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(Json(get_todos(state.user_id, &connection)?))
}

/// Save a to-do item, responds with `201 Created` for new items and `200 OK` for updates.
pub async fn save_todo_endpoint(
    State(state): State<TodoState>,
    payload: Result<Json<TodoForm>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(form) =
        payload.map_err(|rejection| Error::JSONSerializationError(rejection.body_text()))?;
    let builder = form.into_builder()?;
    let status = match builder.id {
        Some(_) => StatusCode::OK,
        None => StatusCode::CREATED,
    };

    let connection = lock_connection(&state.db_connection)?;
    let todo = save_todo(builder, state.user_id, &connection)?;

    Ok((status, Json(todo)).into_response())
}

pub async fn toggle_todo_endpoint(
    State(state): State<TodoState>,
    Path(todo_id): Path<TodoId>,
) -> Result<Json<Todo>, ApiError> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(Json(toggle_todo(todo_id, state.user_id, &connection)?))
}

pub async fn delete_todo_endpoint(
    State(state): State<TodoState>,
    Path(todo_id): Path<TodoId>,
) -> Result<StatusCode, ApiError> {
    let connection = lock_connection(&state.db_connection)?;

    delete_todo(todo_id, state.user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not delete to-do item {todo_id}: {error}"))?;

    Ok(StatusCode::NO_CONTENT)
}
