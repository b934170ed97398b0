//! The to-do item model and its database queries.

use std::str::FromStr;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    database_id::{TodoId, UserId},
    dates::{optional_date, parse_date},
};

// ===== MODELS =====

/// How urgent a to-do item is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl FromStr for Priority {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "High" => Ok(Priority::High),
            "Medium" => Ok(Priority::Medium),
            "Low" => Ok(Priority::Low),
            _ => Err(()),
        }
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|_| FromSqlError::InvalidType)
    }
}

/// A task on the user's to-do list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub task: String,
    pub priority: Priority,
    /// Items without a readable due date never show up as upcoming.
    #[serde(default, with = "optional_date")]
    pub due_date: Option<Date>,
    pub completed: bool,
}

/// The fields for inserting or updating a [Todo].
#[derive(Debug, Clone, PartialEq)]
pub struct TodoBuilder {
    /// The ID of the item to update, `None` to insert a new item.
    pub id: Option<TodoId>,
    pub task: String,
    pub priority: Priority,
    pub due_date: Option<Date>,
    pub completed: bool,
}

impl Todo {
    /// Start building a new, not yet completed to-do item.
    pub fn build(task: &str, priority: Priority, due_date: Option<Date>) -> TodoBuilder {
        TodoBuilder {
            id: None,
            task: task.to_owned(),
            priority,
            due_date,
            completed: false,
        }
    }
}

impl TodoBuilder {
    pub fn id(mut self, id: Option<TodoId>) -> Self {
        self.id = id;
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    /// # Errors
    /// Returns [Error::EmptyField] if the task is empty.
    pub fn validate(&self) -> Result<(), Error> {
        if self.task.trim().is_empty() {
            return Err(Error::EmptyField("task"));
        }

        Ok(())
    }
}

// ===== DATABASE FUNCTIONS =====

pub fn create_todo_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS todo (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            task TEXT NOT NULL,
            priority TEXT NOT NULL,
            due_date TEXT,
            completed INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_todo_user ON todo(user_id);",
    )
}

fn map_todo_row(row: &Row) -> Result<Todo, rusqlite::Error> {
    let due_date: Option<String> = row.get(3)?;

    Ok(Todo {
        id: row.get(0)?,
        task: row.get(1)?,
        priority: row.get(2)?,
        due_date: due_date.as_deref().and_then(parse_date),
        completed: row.get(4)?,
    })
}

/// Insert a new to-do item, or update the user's item when `builder` has an ID.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyField] if the task is empty,
/// - [Error::UpdateMissingTodo] if the ID does not refer to one of the user's items,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn save_todo(builder: TodoBuilder, user_id: UserId, connection: &Connection) -> Result<Todo, Error> {
    builder.validate()?;

    let due_date = builder.due_date.map(|date| date.to_string());

    match builder.id {
        None => connection
            .prepare(
                "INSERT INTO todo (user_id, task, priority, due_date, completed)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING id, task, priority, due_date, completed",
            )?
            .query_row(
                (user_id, builder.task.trim(), builder.priority, due_date, builder.completed),
                map_todo_row,
            )
            .map_err(Error::from),
        Some(id) => connection
            .prepare(
                "UPDATE todo SET task = ?1, priority = ?2, due_date = ?3, completed = ?4
                 WHERE id = ?5 AND user_id = ?6
                 RETURNING id, task, priority, due_date, completed",
            )?
            .query_row(
                (builder.task.trim(), builder.priority, due_date, builder.completed, id, user_id),
                map_todo_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTodo,
                error => error.into(),
            }),
    }
}

/// Get all of the user's to-do items, soonest due first.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_todos(user_id: UserId, connection: &Connection) -> Result<Vec<Todo>, Error> {
    connection
        .prepare(
            "SELECT id, task, priority, due_date, completed FROM todo
             WHERE user_id = :user_id
             ORDER BY due_date IS NULL, due_date ASC, id ASC",
        )?
        .query_map(&[(":user_id", &user_id)], map_todo_row)?
        .map(|maybe_todo| maybe_todo.map_err(Error::from))
        .collect()
}

/// Flip whether the user's to-do item is completed and return the updated item.
///
/// # Errors
/// Returns [Error::UpdateMissingTodo] if `id` does not refer to one of the user's items.
pub fn toggle_todo(id: TodoId, user_id: UserId, connection: &Connection) -> Result<Todo, Error> {
    connection
        .prepare(
            "UPDATE todo SET completed = NOT completed
             WHERE id = ?1 AND user_id = ?2
             RETURNING id, task, priority, due_date, completed",
        )?
        .query_row((id, user_id), map_todo_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTodo,
            error => error.into(),
        })
}

/// # Errors
/// Returns [Error::DeleteMissingTodo] if `id` does not refer to one of the user's items.
pub fn delete_todo(id: TodoId, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected =
        connection.execute("DELETE FROM todo WHERE id = ?1 AND user_id = ?2", (id, user_id))?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTodo);
    }

    Ok(())
}
