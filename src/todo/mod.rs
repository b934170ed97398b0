//! The user's to-do list.

mod core;
mod endpoints;

pub use core::{Priority, Todo, TodoBuilder, create_todo_table, delete_todo, get_todos, save_todo, toggle_todo};
pub use endpoints::{
    TodoForm, delete_todo_endpoint, get_todos_endpoint, save_todo_endpoint,
    toggle_todo_endpoint,
};
