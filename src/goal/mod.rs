//! Goal settings and the JSON API for managing them.

mod core;
mod endpoints;

pub use core::{
    GoalBuilder, GoalKind, GoalSetting, GoalStatus, create_goal_table, delete_goal, get_goals,
    save_goal,
};
pub use endpoints::{GoalForm, delete_goal_endpoint, get_goals_endpoint, save_goal_endpoint};
