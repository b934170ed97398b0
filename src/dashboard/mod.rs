//! Dashboard module
//!
//! Provides an overview page and a JSON summary of the user's totals, budget,
//! goals and upcoming items, all shown in the chosen display currency.

mod aggregation;
mod handlers;
mod tables;

pub use handlers::{get_dashboard_page, get_dashboard_summary_endpoint};
