//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/api/todos/{todo_id}', use [format_endpoint].

use crate::currency::CurrencyCode;

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The dashboard page.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page listing the transactions of one category.
pub const TRANSACTIONS_VIEW: &str = "/transactions";

/// The dashboard figures as JSON.
pub const DASHBOARD_API: &str = "/api/dashboard";
/// The route to list and save transactions.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to access a single transaction.
pub const TRANSACTION_API: &str = "/api/transactions/{transaction_id}";
/// The route to download transactions as CSV.
pub const EXPORT_API: &str = "/api/transactions/export";
/// The route to list and save to-do items.
pub const TODOS_API: &str = "/api/todos";
/// The route to access a single to-do item.
pub const TODO_API: &str = "/api/todos/{todo_id}";
/// The route to mark a to-do item as done or not done.
pub const TOGGLE_TODO_API: &str = "/api/todos/{todo_id}/toggle";
/// The route to list and save goal settings.
pub const GOALS_API: &str = "/api/goals";
/// The route to access a single goal setting.
pub const GOAL_API: &str = "/api/goals/{goal_id}";
/// The route to list and save accounts.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to access a single account.
pub const ACCOUNT_API: &str = "/api/accounts/{account_id}";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/api/todos/{todo_id}', '{todo_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

/// The URL of the transactions page filtered to `category` and shown in `currency`.
pub fn category_transactions_url(category: &str, currency: CurrencyCode) -> String {
    match serde_urlencoded::to_string([("category", category), ("currency", currency.as_str())]) {
        Ok(query) => format!("{TRANSACTIONS_VIEW}?{query}"),
        Err(error) => {
            tracing::error!("Could not encode the query for category {category}: {error}");
            TRANSACTIONS_VIEW.to_owned()
        }
    }
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::{currency::CurrencyCode, endpoints};

    use super::{category_transactions_url, format_endpoint};

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_VIEW);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_VIEW);

        assert_endpoint_is_valid_uri(endpoints::DASHBOARD_API);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTIONS_API);
        assert_endpoint_is_valid_uri(endpoints::TRANSACTION_API);
        assert_endpoint_is_valid_uri(endpoints::EXPORT_API);
        assert_endpoint_is_valid_uri(endpoints::TODOS_API);
        assert_endpoint_is_valid_uri(endpoints::TODO_API);
        assert_endpoint_is_valid_uri(endpoints::TOGGLE_TODO_API);
        assert_endpoint_is_valid_uri(endpoints::GOALS_API);
        assert_endpoint_is_valid_uri(endpoints::GOAL_API);
        assert_endpoint_is_valid_uri(endpoints::ACCOUNTS_API);
        assert_endpoint_is_valid_uri(endpoints::ACCOUNT_API);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint(endpoints::TOGGLE_TODO_API, 7);

        assert_eq!(formatted_path, "/api/todos/7/toggle");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn category_url_is_encoded() {
        let url = category_transactions_url("Bills & Utilities", CurrencyCode::GBP);

        assert_eq!(url, "/transactions?category=Bills+%26+Utilities&currency=GBP");
        assert!(url.parse::<Uri>().is_ok());
    }
}
