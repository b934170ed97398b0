//! Application router configuration.

use axum::{
    Router, middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
};

use crate::{
    AppState, Error,
    account::{delete_account_endpoint, get_accounts_endpoint, save_account_endpoint},
    dashboard::{get_dashboard_page, get_dashboard_summary_endpoint},
    endpoints,
    export::export_transactions_endpoint,
    goal::{delete_goal_endpoint, get_goals_endpoint, save_goal_endpoint},
    logging::logging_middleware,
    todo::{delete_todo_endpoint, get_todos_endpoint, save_todo_endpoint, toggle_todo_endpoint},
    transaction::{
        delete_transaction_endpoint, get_transaction_endpoint, get_transactions_endpoint,
        get_transactions_page, save_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let view_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page));

    let api_routes = Router::new()
        .route(endpoints::DASHBOARD_API, get(get_dashboard_summary_endpoint))
        .route(
            endpoints::TRANSACTIONS_API,
            get(get_transactions_endpoint).post(save_transaction_endpoint),
        )
        .route(endpoints::EXPORT_API, get(export_transactions_endpoint))
        .route(
            endpoints::TRANSACTION_API,
            get(get_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(
            endpoints::TODOS_API,
            get(get_todos_endpoint).post(save_todo_endpoint),
        )
        .route(endpoints::TOGGLE_TODO_API, post(toggle_todo_endpoint))
        .route(endpoints::TODO_API, delete(delete_todo_endpoint))
        .route(
            endpoints::GOALS_API,
            get(get_goals_endpoint).post(save_goal_endpoint),
        )
        .route(endpoints::GOAL_API, delete(delete_goal_endpoint))
        .route(
            endpoints::ACCOUNTS_API,
            get(get_accounts_endpoint).post(save_account_endpoint),
        )
        .route(endpoints::ACCOUNT_API, delete(delete_account_endpoint));

    view_routes
        .merge(api_routes)
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
