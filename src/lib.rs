//! Budget Board is a web app for tracking personal income, expenses,
//! subscriptions and savings goals.
//!
//! This library provides a dashboard that aggregates a user's transactions in
//! their chosen display currency, a small JSON API for storing the user's
//! data, and a CSV export of their transactions.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod account;
mod app_state;
mod category;
mod currency;
mod dashboard;
mod database_id;
mod dates;
mod db;
mod endpoints;
mod export;
mod goal;
mod html;
mod logging;
mod routing;
mod seed;
mod settings;
mod snapshot;
mod timezone;
mod todo;
mod transaction;
mod upcoming;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use currency::{CurrencyCode, ExchangeRates};
pub use database_id::UserId;
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use seed::{SeedData, SeedSummary, load_seed_file, seed_database};
pub use settings::Settings;

use crate::html::error_view;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// There is no exchange rate for converting between the two currencies.
    ///
    /// Conversions never fall back to a rate of one, since that would
    /// silently report amounts in the wrong currency.
    #[error("no exchange rate from {from} to {to}")]
    MissingExchangeRate {
        /// The currency the amount is stored in.
        from: CurrencyCode,
        /// The currency the amount was to be displayed in.
        to: CurrencyCode,
    },

    /// The currency code is not one of the supported currencies.
    #[error("unsupported currency \"{0}\"")]
    UnknownCurrency(String),

    /// An amount of zero or less, or a non-finite amount, was given for a record
    /// that requires a positive amount.
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    NonPositiveAmount(f64),

    /// A goal amount was negative or not a number.
    #[error("{0} is not a valid goal amount, goal amounts cannot be negative")]
    InvalidGoalAmount(f64),

    /// The category is not one of the fixed income or expense categories.
    #[error("\"{0}\" is not a known category")]
    UnknownCategory(String),

    /// A required text field was empty.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// A date string could not be parsed.
    #[error("\"{0}\" is not a valid date")]
    InvalidDate(String),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a to-do item that does not exist
    #[error("tried to update a to-do item that is not in the database")]
    UpdateMissingTodo,

    /// Tried to delete a to-do item that does not exist
    #[error("tried to delete a to-do item that is not in the database")]
    DeleteMissingTodo,

    /// Tried to update a goal that does not exist
    #[error("tried to update a goal that is not in the database")]
    UpdateMissingGoal,

    /// Tried to delete a goal that does not exist
    #[error("tried to delete a goal that is not in the database")]
    DeleteMissingGoal,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// A fetch completed after a newer fetch for the same collection had
    /// started, so its result was discarded.
    #[error("discarded a stale response for {0}")]
    StaleResponse(&'static str),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// The transactions could not be written as CSV.
    #[error("could not write the CSV report: {0}")]
    CsvError(String),

    /// An error occurred while serializing or deserializing JSON.
    #[error("could not read or write JSON: {0}")]
    JSONSerializationError(String),

    /// A settings or seed file could not be read.
    #[error("could not read the file {path}: {reason}")]
    FileError {
        /// The path of the file.
        path: String,
        /// Why the file could not be read.
        reason: String,
    },
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::JSONSerializationError(value.to_string())
    }
}

impl Error {
    /// The HTTP status code that best describes the error to a client.
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NonPositiveAmount(_)
            | Error::InvalidGoalAmount(_)
            | Error::UnknownCategory(_)
            | Error::EmptyField(_)
            | Error::InvalidDate(_)
            | Error::UnknownCurrency(_)
            | Error::JSONSerializationError(_) => StatusCode::BAD_REQUEST,
            Error::MissingExchangeRate { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingTodo
            | Error::DeleteMissingTodo
            | Error::UpdateMissingGoal
            | Error::DeleteMissingGoal
            | Error::UpdateMissingAccount
            | Error::DeleteMissingAccount => StatusCode::NOT_FOUND,
            Error::StaleResponse(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Convert the error into a JSON response for the API routes.
    ///
    /// Errors that are not the client's fault are logged and replaced with a
    /// generic message.
    pub(crate) fn into_json_response(self) -> Response {
        let status = self.status_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("An unexpected error occurred: {}", self);
            "An unexpected error occurred, check the server logs for more details.".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Wraps an [Error] so that API route handlers can use `?` and still respond
/// with JSON instead of an HTML error page.
#[derive(Debug, PartialEq)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.0.into_json_response()
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let page = match self {
            Error::MissingExchangeRate { from, to } => error_view(
                "Currency Unavailable",
                "422",
                "Cannot convert your amounts",
                &format!(
                    "There is no exchange rate from {from} to {to}. \
                    Pick another display currency or add the rate to your settings file."
                ),
            ),
            Error::UnknownCurrency(code) => error_view(
                "Unknown Currency",
                "400",
                "Unknown currency",
                &format!("\"{code}\" is not a supported currency code."),
            ),
            Error::InvalidTimezoneError(timezone) => error_view(
                "Invalid Timezone Settings",
                "500",
                "Invalid Timezone Settings",
                &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            ),
            Error::NotFound => error_view(
                "Not Found",
                "404",
                "Something's missing.",
                "Sorry, we can't find that page.",
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                error_view(
                    "Internal Server Error",
                    "500",
                    "Sorry, something went wrong.",
                    "Try again later or check the server logs",
                )
            }
        };

        (status, page).into_response()
    }
}
