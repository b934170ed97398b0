//! The JSON API for listing, saving and deleting transactions.

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
    category::is_known_category,
    database_id::{TransactionId, UserId},
    db::lock_connection,
    dates::parse_date,
    snapshot::Snapshot,
    transaction::{
        Frequency, SubscriptionType, Transaction, TransactionBuilder, TransactionType,
        delete_transaction, get_transaction, get_transactions, save_transaction,
    },
};

/// The state needed to manage transactions.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The user whose transactions are managed.
    pub user_id: UserId,
    /// The last successfully fetched transactions.
    pub transactions: Snapshot<Transaction>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id,
            transactions: state.transactions.clone(),
        }
    }
}

/// The JSON body for saving a transaction.
///
/// Leave out `id` to create a new transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionForm {
    /// The ID of the transaction to update.
    #[serde(default)]
    pub id: Option<TransactionId>,
    /// The kind of transaction.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Where the money came from or went to.
    pub source: String,
    /// The category label.
    #[serde(default)]
    pub category: Option<String>,
    /// The amount, must be greater than zero.
    pub amount: f64,
    /// When the transaction happened.
    pub date: String,
    /// The account name.
    #[serde(default)]
    pub account: String,
    /// How often a subscription renews.
    #[serde(default)]
    pub frequency: Option<Frequency>,
    /// When a subscription is next due.
    #[serde(default)]
    pub next_payment: Option<String>,
    /// Whether a subscription renews.
    #[serde(default)]
    pub subscription_type: Option<SubscriptionType>,
}

impl TransactionForm {
    /// Check the form and turn it into a [TransactionBuilder].
    ///
    /// # Errors
    /// Returns [Error::InvalidDate] if a date cannot be read,
    /// [Error::UnknownCategory] if the category is not one of the fixed
    /// categories, or any error from [TransactionBuilder::validate].
    pub fn into_builder(self) -> Result<TransactionBuilder, Error> {
        let date = parse_date(&self.date).ok_or_else(|| Error::InvalidDate(self.date.clone()))?;

        let next_payment = match self.next_payment.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(text) => Some(parse_date(text).ok_or_else(|| Error::InvalidDate(text.to_owned()))?),
        };

        let mut builder = Transaction::build(self.kind, self.amount, Some(date), &self.source)
            .id(self.id)
            .account(&self.account);

        match self.category.as_deref().map(str::trim) {
            None | Some("") => {}
            Some(category) if is_known_category(category) => builder = builder.category(category),
            Some(category) => return Err(Error::UnknownCategory(category.to_owned())),
        }

        if let Some(subscription_type) = self.subscription_type {
            builder = builder.subscription(subscription_type, self.frequency, next_payment);
        } else {
            builder.frequency = self.frequency;
            builder.next_payment = next_payment;
        }

        builder.validate()?;

        Ok(builder)
    }
}

/// A route handler that lists the user's transactions as JSON, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let connection = lock_connection(&state.db_connection)?;

    let transactions = match state
        .transactions
        .refresh(|| get_transactions(state.user_id, &connection))
    {
        Ok(transactions) => transactions,
        Err(Error::StaleResponse(_)) => state.transactions.current(),
        Err(error) => return Err(error.into()),
    };

    Ok(Json(transactions.as_ref().clone()))
}

/// A route handler that responds with one of the user's transactions as JSON.
pub async fn get_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<Transaction>, ApiError> {
    let connection = lock_connection(&state.db_connection)?;

    let transaction = get_transaction(transaction_id, state.user_id, &connection)?;

    Ok(Json(transaction))
}

/// A route handler for saving a transaction.
///
/// Responds with `201 Created` for a new transaction and `200 OK` for an
/// update, with the saved transaction as the body.
pub async fn save_transaction_endpoint(
    State(state): State<TransactionState>,
    payload: Result<Json<TransactionForm>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(form) =
        payload.map_err(|rejection| Error::JSONSerializationError(rejection.body_text()))?;
    let builder = form.into_builder()?;
    let status = match builder.id {
        Some(_) => StatusCode::OK,
        None => StatusCode::CREATED,
    };

    let connection = lock_connection(&state.db_connection)?;
    let transaction = save_transaction(builder, state.user_id, &connection)?;

    state
        .transactions
        .refresh_or_current(|| get_transactions(state.user_id, &connection));

    Ok((status, Json(transaction)).into_response())
}

/// A route handler for deleting a transaction, responds with `204 No Content` on success.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode, ApiError> {
    let connection = lock_connection(&state.db_connection)?;

    delete_transaction(transaction_id, state.user_id, &connection).inspect_err(|error| {
        tracing::error!("Could not delete transaction {transaction_id}: {error}")
    })?;

    state
        .transactions
        .refresh_or_current(|| get_transactions(state.user_id, &connection));

    Ok(StatusCode::NO_CONTENT)
}


#[cfg(test)]
mod endpoint_tests {
    use axum::{Router, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        AppState, Settings, endpoints,
        transaction::{
            Transaction, delete_transaction_endpoint, get_transaction_endpoint,
            get_transactions_endpoint, save_transaction_endpoint,
        },
    };

    fn get_test_state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        AppState::new(conn, 1, "Etc/UTC", crate::CurrencyCode::USD, Settings::default()).unwrap()
    }

    fn get_test_server(state: AppState) -> TestServer {
        let app = Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                get(get_transactions_endpoint).post(save_transaction_endpoint),
            )
            .route(
                endpoints::TRANSACTION_API,
                get(get_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn unknown_category_is_bad_request() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({
                "type": "expense",
                "source": "Ticket",
                "category": "Lottery",
                "amount": 5,
                "date": "2025-01-01"
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], json!("\"Lottery\" is not a known category"));
        assert!(state.transactions.current().is_empty());
    }

    #[tokio::test]
    async fn creates_and_lists_transactions() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({
                "type": "income",
                "source": "Employer, Ltd",
                "category": "Salary",
                "amount": 1000,
                "date": "2025-10-05",
                "account": "HSBC Bank"
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let created: Transaction = response.json();
        assert_eq!(created.source, "Employer, Ltd");

        let listed: Vec<Transaction> = server.get(endpoints::TRANSACTIONS_API).await.json();
        assert_eq!(listed, vec![created.clone()]);
        assert_eq!(*state.transactions.current(), vec![created]);
    }

    #[tokio::test]
    async fn invalid_amount_is_bad_request() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({
                "type": "expense",
                "source": "Cafe",
                "amount": -3,
                "date": "2025-10-05"
            }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("greater than zero"));
    }

    #[tokio::test]
    async fn non_numeric_amount_is_bad_request() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({
                "type": "expense",
                "source": "Cafe",
                "amount": "lots",
                "date": "2025-10-05"
            }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn updating_missing_transaction_is_not_found() {
        let server = get_test_server(get_test_state());

        let response = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({
                "id": 99,
                "type": "expense",
                "source": "Cafe",
                "amount": 3,
                "date": "2025-10-05"
            }))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn deletes_transaction() {
        let state = get_test_state();
        let server = get_test_server(state.clone());
        let created: Transaction = server
            .post(endpoints::TRANSACTIONS_API)
            .json(&json!({
                "type": "expense",
                "source": "Cafe",
                "amount": 3,
                "date": "2025-10-05"
            }))
            .await
            .json();

        let response = server
            .delete(&endpoints::format_endpoint(endpoints::TRANSACTION_API, created.id))
            .await;

        response.assert_status(axum::http::StatusCode::NO_CONTENT);
        assert!(state.transactions.current().is_empty());

        server
            .get(&endpoints::format_endpoint(endpoints::TRANSACTION_API, created.id))
            .await
            .assert_status_not_found();

        server
            .delete(&endpoints::format_endpoint(endpoints::TRANSACTION_API, created.id))
            .await
            .assert_status_not_found();
    }
}
