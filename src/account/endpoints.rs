//! The JSON API for accounts.

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
    account::{AccountDetails, delete_account, get_accounts, save_account},
    database_id::{AccountId, UserId},
    db::lock_connection,
};

/// The state needed to manage accounts.
#[derive(Debug, Clone)]
pub struct AccountState {
    db_connection: Arc<Mutex<Connection>>,
    user_id: UserId,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id,
        }
    }
}

/// The JSON body for saving an account. Leave out `id` to create a new account.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    #[serde(default)]
    pub id: Option<AccountId>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub balance: f64,
    #[serde(default)]
    pub gradient: String,
}

pub async fn get_accounts_endpoint(
    State(state): State<AccountState>,
) -> Result<Json<Vec<AccountDetails>>, ApiError> {
    let connection = lock_connection(&state.db_connection)?;

    Ok(Json(get_accounts(state.user_id, &connection)?))
}

/// Save an account, responds with `201 Created` for new accounts and `200 OK` for updates.
pub async fn save_account_endpoint(
    State(state): State<AccountState>,
    payload: Result<Json<AccountForm>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(form) =
        payload.map_err(|rejection| Error::JSONSerializationError(rejection.body_text()))?;
    let status = match form.id {
        Some(_) => StatusCode::OK,
        None => StatusCode::CREATED,
    };
    let builder = AccountDetails::build(&form.name, &form.kind, form.balance)
        .id(form.id)
        .gradient(&form.gradient);

    let connection = lock_connection(&state.db_connection)?;
    let account = save_account(builder, state.user_id, &connection)?;

    Ok((status, Json(account)).into_response())
}

pub async fn delete_account_endpoint(
    State(state): State<AccountState>,
    Path(account_id): Path<AccountId>,
) -> Result<StatusCode, ApiError> {
    let connection = lock_connection(&state.db_connection)?;

    delete_account(account_id, state.user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not delete account {account_id}: {error}"))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        http::StatusCode,
        routing::{delete, get},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        AppState, CurrencyCode, Settings,
        account::{
            AccountDetails, delete_account_endpoint, get_accounts_endpoint, save_account_endpoint,
        },
        endpoints,
    };

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            1,
            "Etc/UTC",
            CurrencyCode::USD,
            Settings::default(),
        )
        .unwrap();

        let app = Router::new()
            .route(
                endpoints::ACCOUNTS_API,
                get(get_accounts_endpoint).post(save_account_endpoint),
            )
            .route(endpoints::ACCOUNT_API, delete(delete_account_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn create_update_and_delete() {
        let server = get_test_server();

        let response = server
            .post(endpoints::ACCOUNTS_API)
            .json(&json!({"name": "Paypal", "type": "Wallet", "balance": 42.5}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let account: AccountDetails = response.json();

        let response = server
            .post(endpoints::ACCOUNTS_API)
            .json(&json!({
                "id": account.id,
                "name": "Paypal",
                "type": "Wallet",
                "balance": -10,
                "gradient": "from-indigo-500 to-purple-600"
            }))
            .await;
        response.assert_status_ok();
        let updated: AccountDetails = response.json();
        assert_eq!(updated.balance, -10.0);

        let listed: Vec<AccountDetails> = server.get(endpoints::ACCOUNTS_API).await.json();
        assert_eq!(listed, vec![updated]);

        server
            .delete(&endpoints::format_endpoint(endpoints::ACCOUNT_API, account.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn deleting_missing_account_is_not_found() {
        let server = get_test_server();

        server
            .delete(&endpoints::format_endpoint(endpoints::ACCOUNT_API, 8))
            .await
            .assert_status_not_found();
    }
}
