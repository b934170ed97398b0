//! Loading mock data from a JSON file into the database.
//!
//! The file mirrors the shapes used by the JSON API:
//!
//! ```json
//! {
//!   "transactions": [{ "type": "income", "source": "Payday", "category": "Salary",
//!                      "amount": 1000, "date": "2025-03-01", "account": "HSBC Bank" }],
//!   "todos": [{ "task": "Pay rent", "priority": "High", "dueDate": "2025-03-05" }],
//!   "goals": [{ "name": "Holiday", "category": "Holidays", "goalAmount": 2000, "type": "Expense" }],
//!   "accounts": [{ "name": "HSBC Bank", "type": "Current", "balance": 1500 }]
//! }
//! ```
//!
//! IDs in the file are ignored, every record is inserted as a new record.

use std::{fs, path::Path};

use axum::http::StatusCode;
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{AccountDetails, AccountForm, save_account},
    database_id::UserId,
    dates::optional_date,
    goal::{GoalForm, save_goal},
    todo::{TodoForm, save_todo},
    transaction::{Frequency, SubscriptionType, Transaction, TransactionType, save_transaction},
};

/// A transaction in the mock data file.
///
/// Unlike the JSON API, the date may be missing so that older records can be
/// loaded as they are.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedTransaction {
    #[serde(rename = "type")]
    pub kind: TransactionType,
    pub source: String,
    #[serde(default)]
    pub category: Option<String>,
    pub amount: f64,
    #[serde(default, with = "optional_date")]
    pub date: Option<Date>,
    #[serde(default)]
    pub account: String,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default, with = "optional_date")]
    pub next_payment: Option<Date>,
    #[serde(default)]
    pub subscription_type: Option<SubscriptionType>,
}

/// The contents of a mock data file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    /// Income, expenses, subscriptions and goal deposits.
    #[serde(default)]
    pub transactions: Vec<SeedTransaction>,
    /// To-do items.
    #[serde(default)]
    pub todos: Vec<TodoForm>,
    /// Goal settings.
    #[serde(default)]
    pub goals: Vec<GoalForm>,
    /// Bank accounts, cards and wallets.
    #[serde(default)]
    pub accounts: Vec<AccountForm>,
}

/// How many records of each kind were inserted.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Transactions inserted.
    pub transactions: usize,
    /// To-do items inserted.
    pub todos: usize,
    /// Goals inserted.
    pub goals: usize,
    /// Accounts inserted.
    pub accounts: usize,
    /// Records that failed validation and were left out.
    pub skipped: usize,
}

/// Read mock data from the JSON file at `path`.
///
/// # Errors
/// Returns [Error::FileError] if the file cannot be read or is not valid mock data.
pub fn load_seed_file(path: &Path) -> Result<SeedData, Error> {
    let file_error = |reason: String| Error::FileError {
        path: path.display().to_string(),
        reason,
    };

    let text = fs::read_to_string(path).map_err(|error| file_error(error.to_string()))?;

    serde_json::from_str(&text).map_err(|error| file_error(error.to_string()))
}

/// Insert the mock data for `user_id`.
///
/// Records that fail validation are skipped with a warning. Everything is
/// inserted in a single transaction, so an SQL error leaves the database unchanged.
///
/// # Errors
/// Returns an [Error::SqlError] if a record could not be inserted.
pub fn seed_database(
    data: SeedData,
    user_id: UserId,
    connection: &Connection,
) -> Result<SeedSummary, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let mut summary = SeedSummary::default();

    for seed in data.transactions {
        let mut builder = Transaction::build(seed.kind, seed.amount, seed.date, &seed.source)
            .account(&seed.account);
        if let Some(category) = &seed.category {
            builder = builder.category(category);
        }
        builder.frequency = seed.frequency;
        builder.next_payment = seed.next_payment;
        builder.subscription_type = seed.subscription_type;

        let result = save_transaction(builder, user_id, &sql_transaction);
        count(result, &mut summary.transactions, &mut summary.skipped, "transaction")?;
    }

    for form in data.todos {
        let result = TodoForm { id: None, ..form }
            .into_builder()
            .and_then(|builder| save_todo(builder, user_id, &sql_transaction));
        count(result, &mut summary.todos, &mut summary.skipped, "to-do item")?;
    }

    for form in data.goals {
        let result = GoalForm { id: None, ..form }
            .into_builder()
            .and_then(|builder| save_goal(builder, user_id, &sql_transaction));
        count(result, &mut summary.goals, &mut summary.skipped, "goal")?;
    }

    for form in data.accounts {
        let builder =
            AccountDetails::build(&form.name, &form.kind, form.balance).gradient(&form.gradient);
        let result = save_account(builder, user_id, &sql_transaction);
        count(result, &mut summary.accounts, &mut summary.skipped, "account")?;
    }

    sql_transaction.commit()?;

    tracing::info!("Seeded the database: {summary:?}");

    Ok(summary)
}

fn count<T>(
    result: Result<T, Error>,
    inserted: &mut usize,
    skipped: &mut usize,
    record: &str,
) -> Result<(), Error> {
    match result {
        Ok(_) => *inserted += 1,
        Err(error) if error.status_code() == StatusCode::BAD_REQUEST => {
            tracing::warn!("Skipping invalid {record}: {error}");
            *skipped += 1;
        }
        Err(error) => return Err(error),
    }

    Ok(())
}
