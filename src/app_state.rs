//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error,
    category::BudgetCeilings,
    currency::{CurrencyCode, ExchangeRates},
    database_id::UserId,
    db::initialize,
    goal::GoalSetting,
    settings::Settings,
    snapshot::Snapshot,
    transaction::Transaction,
};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The user whose data the server manages.
    pub user_id: UserId,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// The currency amounts are shown in when a request does not pick one.
    pub default_currency: CurrencyCode,

    /// The cross rates used to convert stored amounts for display.
    pub exchange_rates: Arc<ExchangeRates>,

    /// The budget ceiling for each expense category.
    pub budget_ceilings: Arc<BudgetCeilings>,

    /// The last successfully fetched transactions.
    pub transactions: Snapshot<Transaction>,

    /// The last successfully fetched goal settings.
    pub goals: Snapshot<GoalSetting>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        user_id: UserId,
        local_timezone: &str,
        default_currency: CurrencyCode,
        settings: Settings,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let (exchange_rates, budget_ceilings) = settings.into_parts();

        if let Err(error) = exchange_rates.ensure_displayable(default_currency) {
            tracing::warn!("The default currency cannot be displayed: {error}");
        }

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            user_id,
            local_timezone: local_timezone.to_owned(),
            default_currency,
            exchange_rates: Arc::new(exchange_rates),
            budget_ceilings: Arc::new(budget_ceilings),
            transactions: Snapshot::new("transactions"),
            goals: Snapshot::new("goal settings"),
        })
    }
}
