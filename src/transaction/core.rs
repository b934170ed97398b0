//! Defines the core data models and database queries for transactions.

use std::{fmt::Display, str::FromStr};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    category::UNCLASSIFIED_LABEL,
    database_id::{TransactionId, UserId},
    dates::{optional_date, parse_date},
};

// ============================================================================
// MODELS
// ============================================================================

/// What kind of money movement a transaction records.
///
/// Amounts are always positive, the type decides whether the amount is money
/// coming in or going out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
    /// A payment for a subscription.
    Subscription,
    /// A deposit towards a savings goal.
    Goal,
}

/// How often a subscription renews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    /// Every seven days.
    Weekly,
    /// Every calendar month.
    Monthly,
    /// Every calendar year.
    Yearly,
}

/// Whether a subscription renews or was paid once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionType {
    /// Renews every [Frequency] period.
    Recurring,
    /// A single payment.
    #[serde(rename = "One Off")]
    OneOff,
}

/// An income, expense, subscription payment or goal deposit.
///
/// To create a new `Transaction`, use [Transaction::build] and [save_transaction].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// Whether the transaction is income, an expense, a subscription or a goal deposit.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// A free text label for where the money came from or went to.
    pub source: String,
    /// The category label, e.g. "Food". Older records may not have one.
    #[serde(default)]
    pub category: Option<String>,
    /// The amount in the stored currency, always greater than zero.
    pub amount: f64,
    /// When the transaction happened. Older records may have a missing or
    /// unreadable date.
    #[serde(default, with = "optional_date")]
    pub date: Option<Date>,
    /// The name of the account the money moved through.
    pub account: String,
    /// How often a subscription renews.
    #[serde(default)]
    pub frequency: Option<Frequency>,
    /// When a subscription is next due.
    #[serde(default, with = "optional_date")]
    pub next_payment: Option<Date>,
    /// Whether a subscription renews.
    #[serde(default)]
    pub subscription_type: Option<SubscriptionType>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        kind: TransactionType,
        amount: f64,
        date: Option<Date>,
        source: &str,
    ) -> TransactionBuilder {
        TransactionBuilder {
            id: None,
            kind,
            source: source.to_owned(),
            category: None,
            amount,
            date,
            account: String::new(),
            frequency: None,
            next_payment: None,
            subscription_type: None,
        }
    }

    /// The category label, or [UNCLASSIFIED_LABEL] if the transaction has no category.
    pub fn category_label(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(category) if !category.is_empty() => category,
            _ => UNCLASSIFIED_LABEL,
        }
    }

    /// The category if the transaction has a non-empty one.
    pub fn classified_category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|category| !category.is_empty())
    }

    /// Whether the transaction is a recurring subscription.
    pub fn is_recurring_subscription(&self) -> bool {
        self.kind == TransactionType::Subscription
            && self.subscription_type != Some(SubscriptionType::OneOff)
    }
}

/// A builder for saving [Transaction] instances.
///
/// A builder without an ID is inserted as a new transaction, a builder with an
/// ID replaces the existing transaction with that ID.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The ID of the transaction to update, `None` to insert a new transaction.
    pub id: Option<TransactionId>,
    /// The kind of transaction.
    pub kind: TransactionType,
    /// Where the money came from or went to, must not be empty.
    pub source: String,
    /// The category label.
    pub category: Option<String>,
    /// The amount, must be greater than zero.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Option<Date>,
    /// The account name.
    pub account: String,
    /// How often a subscription renews.
    pub frequency: Option<Frequency>,
    /// When a subscription is next due.
    pub next_payment: Option<Date>,
    /// Whether a subscription renews.
    pub subscription_type: Option<SubscriptionType>,
}

impl TransactionBuilder {
    /// Set the ID of the transaction to update.
    pub fn id(mut self, id: Option<TransactionId>) -> Self {
        self.id = id;
        self
    }

    /// Set the category for the transaction.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    /// Set the account for the transaction.
    pub fn account(mut self, account: &str) -> Self {
        self.account = account.to_owned();
        self
    }

    /// Set the subscription details for the transaction.
    pub fn subscription(
        mut self,
        subscription_type: SubscriptionType,
        frequency: Option<Frequency>,
        next_payment: Option<Date>,
    ) -> Self {
        self.subscription_type = Some(subscription_type);
        self.frequency = frequency;
        self.next_payment = next_payment;
        self
    }

    /// Check the fields that must hold before a transaction can be saved.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NonPositiveAmount] if the amount is zero, negative or not finite,
    /// - or [Error::EmptyField] if the source is empty.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::NonPositiveAmount(self.amount));
        }

        if self.source.trim().is_empty() {
            return Err(Error::EmptyField("source"));
        }

        Ok(())
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Insert or update a transaction for the user `user_id`.
///
/// A builder without an ID is inserted, a builder with an ID updates the
/// user's transaction with that ID.
///
/// # Errors
/// This function will return a:
/// - validation error from [TransactionBuilder::validate],
/// - or [Error::UpdateMissingTransaction] if the ID does not refer to one of the user's transactions,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn save_transaction(
    builder: TransactionBuilder,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.validate()?;

    let date = builder.date.map(|date| date.to_string());
    let next_payment = builder.next_payment.map(|date| date.to_string());
    let category = builder
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty());

    match builder.id {
        None => connection
            .prepare(
                "INSERT INTO \"transaction\"
                    (user_id, type, source, category, amount, date, account, frequency, next_payment, subscription_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 RETURNING id, type, source, category, amount, date, account, frequency, next_payment, subscription_type",
            )?
            .query_row(
                rusqlite::params![
                    user_id,
                    builder.kind,
                    builder.source.trim(),
                    category,
                    builder.amount,
                    date,
                    builder.account.trim(),
                    builder.frequency,
                    next_payment,
                    builder.subscription_type,
                ],
                map_transaction_row,
            )
            .map_err(Error::from),
        Some(id) => connection
            .prepare(
                "UPDATE \"transaction\"
                 SET type = ?1, source = ?2, category = ?3, amount = ?4, date = ?5,
                     account = ?6, frequency = ?7, next_payment = ?8, subscription_type = ?9
                 WHERE id = ?10 AND user_id = ?11
                 RETURNING id, type, source, category, amount, date, account, frequency, next_payment, subscription_type",
            )?
            .query_row(
                rusqlite::params![
                    builder.kind,
                    builder.source.trim(),
                    category,
                    builder.amount,
                    date,
                    builder.account.trim(),
                    builder.frequency,
                    next_payment,
                    builder.subscription_type,
                    id,
                    user_id,
                ],
                map_transaction_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingTransaction,
                error => error.into(),
            }),
    }
}

/// Retrieve one of the user's transactions by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, type, source, category, amount, date, account, frequency, next_payment, subscription_type
             FROM \"transaction\" WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(
            &[(":id", &id), (":user_id", &user_id)],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve all of the user's transactions, newest first.
///
/// Transactions without a readable date are listed last.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions(user_id: UserId, connection: &Connection) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, type, source, category, amount, date, account, frequency, next_payment, subscription_type
             FROM \"transaction\" WHERE user_id = :user_id
             ORDER BY date IS NULL, date DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id)], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Delete one of the user's transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to one of the user's transactions,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingTransaction);
    }

    Ok(())
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            type TEXT NOT NULL,
            source TEXT NOT NULL,
            category TEXT,
            amount REAL NOT NULL,
            date TEXT,
            account TEXT NOT NULL,
            frequency TEXT,
            next_payment TEXT,
            subscription_type TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_transaction_user ON \"transaction\"(user_id);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// Dates and subscription details are read leniently: a value that cannot be
/// understood is treated as missing rather than failing the whole query.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let kind = row.get(1)?;
    let source = row.get(2)?;
    let category = row.get(3)?;
    let amount = row.get(4)?;
    let date: Option<String> = row.get(5)?;
    let account = row.get(6)?;
    let frequency: Option<String> = row.get(7)?;
    let next_payment: Option<String> = row.get(8)?;
    let subscription_type: Option<String> = row.get(9)?;

    Ok(Transaction {
        id,
        kind,
        source,
        category,
        amount,
        date: date.as_deref().and_then(parse_date),
        account,
        frequency: frequency.and_then(|text| text.parse().ok()),
        next_payment: next_payment.as_deref().and_then(parse_date),
        subscription_type: subscription_type.and_then(|text| text.parse().ok()),
    })
}

// ============================================================================
// TEXT AND SQL CONVERSIONS
// ============================================================================

impl TransactionType {
    /// The lowercase name used in storage and the API, e.g. "income".
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Income => "income",
            TransactionType::Expense => "expense",
            TransactionType::Subscription => "subscription",
            TransactionType::Goal => "goal",
        }
    }
}

impl Frequency {
    /// The name used in storage and the API, e.g. "Monthly".
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Yearly => "Yearly",
        }
    }
}

impl SubscriptionType {
    /// The name used in storage and the API, e.g. "One Off".
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionType::Recurring => "Recurring",
            SubscriptionType::OneOff => "One Off",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionType::Income),
            "expense" => Ok(TransactionType::Expense),
            "subscription" => Ok(TransactionType::Subscription),
            "goal" => Ok(TransactionType::Goal),
            _ => Err(()),
        }
    }
}

impl FromStr for Frequency {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Weekly" => Ok(Frequency::Weekly),
            "Monthly" => Ok(Frequency::Monthly),
            "Yearly" => Ok(Frequency::Yearly),
            _ => Err(()),
        }
    }
}

impl FromStr for SubscriptionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Recurring" => Ok(SubscriptionType::Recurring),
            "One Off" => Ok(SubscriptionType::OneOff),
            _ => Err(()),
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|_| FromSqlError::InvalidType)
    }
}

impl ToSql for Frequency {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl ToSql for SubscriptionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod validation_tests {
    use time::macros::date;

    use crate::{
        Error,
        transaction::{Transaction, TransactionType},
    };

    #[test]
    fn rejects_non_positive_amounts() {
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let builder =
                Transaction::build(TransactionType::Expense, amount, Some(date!(2025 - 01 - 01)), "Shop");

            assert!(
                matches!(builder.validate(), Err(Error::NonPositiveAmount(_))),
                "{amount} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_empty_source() {
        let builder = Transaction::build(TransactionType::Income, 10.0, None, "  ");

        assert_eq!(builder.validate(), Err(Error::EmptyField("source")));
    }

    #[test]
    fn blank_category_is_unclassified() {
        let transaction = Transaction {
            id: 1,
            kind: TransactionType::Expense,
            source: "Shop".to_owned(),
            category: Some("   ".to_owned()),
            amount: 1.0,
            date: None,
            account: String::new(),
            frequency: None,
            next_payment: None,
            subscription_type: None,
        };

        assert_eq!(transaction.category_label(), "Unclassified");
        assert_eq!(transaction.classified_category(), None);
    }
}
