//! Goal settings: a target amount for an income or expense category.
//!
//! A goal is not linked to transactions in the database. Its progress is
//! worked out when it is read, from the transactions with the same category
//! and a matching type.

use std::str::FromStr;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    category::is_known_category,
    database_id::{GoalId, UserId},
    dates::{optional_date, parse_date},
    transaction::TransactionType,
};

// ===== MODELS =====

/// Where the user is at with a goal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalStatus {
    #[default]
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    #[serde(rename = "On Hold")]
    OnHold,
}

/// Whether a goal tracks money earned or money spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalKind {
    Income,
    Expense,
}

impl GoalKind {
    /// The transaction type that counts towards a goal of this kind.
    pub fn transaction_type(self) -> TransactionType {
        match self {
            GoalKind::Income => TransactionType::Income,
            GoalKind::Expense => TransactionType::Expense,
        }
    }
}

/// A target amount for one income or expense category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalSetting {
    pub id: GoalId,
    pub name: String,
    /// One of the fixed category labels, e.g. "Holidays".
    pub category: String,
    /// The target in the stored currency.
    pub goal_amount: f64,
    #[serde(default, with = "optional_date")]
    pub target_date: Option<Date>,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(rename = "type")]
    pub kind: GoalKind,
}

/// The fields for inserting or updating a [GoalSetting].
#[derive(Debug, Clone, PartialEq)]
pub struct GoalBuilder {
    pub id: Option<GoalId>,
    pub name: String,
    pub category: String,
    pub goal_amount: f64,
    pub target_date: Option<Date>,
    pub status: GoalStatus,
    pub kind: GoalKind,
}

impl GoalSetting {
    pub fn build(name: &str, category: &str, goal_amount: f64, kind: GoalKind) -> GoalBuilder {
        GoalBuilder {
            id: None,
            name: name.to_owned(),
            category: category.to_owned(),
            goal_amount,
            target_date: None,
            status: GoalStatus::default(),
            kind,
        }
    }
}

impl GoalBuilder {
    pub fn id(mut self, id: Option<GoalId>) -> Self {
        self.id = id;
        self
    }

    pub fn target_date(mut self, target_date: Option<Date>) -> Self {
        self.target_date = target_date;
        self
    }

    pub fn status(mut self, status: GoalStatus) -> Self {
        self.status = status;
        self
    }

    /// A goal of zero is allowed, it simply never makes progress.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyField] if the name is empty,
    /// - [Error::InvalidGoalAmount] if the goal amount is negative or not finite,
    /// - or [Error::UnknownCategory] if the category is not one of the fixed categories.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::EmptyField("name"));
        }

        if !self.goal_amount.is_finite() || self.goal_amount < 0.0 {
            return Err(Error::InvalidGoalAmount(self.goal_amount));
        }

        if !is_known_category(self.category.trim()) {
            return Err(Error::UnknownCategory(self.category.clone()));
        }

        Ok(())
    }
}

// ===== DATABASE FUNCTIONS =====

pub fn create_goal_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS goal_setting (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            goal_amount REAL NOT NULL,
            target_date TEXT,
            status TEXT NOT NULL,
            type TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_goal_setting_user ON goal_setting(user_id);",
    )
}

fn map_goal_row(row: &Row) -> Result<GoalSetting, rusqlite::Error> {
    let target_date: Option<String> = row.get(4)?;

    Ok(GoalSetting {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        goal_amount: row.get(3)?,
        target_date: target_date.as_deref().and_then(parse_date),
        status: row.get(5)?,
        kind: row.get(6)?,
    })
}

/// Insert a new goal, or update the user's goal when `builder` has an ID.
///
/// # Errors
/// This function will return a:
/// - validation error from [GoalBuilder::validate],
/// - [Error::UpdateMissingGoal] if the ID does not refer to one of the user's goals,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn save_goal(
    builder: GoalBuilder,
    user_id: UserId,
    connection: &Connection,
) -> Result<GoalSetting, Error> {
    builder.validate()?;

    let target_date = builder.target_date.map(|date| date.to_string());

    match builder.id {
        None => connection
            .prepare(
                "INSERT INTO goal_setting (user_id, name, category, goal_amount, target_date, status, type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING id, name, category, goal_amount, target_date, status, type",
            )?
            .query_row(
                (
                    user_id,
                    builder.name.trim(),
                    builder.category.trim(),
                    builder.goal_amount,
                    target_date,
                    builder.status,
                    builder.kind,
                ),
                map_goal_row,
            )
            .map_err(Error::from),
        Some(id) => connection
            .prepare(
                "UPDATE goal_setting
                 SET name = ?1, category = ?2, goal_amount = ?3, target_date = ?4, status = ?5, type = ?6
                 WHERE id = ?7 AND user_id = ?8
                 RETURNING id, name, category, goal_amount, target_date, status, type",
            )?
            .query_row(
                (
                    builder.name.trim(),
                    builder.category.trim(),
                    builder.goal_amount,
                    target_date,
                    builder.status,
                    builder.kind,
                    id,
                    user_id,
                ),
                map_goal_row,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingGoal,
                error => error.into(),
            }),
    }
}

/// # Errors
/// Returns an [Error::SqlError] if there is an SQL error.
pub fn get_goals(user_id: UserId, connection: &Connection) -> Result<Vec<GoalSetting>, Error> {
    connection
        .prepare(
            "SELECT id, name, category, goal_amount, target_date, status, type
             FROM goal_setting WHERE user_id = :user_id ORDER BY id ASC",
        )?
        .query_map(&[(":user_id", &user_id)], map_goal_row)?
        .map(|maybe_goal| maybe_goal.map_err(Error::from))
        .collect()
}

/// # Errors
/// Returns [Error::DeleteMissingGoal] if `id` does not refer to one of the user's goals.
pub fn delete_goal(id: GoalId, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM goal_setting WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingGoal);
    }

    Ok(())
}

// ===== TEXT AND SQL CONVERSIONS =====

impl GoalStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalStatus::InProgress => "In Progress",
            GoalStatus::Completed => "Completed",
            GoalStatus::OnHold => "On Hold",
        }
    }
}

impl GoalKind {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalKind::Income => "Income",
            GoalKind::Expense => "Expense",
        }
    }
}

impl FromStr for GoalStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "In Progress" => Ok(GoalStatus::InProgress),
            "Completed" => Ok(GoalStatus::Completed),
            "On Hold" => Ok(GoalStatus::OnHold),
            _ => Err(()),
        }
    }
}

impl FromStr for GoalKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older records stored the type in lowercase.
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(GoalKind::Income),
            "expense" => Ok(GoalKind::Expense),
            _ => Err(()),
        }
    }
}

impl ToSql for GoalStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for GoalStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|_| FromSqlError::InvalidType)
    }
}

impl ToSql for GoalKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for GoalKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|_| FromSqlError::InvalidType)
    }
}

#[cfg(test)]
mod validation_tests {
    use crate::{
        Error,
        goal::{GoalKind, GoalSetting},
    };

    #[test]
    fn zero_goal_is_allowed() {
        let builder = GoalSetting::build("Trip", "Holidays", 0.0, GoalKind::Expense);

        assert_eq!(builder.validate(), Ok(()));
    }

    #[test]
    fn negative_goal_is_rejected() {
        let builder = GoalSetting::build("Trip", "Holidays", -1.0, GoalKind::Expense);

        assert_eq!(builder.validate(), Err(Error::InvalidGoalAmount(-1.0)));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let builder = GoalSetting::build("Luck", "Lottery", 10.0, GoalKind::Income);

        assert_eq!(
            builder.validate(),
            Err(Error::UnknownCategory("Lottery".to_owned()))
        );
    }

    #[test]
    fn empty_name_is_rejected() {
        let builder = GoalSetting::build("", "Salary", 10.0, GoalKind::Income);

        assert_eq!(builder.validate(), Err(Error::EmptyField("name")));
    }
}
