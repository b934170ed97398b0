use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AccountId, UserId},
};

/// A bank account, card or wallet that transactions move money through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDetails {
    /// The id for the account.
    pub id: AccountId,
    /// The name transactions refer to the account by, e.g. "HSBC Bank".
    pub name: String,
    /// What kind of account this is, e.g. "Credit Card".
    #[serde(rename = "type")]
    pub kind: String,
    /// The balance, negative for money owed.
    pub balance: f64,
    /// The CSS gradient the account card is drawn with. Display only.
    #[serde(default)]
    pub gradient: String,
}

/// The fields for inserting or updating an [AccountDetails].
#[derive(Debug, Clone, PartialEq)]
pub struct AccountBuilder {
    pub id: Option<AccountId>,
    pub name: String,
    pub kind: String,
    pub balance: f64,
    pub gradient: String,
}

impl AccountDetails {
    pub fn build(name: &str, kind: &str, balance: f64) -> AccountBuilder {
        AccountBuilder {
            id: None,
            name: name.to_owned(),
            kind: kind.to_owned(),
            balance,
            gradient: String::new(),
        }
    }
}

impl AccountBuilder {
    pub fn id(mut self, id: Option<AccountId>) -> Self {
        self.id = id;
        self
    }

    pub fn gradient(mut self, gradient: &str) -> Self {
        self.gradient = gradient.to_owned();
        self
    }

    /// # Errors
    /// Returns [Error::EmptyField] if the name is empty.
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::EmptyField("name"));
        }

        Ok(())
    }
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            balance REAL NOT NULL,
            gradient TEXT NOT NULL DEFAULT ''
        );

        CREATE INDEX IF NOT EXISTS idx_account_user ON account(user_id);",
    )
}

pub fn map_row_to_account(row: &Row) -> Result<AccountDetails, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let kind = row.get(2)?;
    let balance = row.get(3)?;
    let gradient = row.get(4)?;

    Ok(AccountDetails {
        id,
        name,
        kind,
        balance,
        gradient,
    })
}

/// Insert a new account, or update the user's account when `builder` has an ID.
///
/// # Errors
/// Returns [Error::UpdateMissingAccount] if the ID does not refer to one of
/// the user's accounts, or a validation or SQL error.
pub fn save_account(
    builder: AccountBuilder,
    user_id: UserId,
    connection: &Connection,
) -> Result<AccountDetails, Error> {
    builder.validate()?;

    match builder.id {
        None => connection
            .prepare(
                "INSERT INTO account (user_id, name, type, balance, gradient)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING id, name, type, balance, gradient",
            )?
            .query_row(
                (
                    user_id,
                    builder.name.trim(),
                    builder.kind.trim(),
                    builder.balance,
                    &builder.gradient,
                ),
                map_row_to_account,
            )
            .map_err(Error::from),
        Some(id) => connection
            .prepare(
                "UPDATE account SET name = ?1, type = ?2, balance = ?3, gradient = ?4
                 WHERE id = ?5 AND user_id = ?6
                 RETURNING id, name, type, balance, gradient",
            )?
            .query_row(
                (
                    builder.name.trim(),
                    builder.kind.trim(),
                    builder.balance,
                    &builder.gradient,
                    id,
                    user_id,
                ),
                map_row_to_account,
            )
            .map_err(|error| match error {
                rusqlite::Error::QueryReturnedNoRows => Error::UpdateMissingAccount,
                error => error.into(),
            }),
    }
}

/// Get all of the user's accounts in the order they were added.
///
/// # Errors
/// Returns [Error] if the SQL query fails.
pub fn get_accounts(user_id: UserId, connection: &Connection) -> Result<Vec<AccountDetails>, Error> {
    connection
        .prepare(
            "SELECT id, name, type, balance, gradient FROM account
             WHERE user_id = :user_id ORDER BY id ASC",
        )?
        .query_map(&[(":user_id", &user_id)], map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Get the total balance across all of the user's accounts.
///
/// # Errors
/// Returns [Error] if the SQL query fails.
pub fn get_total_account_balance(user_id: UserId, connection: &Connection) -> Result<f64, Error> {
    let mut stmt =
        connection.prepare("SELECT COALESCE(SUM(balance), 0) FROM account WHERE user_id = ?1")?;

    let total: f64 = stmt.query_row([user_id], |row| row.get(0))?;

    Ok(total)
}

/// # Errors
/// Returns [Error::DeleteMissingAccount] if `id` does not refer to one of the user's accounts.
pub fn delete_account(id: AccountId, user_id: UserId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingAccount);
    }

    Ok(())
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_account_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_account_table(&connection));
    }
}

#[cfg(test)]
mod account_tests {
    use rusqlite::Connection;

    use crate::{Error, db::initialize};

    use super::{AccountDetails, delete_account, get_accounts, save_account};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_and_update() {
        let conn = get_test_connection();

        let account = save_account(
            AccountDetails::build("HSBC Bank", "Current", 1200.0).gradient("from-blue-500"),
            1,
            &conn,
        )
        .unwrap();
        let updated = save_account(
            AccountDetails::build("HSBC Bank", "Savings", 900.0).id(Some(account.id)),
            1,
            &conn,
        )
        .unwrap();

        assert_eq!(updated.kind, "Savings");
        assert_eq!(updated.balance, 900.0);
        assert_eq!(updated.gradient, "");
        assert_eq!(get_accounts(1, &conn), Ok(vec![updated]));
    }

    #[test]
    fn empty_name_is_rejected() {
        let conn = get_test_connection();

        let result = save_account(AccountDetails::build(" ", "Current", 1.0), 1, &conn);

        assert_eq!(result, Err(Error::EmptyField("name")));
    }

    #[test]
    fn missing_accounts_are_reported() {
        let conn = get_test_connection();

        assert_eq!(
            save_account(AccountDetails::build("Paypal", "Wallet", 1.0).id(Some(3)), 1, &conn),
            Err(Error::UpdateMissingAccount)
        );
        assert_eq!(delete_account(3, 1, &conn), Err(Error::DeleteMissingAccount));
    }
}
