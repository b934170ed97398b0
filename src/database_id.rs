//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;
/// The ID of a transaction.
pub type TransactionId = DatabaseId;
/// The ID of a to-do item.
pub type TodoId = DatabaseId;
/// The ID of a goal setting.
pub type GoalId = DatabaseId;
/// The ID of an account.
pub type AccountId = DatabaseId;
/// The ID of the user that owns a record.
///
/// Every query against the store is scoped by this ID.
pub type UserId = DatabaseId;
