//! Transaction management for the budgeting application.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model and `TransactionBuilder` for saving transactions
//! - Database functions for storing, querying, and deleting transactions
//! - The JSON API and the page listing the transactions of a category

mod core;
mod endpoints;
mod transactions_page;

pub use core::{
    Frequency, SubscriptionType, Transaction, TransactionBuilder, TransactionType,
    create_transaction_table, delete_transaction, get_transaction, get_transactions,
    save_transaction,
};
pub use endpoints::{
    TransactionForm, TransactionState, delete_transaction_endpoint, get_transaction_endpoint,
    get_transactions_endpoint, save_transaction_endpoint,
};
pub use transactions_page::get_transactions_page;
