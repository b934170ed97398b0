//! Accounts: the bank accounts, cards and wallets that transactions move money through.

mod core;
mod endpoints;

pub use core::{
    AccountDetails, create_account_table, delete_account, get_accounts,
    get_total_account_balance, save_account,
};
pub use endpoints::{
    AccountForm, delete_account_endpoint, get_accounts_endpoint,
    save_account_endpoint,
};
