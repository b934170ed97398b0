//! Totals, summaries and goal progress computed from a user's transactions.
//!
//! Every function here is a pure function of the transactions, the exchange
//! rates and the display currency. Nothing is cached, each figure is
//! recomputed from the latest snapshot whenever the dashboard is drawn.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    Error,
    category::{
        BudgetCeilings, EXPENSE_CATEGORIES, UNCLASSIFIED_LABEL, all_categories, is_known_category,
    },
    currency::{CurrencyCode, ExchangeRates, STORED_CURRENCY},
    goal::GoalSetting,
    transaction::{Frequency, Transaction, TransactionType},
};

/// The label used for transactions that do not name an account.
pub const UNASSIGNED_ACCOUNT_LABEL: &str = "Unassigned";

/// The total for one category in the display currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// The income and expense totals for one account in the display currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountTotals {
    pub account: String,
    pub income: f64,
    pub expense: f64,
}

/// The budget ceiling and actual spend for an expense category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLine {
    pub category: &'static str,
    pub budget: f64,
    pub actual: f64,
}

/// How far a goal is towards its goal amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub goal: GoalSetting,
    /// The goal amount in the display currency.
    pub goal_amount: f64,
    /// The matching transactions' total in the display currency.
    pub current: f64,
    /// Progress between 0 and 100.
    pub percentage: f64,
}

/// The headline figures shown at the top of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub total_income: f64,
    pub total_expenses: f64,
    pub total_subscriptions: f64,
    /// Deposits towards savings goals. These move money rather than spend
    /// it, so they are not part of the net balance.
    pub total_goal_deposits: f64,
    /// Expenses with subscriptions folded in, as shown on the dashboard.
    pub displayed_expenses: f64,
    /// Income minus expenses and subscriptions.
    pub net_balance: f64,
}

fn to_display(amount: f64, rates: &ExchangeRates, currency: CurrencyCode) -> Result<f64, Error> {
    rates.convert(amount, STORED_CURRENCY, currency)
}

/// Sum the converted amounts of every transaction in each category.
///
/// The known categories are listed first in their display order, including
/// those with no transactions. Categories that are not known follow in
/// alphabetical order, and [UNCLASSIFIED_LABEL] comes last.
///
/// # Errors
/// Returns [Error::MissingExchangeRate] if amounts cannot be shown in `currency`.
pub fn category_totals(
    transactions: &[Transaction],
    rates: &ExchangeRates,
    currency: CurrencyCode,
) -> Result<Vec<CategoryTotal>, Error> {
    let mut known: Vec<CategoryTotal> = all_categories()
        .map(|option| CategoryTotal {
            category: option.label.to_owned(),
            total: 0.0,
        })
        .collect();
    let mut unknown: BTreeMap<&str, f64> = BTreeMap::new();
    let mut unclassified = None;

    for transaction in transactions {
        let amount = to_display(transaction.amount, rates, currency)?;

        match transaction.classified_category() {
            None => *unclassified.get_or_insert(0.0) += amount,
            Some(category) => match known.iter_mut().find(|total| total.category == category) {
                Some(total) => total.total += amount,
                None => *unknown.entry(category).or_insert(0.0) += amount,
            },
        }
    }

    known.extend(unknown.into_iter().map(|(category, total)| CategoryTotal {
        category: category.to_owned(),
        total,
    }));

    if let Some(total) = unclassified {
        known.push(CategoryTotal {
            category: UNCLASSIFIED_LABEL.to_owned(),
            total,
        });
    }

    Ok(known)
}

/// Sum income and expenses per account, sorted by account name.
///
/// Income-typed transactions count as income, every other type counts as an
/// expense. Accounts whose income and expense are both zero are left out.
///
/// # Errors
/// Returns [Error::MissingExchangeRate] if amounts cannot be shown in `currency`.
pub fn account_summary(
    transactions: &[Transaction],
    rates: &ExchangeRates,
    currency: CurrencyCode,
) -> Result<Vec<AccountTotals>, Error> {
    let mut accounts: BTreeMap<&str, (f64, f64)> = BTreeMap::new();

    for transaction in transactions {
        let amount = to_display(transaction.amount, rates, currency)?;
        let account = match transaction.account.trim() {
            "" => UNASSIGNED_ACCOUNT_LABEL,
            account => account,
        };
        let (income, expense) = accounts.entry(account).or_insert((0.0, 0.0));

        if transaction.kind == TransactionType::Income {
            *income += amount;
        } else {
            *expense += amount;
        }
    }

    Ok(accounts
        .into_iter()
        .filter(|(_, (income, expense))| *income != 0.0 || *expense != 0.0)
        .map(|(account, (income, expense))| AccountTotals {
            account: account.to_owned(),
            income,
            expense,
        })
        .collect())
}

/// Pair each expense category's budget ceiling with the actual spend.
///
/// Only expense-typed transactions count towards the actual spend. Categories
/// with no expenses are left out, so an empty list gives no lines.
///
/// # Errors
/// Returns [Error::MissingExchangeRate] if amounts cannot be shown in `currency`.
pub fn budget_vs_actual(
    transactions: &[Transaction],
    ceilings: &BudgetCeilings,
    rates: &ExchangeRates,
    currency: CurrencyCode,
) -> Result<Vec<BudgetLine>, Error> {
    let mut lines = Vec::new();

    for option in &EXPENSE_CATEGORIES {
        let mut expenses = transactions
            .iter()
            .filter(|transaction| {
                transaction.kind == TransactionType::Expense
                    && transaction.classified_category() == Some(option.label)
            })
            .peekable();

        if expenses.peek().is_none() {
            continue;
        }

        let actual = expenses
            .map(|transaction| to_display(transaction.amount, rates, currency))
            .sum::<Result<f64, Error>>()?;

        lines.push(BudgetLine {
            category: option.label,
            budget: to_display(ceilings.get(option.label), rates, currency)?,
            actual,
        });
    }

    Ok(lines)
}

/// The percentage of `goal_amount` that `current` makes up, between 0 and 100.
///
/// A goal amount of zero or less has no meaningful progress and gives zero.
pub fn progress_percentage(current: f64, goal_amount: f64) -> f64 {
    if goal_amount <= 0.0 {
        return 0.0;
    }

    let percentage = current / goal_amount * 100.0;

    if percentage.is_nan() {
        0.0
    } else {
        percentage.clamp(0.0, 100.0)
    }
}

/// Work out how far each goal is towards its goal amount.
///
/// A goal's current amount is the total of the transactions in the goal's
/// category whose type matches the goal's type. Goals with a category that is
/// not known are left out.
///
/// # Errors
/// Returns [Error::MissingExchangeRate] if amounts cannot be shown in `currency`.
pub fn goal_progress(
    goals: &[GoalSetting],
    transactions: &[Transaction],
    rates: &ExchangeRates,
    currency: CurrencyCode,
) -> Result<Vec<GoalProgress>, Error> {
    goals
        .iter()
        .filter(|goal| is_known_category(&goal.category))
        .map(|goal| {
            let transaction_type = goal.kind.transaction_type();
            let current: f64 = transactions
                .iter()
                .filter(|transaction| {
                    transaction.kind == transaction_type
                        && transaction.classified_category() == Some(goal.category.as_str())
                })
                .map(|transaction| transaction.amount)
                .sum();

            Ok(GoalProgress {
                goal: goal.clone(),
                goal_amount: to_display(goal.goal_amount, rates, currency)?,
                current: to_display(current, rates, currency)?,
                percentage: progress_percentage(current, goal.goal_amount),
            })
        })
        .collect()
}

/// Sum income, expenses, subscriptions and goal deposits and work out the net balance.
///
/// Each amount is converted before it is added.
///
/// # Errors
/// Returns [Error::MissingExchangeRate] if amounts cannot be shown in `currency`.
pub fn totals(
    transactions: &[Transaction],
    rates: &ExchangeRates,
    currency: CurrencyCode,
) -> Result<Totals, Error> {
    let mut totals = Totals::default();

    for transaction in transactions {
        let amount = to_display(transaction.amount, rates, currency)?;

        match transaction.kind {
            TransactionType::Income => totals.total_income += amount,
            TransactionType::Expense => totals.total_expenses += amount,
            TransactionType::Subscription => totals.total_subscriptions += amount,
            TransactionType::Goal => totals.total_goal_deposits += amount,
        }
    }

    totals.displayed_expenses = totals.total_expenses + totals.total_subscriptions;
    totals.net_balance = totals.total_income - totals.displayed_expenses;

    Ok(totals)
}

/// What a recurring subscription costs per month on average.
///
/// A subscription without a frequency is treated as monthly.
pub fn monthly_amount(amount: f64, frequency: Option<Frequency>) -> f64 {
    match frequency.unwrap_or(Frequency::Monthly) {
        Frequency::Weekly => amount * 52.0 / 12.0,
        Frequency::Monthly => amount,
        Frequency::Yearly => amount / 12.0,
    }
}

/// The total monthly cost of the recurring subscriptions. One-off payments are left out.
///
/// # Errors
/// Returns [Error::MissingExchangeRate] if amounts cannot be shown in `currency`.
pub fn subscription_monthly_cost(
    transactions: &[Transaction],
    rates: &ExchangeRates,
    currency: CurrencyCode,
) -> Result<f64, Error> {
    transactions
        .iter()
        .filter(|transaction| transaction.is_recurring_subscription())
        .map(|transaction| {
            to_display(
                monthly_amount(transaction.amount, transaction.frequency),
                rates,
                currency,
            )
        })
        .sum()
}
