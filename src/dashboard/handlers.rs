//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - The state and query types used by the handlers
//! - `build_dashboard_summary`, which gathers every dashboard figure from the latest snapshots
//! - Route handlers for the HTML dashboard and its JSON counterpart

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    ApiError, AppState, Error,
    account::get_total_account_balance,
    category::BudgetCeilings,
    currency::{
        Currency, CurrencyCode, ExchangeRates, STORED_CURRENCY, select_display_currency,
    },
    dashboard::{
        aggregation::{
            AccountTotals, BudgetLine, CategoryTotal, GoalProgress, Totals, account_summary,
            budget_vs_actual, category_totals, goal_progress, subscription_monthly_cost, totals,
        },
        tables::{
            account_summary_table, budget_table, calendar_grid, category_totals_table,
            goals_table, totals_cards, upcoming_list,
        },
    },
    database_id::UserId,
    db::lock_connection,
    endpoints,
    goal::{GoalSetting, get_goals},
    html::{PAGE_CONTAINER_STYLE, base, currency_picker},
    snapshot::Snapshot,
    timezone::local_today,
    todo::{Todo, get_todos},
    transaction::{Transaction, get_transactions},
    upcoming::{
        CalendarDay, PAYMENT_WINDOW, TODO_WINDOW, UpcomingPayment, calendar_month,
        upcoming_payments, upcoming_todos,
    },
};

/// The state needed for displaying the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for fetching the user's data.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The user whose dashboard is shown.
    pub user_id: UserId,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub default_currency: CurrencyCode,
    pub exchange_rates: Arc<ExchangeRates>,
    pub budget_ceilings: Arc<BudgetCeilings>,
    pub transactions: Snapshot<Transaction>,
    pub goals: Snapshot<GoalSetting>,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id,
            local_timezone: state.local_timezone.clone(),
            default_currency: state.default_currency,
            exchange_rates: state.exchange_rates.clone(),
            budget_ceilings: state.budget_ceilings.clone(),
            transactions: state.transactions.clone(),
            goals: state.goals.clone(),
        }
    }
}

/// The query parameters for the dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// The currency code to show amounts in, the server's default when missing.
    pub currency: Option<String>,
}

/// Every figure shown on the dashboard, in the display currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub currency: Currency,
    pub totals: Totals,
    pub subscription_monthly_cost: f64,
    pub total_account_balance: f64,
    pub category_totals: Vec<CategoryTotal>,
    pub account_summary: Vec<AccountTotals>,
    pub budget: Vec<BudgetLine>,
    pub goals: Vec<GoalProgress>,
    pub upcoming_todos: Vec<Todo>,
    pub upcoming_payments: Vec<PaymentDue>,
}

/// An upcoming subscription payment with its amount in the display currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDue {
    #[serde(flatten)]
    pub payment: UpcomingPayment,
    pub display_amount: f64,
}

/// The user's data that the dashboard is computed from.
struct DashboardData {
    transactions: Arc<Vec<Transaction>>,
    goals: Arc<Vec<GoalSetting>>,
    todos: Vec<Todo>,
    total_account_balance: f64,
}

/// Fetch the user's data, refreshing the transaction and goal snapshots.
///
/// If a snapshot cannot be refreshed the last successful snapshot is used.
fn fetch_dashboard_data(state: &DashboardState) -> Result<DashboardData, Error> {
    let connection = lock_connection(&state.db_connection)?;

    let transactions = state
        .transactions
        .refresh_or_current(|| get_transactions(state.user_id, &connection));
    let goals = state
        .goals
        .refresh_or_current(|| get_goals(state.user_id, &connection));
    let todos = get_todos(state.user_id, &connection)
        .inspect_err(|error| tracing::error!("Could not get to-do items: {error}"))?;
    let total_account_balance = get_total_account_balance(state.user_id, &connection)
        .inspect_err(|error| {
            tracing::error!("Could not calculate total account balance: {error}")
        })?;

    Ok(DashboardData {
        transactions,
        goals,
        todos,
        total_account_balance,
    })
}

/// Compute every dashboard figure in `currency`.
///
/// # Errors
/// Returns [Error::MissingExchangeRate] if the amounts cannot be shown in `currency`.
fn build_dashboard_summary(
    data: &DashboardData,
    today: Date,
    ceilings: &BudgetCeilings,
    rates: &ExchangeRates,
    currency: CurrencyCode,
) -> Result<DashboardSummary, Error> {
    let transactions = data.transactions.as_slice();

    Ok(DashboardSummary {
        currency: currency.into(),
        totals: totals(transactions, rates, currency)?,
        subscription_monthly_cost: subscription_monthly_cost(transactions, rates, currency)?,
        total_account_balance: rates.convert(
            data.total_account_balance,
            STORED_CURRENCY,
            currency,
        )?,
        category_totals: category_totals(transactions, rates, currency)?,
        account_summary: account_summary(transactions, rates, currency)?,
        budget: budget_vs_actual(transactions, ceilings, rates, currency)?,
        goals: goal_progress(&data.goals, transactions, rates, currency)?,
        upcoming_todos: upcoming_todos(&data.todos, today, TODO_WINDOW),
        upcoming_payments: upcoming_payments(transactions, today, PAYMENT_WINDOW)
            .into_iter()
            .map(|payment| {
                Ok(PaymentDue {
                    display_amount: rates.convert(
                        payment.transaction.amount,
                        STORED_CURRENCY,
                        currency,
                    )?,
                    payment,
                })
            })
            .collect::<Result<_, Error>>()?,
    })
}

/// Display a page with an overview of the user's finances.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Response, Error> {
    let currency = select_display_currency(
        query.currency.as_deref(),
        state.default_currency,
        &state.exchange_rates,
    )?;
    let today = local_today(&state.local_timezone)?;

    let data = fetch_dashboard_data(&state)?;
    let summary = build_dashboard_summary(
        &data,
        today,
        &state.budget_ceilings,
        &state.exchange_rates,
        currency,
    )?;
    let calendar = calendar_month(today.year(), today.month(), &data.todos, &data.transactions)?;

    Ok(dashboard_view(&summary, &calendar).into_response())
}

/// The dashboard figures as JSON.
pub async fn get_dashboard_summary_endpoint(
    State(state): State<DashboardState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardSummary>, ApiError> {
    let currency = select_display_currency(
        query.currency.as_deref(),
        state.default_currency,
        &state.exchange_rates,
    )?;
    let today = local_today(&state.local_timezone)?;

    let data = fetch_dashboard_data(&state)?;
    let summary = build_dashboard_summary(
        &data,
        today,
        &state.budget_ceilings,
        &state.exchange_rates,
        currency,
    )?;

    Ok(Json(summary))
}

fn dashboard_view(summary: &DashboardSummary, calendar: &[CalendarDay]) -> Markup {
    let currency = summary.currency.code;

    let content = html!(
        div
            id="dashboard-content"
            class={(PAGE_CONTAINER_STYLE) " max-w-screen-xl space-y-8"}
        {
            div class="flex w-full justify-between items-center"
            {
                h1 class="text-2xl font-bold" { "Dashboard" }

                (currency_picker(currency, |code| {
                    format!("{}?currency={code}", endpoints::DASHBOARD_VIEW)
                }))
            }

            (totals_cards(
                &summary.totals,
                summary.subscription_monthly_cost,
                summary.total_account_balance,
                currency,
            ))

            (upcoming_list(&summary.upcoming_todos, &summary.upcoming_payments, currency))

            div class="grid grid-cols-1 xl:grid-cols-2 gap-4 w-full"
            {
                (budget_table(&summary.budget, currency))
                (goals_table(&summary.goals, currency))
                (account_summary_table(&summary.account_summary, currency))
                (category_totals_table(&summary.category_totals, currency))
            }

            (calendar_grid(calendar))
        }
    );

    base("Dashboard", &content)
}
