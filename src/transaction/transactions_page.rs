//! The page listing the transactions of one category, linked from the dashboard.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    currency::{CurrencyCode, ExchangeRates, STORED_CURRENCY, format_currency, select_display_currency},
    database_id::UserId,
    dates::format_display_date,
    db::lock_connection,
    endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, currency_picker, empty_message,
    },
    snapshot::Snapshot,
    transaction::{Transaction, get_transactions},
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    db_connection: Arc<Mutex<Connection>>,
    user_id: UserId,
    default_currency: CurrencyCode,
    exchange_rates: Arc<ExchangeRates>,
    transactions: Snapshot<Transaction>,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id,
            default_currency: state.default_currency,
            exchange_rates: state.exchange_rates.clone(),
            transactions: state.transactions.clone(),
        }
    }
}

/// The query parameters for the transactions page.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// Only list transactions with this category label, e.g. "Food" or "Unclassified".
    pub category: Option<String>,
    /// The currency code to show amounts in.
    pub currency: Option<String>,
}

/// A transaction row with its amount converted for display.
struct TransactionRow {
    date: String,
    kind: &'static str,
    source: String,
    category: String,
    account: String,
    amount: String,
}

/// Render the user's transactions, optionally only those in one category.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let currency = select_display_currency(
        query.currency.as_deref(),
        state.default_currency,
        &state.exchange_rates,
    )?;

    let transactions = {
        let connection = lock_connection(&state.db_connection)?;

        state
            .transactions
            .refresh_or_current(|| get_transactions(state.user_id, &connection))
    };

    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|category| !category.is_empty());

    let mut total = 0.0;
    let mut rows = Vec::new();

    for transaction in transactions
        .iter()
        .filter(|transaction| category.is_none_or(|category| transaction.category_label() == category))
    {
        let amount = state
            .exchange_rates
            .convert(transaction.amount, STORED_CURRENCY, currency)?;
        total += amount;

        rows.push(TransactionRow {
            date: transaction.date.map(format_display_date).unwrap_or_default(),
            kind: transaction.kind.as_str(),
            source: transaction.source.clone(),
            category: transaction.category_label().to_owned(),
            account: transaction.account.clone(),
            amount: format_currency(amount, currency),
        });
    }

    Ok(transactions_view(category, currency, &rows, total).into_response())
}

fn transactions_view(
    category: Option<&str>,
    currency: CurrencyCode,
    rows: &[TransactionRow],
    total: f64,
) -> Markup {
    let heading = match category {
        Some(category) => format!("{category} transactions"),
        None => "All transactions".to_owned(),
    };

    let content = html! {
        div class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-4"
            {
                a href={ (endpoints::DASHBOARD_VIEW) "?currency=" (currency) } class=(LINK_STYLE)
                {
                    "Back to dashboard"
                }

                h1 class="text-2xl font-bold" { (heading) }

                (currency_picker(currency, |code| match category {
                    Some(category) => endpoints::category_transactions_url(category, code),
                    None => format!("{}?currency={code}", endpoints::TRANSACTIONS_VIEW),
                }))

                @if rows.is_empty()
                {
                    (empty_message("No transactions found."))
                }
                @else
                {
                    table class="w-full text-sm text-left"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Source" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for row in rows
                            {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (row.date) }
                                    td class=(TABLE_CELL_STYLE) { (row.kind) }
                                    td class=(TABLE_CELL_STYLE) { (row.source) }
                                    td class=(TABLE_CELL_STYLE) { (row.category) }
                                    td class=(TABLE_CELL_STYLE) { (row.account) }
                                    td class=(TABLE_CELL_STYLE) data-amount { (row.amount) }
                                }
                            }
                        }

                        tfoot
                        {
                            tr class="font-semibold"
                            {
                                td class=(TABLE_CELL_STYLE) colspan="5" { "Total" }
                                td class=(TABLE_CELL_STYLE) data-total { (format_currency(total, currency)) }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Transactions", &content)
}

#[cfg(test)]
mod tests {
    use axum::{
        extract::{FromRef, Query, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        AppState, CurrencyCode, Error, Settings,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{Transaction, TransactionType, save_transaction},
    };

    use super::{TransactionsQuery, TransactionsViewState, get_transactions_page};

    fn get_test_state() -> AppState {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            1,
            "Etc/UTC",
            CurrencyCode::USD,
            Settings::default(),
        )
        .unwrap();

        {
            let conn = state.db_connection.lock().unwrap();
            for (kind, amount, category) in [
                (TransactionType::Expense, 150.0, Some("Food")),
                (TransactionType::Expense, 50.0, Some("Food")),
                (TransactionType::Income, 1000.0, Some("Salary")),
                (TransactionType::Expense, 5.0, None),
            ] {
                let mut builder =
                    Transaction::build(kind, amount, Some(date!(2025 - 10 - 05)), "Somewhere");
                if let Some(category) = category {
                    builder = builder.category(category);
                }
                save_transaction(builder, 1, &conn).unwrap();
            }
        }

        state
    }

    fn query(category: Option<&str>, currency: Option<&str>) -> Query<TransactionsQuery> {
        Query(TransactionsQuery {
            category: category.map(str::to_owned),
            currency: currency.map(str::to_owned),
        })
    }

    fn select_text(document: &scraper::Html, selector: &str) -> Vec<String> {
        let selector = Selector::parse(selector).unwrap();
        document
            .select(&selector)
            .map(|element| element.text().collect::<String>().trim().to_owned())
            .collect()
    }

    #[tokio::test]
    async fn lists_category_in_display_currency() {
        let state = get_test_state();

        let response = get_transactions_page(
            State(TransactionsViewState::from_ref(&state)),
            query(Some("Food"), Some("GBP")),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(
            select_text(&document, "td[data-amount]"),
            vec!["£41.00", "£123.00"]
        );
        assert_eq!(select_text(&document, "td[data-total]"), vec!["£164.00"]);
    }

    #[tokio::test]
    async fn lists_unclassified_transactions() {
        let state = get_test_state();

        let response = get_transactions_page(
            State(TransactionsViewState::from_ref(&state)),
            query(Some("Unclassified"), None),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(select_text(&document, "td[data-amount]"), vec!["$5.00"]);
    }

    #[tokio::test]
    async fn lists_everything_without_category() {
        let state = get_test_state();

        let response = get_transactions_page(
            State(TransactionsViewState::from_ref(&state)),
            query(None, None),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(select_text(&document, "td[data-amount]").len(), 4);
        assert_eq!(select_text(&document, "td[data-total]"), vec!["$1,205.00"]);
    }

    #[tokio::test]
    async fn currency_without_rate_fails_closed() {
        let state = get_test_state();

        let result = get_transactions_page(
            State(TransactionsViewState::from_ref(&state)),
            query(Some("Food"), Some("SGD")),
        )
        .await;

        let error = result.unwrap_err();
        assert_eq!(
            error,
            Error::MissingExchangeRate {
                from: CurrencyCode::USD,
                to: CurrencyCode::SGD
            }
        );
        assert_eq!(
            error.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
