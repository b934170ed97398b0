//! CSV reports of a user's transactions.

use axum::{
    extract::{Query, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::Deserialize;

use crate::{
    ApiError, Error,
    dates::format_display_date,
    db::lock_connection,
    transaction::{Transaction, TransactionState, TransactionType, get_transactions},
};

/// Which transactions a report includes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum ReportCategory {
    #[default]
    #[serde(alias = "all")]
    All,
    #[serde(alias = "income")]
    Income,
    #[serde(alias = "expense")]
    Expense,
    #[serde(alias = "subscriptions")]
    Subscriptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Type,
    Source,
    Category,
    Amount,
    Date,
    Account,
    SubscriptionType,
    Frequency,
}

const BASIC_COLUMNS: [Column; 6] = [
    Column::Type,
    Column::Source,
    Column::Category,
    Column::Amount,
    Column::Date,
    Column::Account,
];

const SUBSCRIPTION_COLUMNS: [Column; 8] = [
    Column::Type,
    Column::Source,
    Column::Category,
    Column::Amount,
    Column::Date,
    Column::Account,
    Column::SubscriptionType,
    Column::Frequency,
];

impl ReportCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportCategory::All => "All",
            ReportCategory::Income => "Income",
            ReportCategory::Expense => "Expense",
            ReportCategory::Subscriptions => "Subscriptions",
        }
    }

    /// The name the report is downloaded as, e.g. "all_reports.csv".
    pub fn file_name(self) -> String {
        format!("{}_reports.csv", self.as_str().to_lowercase())
    }

    fn includes(self, transaction: &Transaction) -> bool {
        match self {
            ReportCategory::All => true,
            ReportCategory::Income => transaction.kind == TransactionType::Income,
            ReportCategory::Expense => transaction.kind == TransactionType::Expense,
            ReportCategory::Subscriptions => transaction.kind == TransactionType::Subscription,
        }
    }

    fn columns(self) -> &'static [Column] {
        match self {
            ReportCategory::All | ReportCategory::Subscriptions => &SUBSCRIPTION_COLUMNS,
            ReportCategory::Income | ReportCategory::Expense => &BASIC_COLUMNS,
        }
    }
}

impl Column {
    fn field_name(self) -> &'static str {
        match self {
            Column::Type => "type",
            Column::Source => "source",
            Column::Category => "category",
            Column::Amount => "amount",
            Column::Date => "date",
            Column::Account => "account",
            Column::SubscriptionType => "subscriptionType",
            Column::Frequency => "frequency",
        }
    }

    fn value(self, transaction: &Transaction) -> String {
        match self {
            Column::Type => transaction.kind.as_str().to_owned(),
            Column::Source => transaction.source.clone(),
            Column::Category => transaction.category.clone().unwrap_or_default(),
            Column::Amount => transaction.amount.to_string(),
            Column::Date => transaction
                .date
                .map(format_display_date)
                .unwrap_or_default(),
            Column::Account => transaction.account.clone(),
            Column::SubscriptionType => transaction
                .subscription_type
                .map(|subscription_type| subscription_type.as_str().to_owned())
                .unwrap_or_default(),
            Column::Frequency => transaction
                .frequency
                .map(|frequency| frequency.as_str().to_owned())
                .unwrap_or_default(),
        }
    }
}

/// Turn a camel case field name into a header label, e.g. "subscriptionType"
/// becomes "Subscription Type".
pub fn header_label(field_name: &str) -> String {
    let mut label = String::with_capacity(field_name.len() + 4);

    for (index, character) in field_name.chars().enumerate() {
        if index == 0 {
            label.extend(character.to_uppercase());
        } else {
            if character.is_uppercase() {
                label.push(' ');
            }
            label.push(character);
        }
    }

    label
}

/// Write the transactions that `category` includes as CSV.
///
/// Fields containing a comma, quote or line break are quoted with inner
/// quotes doubled. Rows are separated by `\n`. If no transactions are
/// included the report is empty, without a header row.
///
/// # Errors
/// Returns [Error::CsvError] if the CSV could not be written.
pub fn export_csv(transactions: &[Transaction], category: ReportCategory) -> Result<String, Error> {
    let selected: Vec<&Transaction> = transactions
        .iter()
        .filter(|transaction| category.includes(transaction))
        .collect();

    if selected.is_empty() {
        return Ok(String::new());
    }

    let columns = category.columns();
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(columns.iter().map(|column| header_label(column.field_name())))
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for transaction in selected {
        writer
            .write_record(columns.iter().map(|column| column.value(transaction)))
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;
    let mut text = String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))?;

    // Rows are joined by line breaks, there is no trailing line break.
    if text.ends_with('\n') {
        text.pop();
    }

    Ok(text)
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub category: ReportCategory,
}

/// Download the user's transactions as a CSV report.
pub async fn export_transactions_endpoint(
    State(state): State<TransactionState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let connection = lock_connection(&state.db_connection)?;
    let transactions = state
        .transactions
        .refresh_or_current(|| get_transactions(state.user_id, &connection));
    drop(connection);

    let body = export_csv(&transactions, query.category)?;
    let disposition = format!("attachment; filename=\"{}\"", query.category.file_name());

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::transaction::{Frequency, SubscriptionType, Transaction, TransactionType};

    use super::{ReportCategory, export_csv, header_label};

    fn create_test_transaction(id: i64, kind: TransactionType, source: &str) -> Transaction {
        Transaction {
            id,
            kind,
            source: source.to_owned(),
            category: Some("Food".to_owned()),
            amount: 12.5,
            date: Some(date!(2025 - 03 - 09)),
            account: "HSBC".to_owned(),
            frequency: None,
            next_payment: None,
            subscription_type: None,
        }
    }

    #[test]
    fn header_labels_are_readable() {
        assert_eq!(header_label("type"), "Type");
        assert_eq!(header_label("subscriptionType"), "Subscription Type");
        assert_eq!(header_label("nextPayment"), "Next Payment");
    }

    #[test]
    fn file_name_is_lowercase() {
        assert_eq!(ReportCategory::All.file_name(), "all_reports.csv");
        assert_eq!(
            ReportCategory::Subscriptions.file_name(),
            "subscriptions_reports.csv"
        );
    }

    #[test]
    fn income_report_has_six_columns() {
        let transactions = vec![
            create_test_transaction(1, TransactionType::Income, "Payday"),
            create_test_transaction(2, TransactionType::Expense, "Groceries"),
        ];

        let csv = export_csv(&transactions, ReportCategory::Income).unwrap();

        assert_eq!(
            csv,
            "Type,Source,Category,Amount,Date,Account\nincome,Payday,Food,12.5,09-03-2025,HSBC"
        );
    }

    #[test]
    fn subscription_report_includes_subscription_fields() {
        let transactions = vec![Transaction {
            frequency: Some(Frequency::Monthly),
            subscription_type: Some(SubscriptionType::OneOff),
            category: None,
            date: None,
            ..create_test_transaction(1, TransactionType::Subscription, "Netflix")
        }];

        let csv = export_csv(&transactions, ReportCategory::Subscriptions).unwrap();

        assert_eq!(
            csv,
            "Type,Source,Category,Amount,Date,Account,Subscription Type,Frequency\n\
             subscription,Netflix,,12.5,,HSBC,One Off,Monthly"
        );
    }

    #[test]
    fn empty_selection_gives_empty_report() {
        let transactions = vec![create_test_transaction(1, TransactionType::Goal, "Savings")];

        assert_eq!(export_csv(&transactions, ReportCategory::Expense), Ok(String::new()));
        assert_eq!(export_csv(&[], ReportCategory::All), Ok(String::new()));
    }

    #[test]
    fn sources_with_commas_and_quotes_survive() {
        let source = "Smith, \"Bob\" & Sons\nLtd";
        let transactions = vec![create_test_transaction(1, TransactionType::Expense, source)];

        let csv = export_csv(&transactions, ReportCategory::All).unwrap();
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let records: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();

        assert!(csv.contains("\"Smith, \"\"Bob\"\" & Sons\nLtd\""));
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][1], source);
        assert_eq!(&records[0][3], "12.5");
    }
}

#[cfg(test)]
mod endpoint_tests {
    use axum::{
        Router,
        http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        routing::get,
    };
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState, CurrencyCode, Settings, endpoints,
        transaction::{Transaction, TransactionType, save_transaction},
    };

    use super::export_transactions_endpoint;

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            1,
            "Etc/UTC",
            CurrencyCode::USD,
            Settings::default(),
        )
        .unwrap();

        {
            let connection = state.db_connection.lock().unwrap();
            save_transaction(
                Transaction::build(TransactionType::Income, 1000.0, None, "Payday")
                    .category("Salary"),
                1,
                &connection,
            )
            .unwrap();
        }

        let app = Router::new()
            .route(endpoints::EXPORT_API, get(export_transactions_endpoint))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn downloads_report_as_attachment() {
        let server = get_test_server();

        let response = server
            .get(endpoints::EXPORT_API)
            .add_query_param("category", "Income")
            .await;

        response.assert_status_ok();
        assert_eq!(
            response.header(CONTENT_DISPOSITION),
            "attachment; filename=\"income_reports.csv\""
        );
        assert_eq!(response.header(CONTENT_TYPE), "text/csv; charset=utf-8");
        assert_eq!(
            response.text(),
            "Type,Source,Category,Amount,Date,Account\nincome,Payday,Salary,1000,,"
        );
    }

    #[tokio::test]
    async fn defaults_to_all_transactions() {
        let server = get_test_server();

        let response = server.get(endpoints::EXPORT_API).await;

        response.assert_status_ok();
        assert_eq!(
            response.header(CONTENT_DISPOSITION),
            "attachment; filename=\"all_reports.csv\""
        );
    }
}
