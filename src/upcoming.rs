//! Upcoming to-do items and subscription payments, and the calendar month view.
//!
//! Records without a readable date are left out of every view in this module.

use serde::Serialize;
use time::{Date, Duration, Month};

use crate::{
    Error,
    dates::{add_months, iso_date},
    todo::Todo,
    transaction::{Frequency, Transaction, TransactionType},
};

/// A range of calendar days around today, inclusive at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpcomingWindow {
    pub look_back_days: i64,
    pub look_ahead_days: i64,
}

/// To-do items due today or within the next week.
pub const TODO_WINDOW: UpcomingWindow = UpcomingWindow {
    look_back_days: 0,
    look_ahead_days: 7,
};

/// Subscription payments due today or within the next 30 days.
pub const PAYMENT_WINDOW: UpcomingWindow = UpcomingWindow {
    look_back_days: 0,
    look_ahead_days: 30,
};

impl UpcomingWindow {
    /// Whether `date` falls inside the window around `today`.
    pub fn contains(self, today: Date, date: Date) -> bool {
        let days = (date - today).whole_days();

        -self.look_back_days <= days && days <= self.look_ahead_days
    }
}

/// A subscription payment and the date it falls due.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingPayment {
    pub transaction: Transaction,
    #[serde(with = "iso_date")]
    pub due_date: Date,
}

/// The to-do items that are not completed and are due inside `window`,
/// soonest first.
pub fn upcoming_todos(todos: &[Todo], today: Date, window: UpcomingWindow) -> Vec<Todo> {
    let mut upcoming: Vec<Todo> = todos
        .iter()
        .filter(|todo| !todo.completed)
        .filter(|todo| {
            todo.due_date
                .is_some_and(|due_date| window.contains(today, due_date))
        })
        .cloned()
        .collect();

    upcoming.sort_by_key(|todo| (todo.due_date, todo.id));
    upcoming
}

/// The subscription payments that fall due inside `window`, soonest first.
pub fn upcoming_payments(
    transactions: &[Transaction],
    today: Date,
    window: UpcomingWindow,
) -> Vec<UpcomingPayment> {
    let mut upcoming: Vec<UpcomingPayment> = transactions
        .iter()
        .filter(|transaction| transaction.kind == TransactionType::Subscription)
        .filter_map(|transaction| {
            let due_date = next_due_date(transaction, today)?;

            window.contains(today, due_date).then(|| UpcomingPayment {
                transaction: transaction.clone(),
                due_date,
            })
        })
        .collect();

    upcoming.sort_by_key(|payment| (payment.due_date, payment.transaction.id));
    upcoming
}

/// When a subscription is next due.
///
/// Starts from the stored next payment date, or the transaction date when
/// there is none. A recurring subscription whose start has passed is rolled
/// forward by its frequency until it lands on or after `today`. A one-off
/// payment is due on its start date.
/// Returns `None` when the transaction has no usable date.
pub fn next_due_date(transaction: &Transaction, today: Date) -> Option<Date> {
    let date = transaction.next_payment.or(transaction.date)?;

    if !transaction.is_recurring_subscription() || date >= today {
        return Some(date);
    }

    let frequency = transaction.frequency.unwrap_or(Frequency::Monthly);

    // Jump close to today first so that old subscriptions do not take a
    // step per period.
    let elapsed_days = (today - date).whole_days();
    let estimate = match frequency {
        Frequency::Weekly => elapsed_days / 7,
        Frequency::Monthly => elapsed_days / 31,
        Frequency::Yearly => elapsed_days / 366,
    };

    (estimate..)
        .map(|period| nth_occurrence(date, frequency, period))
        .take_while(Option::is_some)
        .flatten()
        .find(|occurrence| *occurrence >= today)
}

/// The date `period` payments after `start`.
///
/// Months are counted from `start` each time so that a payment on the 31st
/// returns to the 31st after a shorter month.
fn nth_occurrence(start: Date, frequency: Frequency, period: i64) -> Option<Date> {
    match frequency {
        Frequency::Weekly => start.checked_add(Duration::weeks(period)),
        Frequency::Monthly => add_months(start, u32::try_from(period).ok()?),
        Frequency::Yearly => add_months(start, u32::try_from(period.checked_mul(12)?).ok()?),
    }
}

/// The payment dates of a subscription between `first` and `last` inclusive.
fn payment_dates_between(transaction: &Transaction, first: Date, last: Date) -> Vec<Date> {
    let Some(start) = transaction.next_payment.or(transaction.date) else {
        return Vec::new();
    };

    if !transaction.is_recurring_subscription() {
        return if (first..=last).contains(&start) {
            vec![start]
        } else {
            Vec::new()
        };
    }

    let frequency = transaction.frequency.unwrap_or(Frequency::Monthly);

    (0..)
        .map(|period| nth_occurrence(start, frequency, period))
        .take_while(|occurrence| occurrence.is_some_and(|date| date <= last))
        .flatten()
        .filter(|date| *date >= first)
        .collect()
}

/// One day of a calendar month with what falls on it.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarDay {
    pub date: Date,
    pub todos: Vec<Todo>,
    pub payments: Vec<Transaction>,
}

/// Lay out every day of a month with the to-do items due and the
/// subscription payments falling on that day.
///
/// Payments of recurring subscriptions repeat on each day their schedule
/// lands on within the month.
///
/// # Errors
/// Returns [Error::InvalidDate] if the year is outside the supported range.
pub fn calendar_month(
    year: i32,
    month: Month,
    todos: &[Todo],
    transactions: &[Transaction],
) -> Result<Vec<CalendarDay>, Error> {
    let invalid_month = || Error::InvalidDate(format!("{month} {year}"));
    let first = Date::from_calendar_date(year, month, 1).map_err(|_| invalid_month())?;
    let last = Date::from_calendar_date(year, month, month.length(year))
        .map_err(|_| invalid_month())?;

    let mut days: Vec<CalendarDay> = (1..=month.length(year))
        .filter_map(|day| Date::from_calendar_date(year, month, day).ok())
        .map(|date| CalendarDay {
            date,
            todos: Vec::new(),
            payments: Vec::new(),
        })
        .collect();

    let day_index = |date: Date| usize::from(date.day()) - 1;

    for todo in todos {
        if let Some(due_date) = todo.due_date.filter(|date| (first..=last).contains(date)) {
            days[day_index(due_date)].todos.push(todo.clone());
        }
    }

    for transaction in transactions
        .iter()
        .filter(|transaction| transaction.kind == TransactionType::Subscription)
    {
        for date in payment_dates_between(transaction, first, last) {
            days[day_index(date)].payments.push(transaction.clone());
        }
    }

    Ok(days)
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::date};

    use crate::{
        todo::{Priority, Todo},
        transaction::{Frequency, SubscriptionType, Transaction, TransactionType},
    };

    use super::{
        PAYMENT_WINDOW, TODO_WINDOW, calendar_month, next_due_date, upcoming_payments,
        upcoming_todos,
    };

    fn create_test_todo(id: i64, due_date: Option<time::Date>, completed: bool) -> Todo {
        Todo {
            id,
            task: format!("Task {id}"),
            priority: Priority::Medium,
            due_date,
            completed,
        }
    }

    fn create_test_subscription(
        id: i64,
        date: Option<time::Date>,
        frequency: Option<Frequency>,
        next_payment: Option<time::Date>,
    ) -> Transaction {
        Transaction {
            id,
            kind: TransactionType::Subscription,
            source: format!("Subscription {id}"),
            category: Some("Netflix".to_owned()),
            amount: 9.99,
            date,
            account: String::new(),
            frequency,
            next_payment,
            subscription_type: Some(SubscriptionType::Recurring),
        }
    }

    #[test]
    fn todo_window_is_inclusive() {
        let today = date!(2025 - 06 - 10);
        let todos = vec![
            create_test_todo(1, Some(date!(2025 - 06 - 17)), false),
            create_test_todo(2, Some(date!(2025 - 06 - 10)), false),
            create_test_todo(3, Some(date!(2025 - 06 - 18)), false),
            create_test_todo(4, Some(date!(2025 - 06 - 09)), false),
            create_test_todo(5, Some(date!(2025 - 06 - 12)), true),
            create_test_todo(6, None, false),
        ];

        let ids: Vec<_> = upcoming_todos(&todos, today, TODO_WINDOW)
            .iter()
            .map(|todo| todo.id)
            .collect();

        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn stored_next_payment_is_used() {
        let subscription = create_test_subscription(
            1,
            Some(date!(2024 - 01 - 05)),
            Some(Frequency::Monthly),
            Some(date!(2025 - 06 - 20)),
        );

        assert_eq!(
            next_due_date(&subscription, date!(2025 - 06 - 10)),
            Some(date!(2025 - 06 - 20))
        );
    }

    #[test]
    fn past_next_payment_rolls_forward() {
        let today = date!(2025 - 06 - 10);
        let subscription = create_test_subscription(
            1,
            Some(date!(2024 - 01 - 05)),
            Some(Frequency::Monthly),
            Some(date!(2025 - 03 - 20)),
        );

        assert_eq!(next_due_date(&subscription, today), Some(date!(2025 - 06 - 20)));
        assert_eq!(
            upcoming_payments(&[subscription], today, PAYMENT_WINDOW)[0].due_date,
            date!(2025 - 06 - 20)
        );
    }

    #[test]
    fn recurring_subscription_rolls_forward() {
        let today = date!(2025 - 06 - 10);

        let monthly = create_test_subscription(1, Some(date!(2024 - 01 - 31)), None, None);
        let weekly =
            create_test_subscription(2, Some(date!(2025 - 05 - 01)), Some(Frequency::Weekly), None);
        let yearly =
            create_test_subscription(3, Some(date!(2020 - 06 - 10)), Some(Frequency::Yearly), None);

        assert_eq!(next_due_date(&monthly, today), Some(date!(2025 - 06 - 30)));
        assert_eq!(next_due_date(&weekly, today), Some(date!(2025 - 06 - 12)));
        assert_eq!(next_due_date(&yearly, today), Some(date!(2025 - 06 - 10)));
    }

    #[test]
    fn one_off_payment_is_due_on_its_date() {
        let one_off = Transaction {
            subscription_type: Some(SubscriptionType::OneOff),
            ..create_test_subscription(1, Some(date!(2025 - 01 - 01)), None, None)
        };

        assert_eq!(
            next_due_date(&one_off, date!(2025 - 06 - 10)),
            Some(date!(2025 - 01 - 01))
        );
    }

    #[test]
    fn payments_without_dates_are_skipped() {
        let today = date!(2025 - 06 - 10);
        let transactions = vec![
            create_test_subscription(1, None, None, None),
            create_test_subscription(2, Some(date!(2025 - 05 - 15)), None, None),
            create_test_subscription(3, Some(date!(2025 - 01 - 01)), Some(Frequency::Yearly), None),
        ];

        let payments = upcoming_payments(&transactions, today, PAYMENT_WINDOW);

        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].transaction.id, 2);
        assert_eq!(payments[0].due_date, date!(2025 - 06 - 15));
    }

    #[test]
    fn non_subscriptions_are_never_upcoming_payments() {
        let expense = Transaction {
            kind: TransactionType::Expense,
            ..create_test_subscription(1, Some(date!(2025 - 06 - 11)), None, None)
        };

        assert!(upcoming_payments(&[expense], date!(2025 - 06 - 10), PAYMENT_WINDOW).is_empty());
    }

    #[test]
    fn calendar_month_places_todos_and_payments() {
        let todos = vec![
            create_test_todo(1, Some(date!(2025 - 02 - 14)), false),
            create_test_todo(2, Some(date!(2025 - 03 - 01)), false),
        ];
        let transactions = vec![
            create_test_subscription(1, Some(date!(2025 - 01 - 31)), Some(Frequency::Monthly), None),
            create_test_subscription(2, Some(date!(2025 - 02 - 03)), Some(Frequency::Weekly), None),
        ];

        let days = calendar_month(2025, Month::February, &todos, &transactions).unwrap();

        assert_eq!(days.len(), 28);
        assert_eq!(days[13].todos.len(), 1);
        assert_eq!(days[27].payments.len(), 1);
        let weekly_days: Vec<u8> = days
            .iter()
            .filter(|day| day.payments.iter().any(|payment| payment.id == 2))
            .map(|day| day.date.day())
            .collect();
        assert_eq!(weekly_days, vec![3, 10, 17, 24]);
    }
}
