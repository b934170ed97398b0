//! Table and card views for the dashboard.

use maud::{Markup, html};

use crate::{
    category::find_category,
    currency::{CurrencyCode, format_currency, format_currency_rounded},
    dashboard::{
        aggregation::{
            AccountTotals, BudgetLine, CategoryTotal, GoalProgress, Totals, progress_percentage,
        },
        handlers::PaymentDue,
    },
    dates::format_display_date,
    endpoints,
    html::{
        CARD_STYLE, LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        empty_message,
    },
    todo::Todo,
    upcoming::CalendarDay,
};

const TABLE_STYLE: &str = "w-full text-sm text-left text-gray-500 dark:text-gray-400";
const SECTION_HEADING_STYLE: &str = "text-xl font-semibold mb-4";
const CELL_GREEN_STYLE: &str = "text-green-600 dark:text-green-400";
const CELL_RED_STYLE: &str = "text-red-600 dark:text-red-400";

fn amount_color_class(amount: f64) -> &'static str {
    if amount >= 0.0 {
        CELL_GREEN_STYLE
    } else {
        CELL_RED_STYLE
    }
}

/// The headline cards: income, expenses (with subscriptions), net balance and account balance.
pub(super) fn totals_cards(
    totals: &Totals,
    subscription_monthly_cost: f64,
    total_account_balance: f64,
    currency: CurrencyCode,
) -> Markup {
    let card = |id: &str, label: &str, amount: f64, color: &str| {
        html! {
            div class=(CARD_STYLE) id=(id)
            {
                p class="text-sm text-gray-500 dark:text-gray-400" { (label) }
                p class={"text-2xl font-bold " (color)} data-amount { (format_currency(amount, currency)) }
            }
        }
    };

    html! {
        div class="grid grid-cols-2 lg:grid-cols-3 gap-4 w-full"
        {
            (card("total-income", "Total Income", totals.total_income, CELL_GREEN_STYLE))
            (card("total-expenses", "Total Expenses", totals.displayed_expenses, CELL_RED_STYLE))
            (card("net-balance", "Net Balance", totals.net_balance, amount_color_class(totals.net_balance)))
            (card("goal-deposits", "Saved Towards Goals", totals.total_goal_deposits, ""))
            (card("subscription-cost", "Subscriptions per Month", subscription_monthly_cost, CELL_RED_STYLE))
            (card("account-balance", "Account Balance", total_account_balance, amount_color_class(total_account_balance)))
        }
    }
}

/// Budget ceiling against actual spend for each expense category with spending.
///
/// Each category links to the page listing its transactions.
pub(super) fn budget_table(lines: &[BudgetLine], currency: CurrencyCode) -> Markup {
    html! {
        section id="budget" class="w-full"
        {
            h3 class=(SECTION_HEADING_STYLE) { "Budget vs Spending" }

            @if lines.is_empty()
            {
                (empty_message("No spending recorded yet."))
            }
            @else
            {
                table class=(TABLE_STYLE)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Budget" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Spent" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Used" }
                        }
                    }

                    tbody
                    {
                        @for line in lines
                        {
                            @let spent_style = if line.actual > line.budget { CELL_RED_STYLE } else { "" };

                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class=(TABLE_CELL_STYLE)
                                {
                                    a href=(endpoints::category_transactions_url(line.category, currency)) class=(LINK_STYLE)
                                    {
                                        (line.category)
                                    }
                                }
                                td class=(TABLE_CELL_STYLE) { (format_currency(line.budget, currency)) }
                                td class={(TABLE_CELL_STYLE) " " (spent_style)}
                                {
                                    (format_currency(line.actual, currency))
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (progress_bar(progress_percentage(line.actual, line.budget)))
                                    span class="text-xs" data-budget-used
                                    {
                                        (format_currency_rounded(line.actual, currency))
                                        " / "
                                        (format_currency_rounded(line.budget, currency))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// The total for every category, including those with nothing recorded.
pub(super) fn category_totals_table(totals: &[CategoryTotal], currency: CurrencyCode) -> Markup {
    html! {
        section id="category-totals" class="w-full"
        {
            h3 class=(SECTION_HEADING_STYLE) { "Totals by Category" }

            table class=(TABLE_STYLE)
            {
                thead class=(TABLE_HEADER_STYLE)
                {
                    tr
                    {
                        th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                        th scope="col" class=(TABLE_CELL_STYLE) { "Total" }
                    }
                }

                tbody
                {
                    @for total in totals
                    {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class=(TABLE_CELL_STYLE)
                            {
                                a href=(endpoints::category_transactions_url(&total.category, currency)) class=(LINK_STYLE)
                                {
                                    (total.category)
                                }
                            }
                            td class=(TABLE_CELL_STYLE) { (format_currency(total.total, currency)) }
                        }
                    }
                }
            }
        }
    }
}

pub(super) fn account_summary_table(accounts: &[AccountTotals], currency: CurrencyCode) -> Markup {
    html! {
        section id="accounts" class="w-full"
        {
            h3 class=(SECTION_HEADING_STYLE) { "Accounts" }

            @if accounts.is_empty()
            {
                (empty_message("No account activity yet."))
            }
            @else
            {
                table class=(TABLE_STYLE)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Income" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Expense" }
                        }
                    }

                    tbody
                    {
                        @for account in accounts
                        {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class=(TABLE_CELL_STYLE) { (account.account) }
                                td class={(TABLE_CELL_STYLE) " " (CELL_GREEN_STYLE)} { (format_currency(account.income, currency)) }
                                td class={(TABLE_CELL_STYLE) " " (CELL_RED_STYLE)} { (format_currency(account.expense, currency)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn progress_bar(percentage: f64) -> Markup {
    html! {
        div class="w-full bg-gray-200 rounded-full h-2.5 dark:bg-gray-700"
        {
            div
                class="bg-blue-600 h-2.5 rounded-full"
                style=(format!("width: {percentage:.0}%"))
            {}
        }
    }
}

pub(super) fn goals_table(goals: &[GoalProgress], currency: CurrencyCode) -> Markup {
    html! {
        section id="goals" class="w-full"
        {
            h3 class=(SECTION_HEADING_STYLE) { "Goals" }

            @if goals.is_empty()
            {
                (empty_message("No goals set."))
            }
            @else
            {
                table class=(TABLE_STYLE)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Goal" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Progress" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Target Date" }
                        }
                    }

                    tbody
                    {
                        @for progress in goals
                        {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                th scope="row" class=(TABLE_CELL_STYLE)
                                {
                                    @let goal_view = find_category(&progress.goal.category)
                                        .and_then(|option| option.goal.label());

                                    (progress.goal.name)
                                    p class="text-xs"
                                    {
                                        (progress.goal.category)
                                        @if let Some(goal_view) = goal_view
                                        {
                                            " (" (goal_view) ")"
                                        }
                                    }
                                }
                                td class=(TABLE_CELL_STYLE) { (progress.goal.status.as_str()) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (progress_bar(progress.percentage))
                                    span data-progress
                                    {
                                        (format_currency(progress.current, currency))
                                        " of "
                                        (format_currency(progress.goal_amount, currency))
                                        " (" (format!("{:.0}", progress.percentage)) "%)"
                                    }
                                }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    (progress.goal.target_date.map(format_display_date).unwrap_or_default())
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// To-do items and subscription payments coming up soon.
pub(super) fn upcoming_list(
    todos: &[Todo],
    payments: &[PaymentDue],
    currency: CurrencyCode,
) -> Markup {
    html! {
        section id="upcoming" class="w-full grid grid-cols-1 lg:grid-cols-2 gap-4"
        {
            div class=(CARD_STYLE)
            {
                h3 class=(SECTION_HEADING_STYLE) { "Upcoming To-dos" }

                @if todos.is_empty()
                {
                    (empty_message("Nothing due this week."))
                }
                @else
                {
                    ul id="upcoming-todos"
                    {
                        @for todo in todos
                        {
                            li
                            {
                                span class="font-semibold" { (todo.task) }
                                " - " (todo.priority.as_str())
                                @if let Some(due_date) = todo.due_date
                                {
                                    " - " (format_display_date(due_date))
                                }
                            }
                        }
                    }
                }
            }

            div class=(CARD_STYLE)
            {
                h3 class=(SECTION_HEADING_STYLE) { "Upcoming Payments" }

                @if payments.is_empty()
                {
                    (empty_message("No payments due this month."))
                }
                @else
                {
                    ul id="upcoming-payments"
                    {
                        @for payment in payments
                        {
                            li
                            {
                                span class="font-semibold" { (payment.payment.transaction.source) }
                                " - " (format_currency(payment.display_amount, currency))
                                " - " (format_display_date(payment.payment.due_date))
                            }
                        }
                    }
                }
            }
        }
    }
}

/// A month grid starting on Sunday with the to-dos and payments on each day.
pub(super) fn calendar_grid(days: &[CalendarDay]) -> Markup {
    let leading_blanks = days
        .first()
        .map_or(0, |day| day.date.weekday().number_days_from_sunday());
    let heading = days
        .first()
        .map(|day| format!("{} {}", day.date.month(), day.date.year()))
        .unwrap_or_default();

    html! {
        section id="calendar" class="w-full"
        {
            h3 class=(SECTION_HEADING_STYLE) { (heading) }

            div class="grid grid-cols-7 gap-2"
            {
                @for weekday in ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
                {
                    div class="text-center font-semibold" { (weekday) }
                }

                @for _ in 0..leading_blanks
                {
                    div {}
                }

                @for day in days
                {
                    div class="p-2 border rounded-lg h-24 flex flex-col" data-day=(day.date.day())
                    {
                        span class="font-bold" { (day.date.day()) }

                        @for payment in &day.payments
                        {
                            div class="text-xs bg-red-500 text-white p-1 rounded-md mb-1" { (payment.source) }
                        }

                        @for todo in &day.todos
                        {
                            div class="text-xs bg-green-500 text-white p-1 rounded-md mb-1" { (todo.task) }
                        }
                    }
                }
            }
        }
    }
}
