//! The fixed category options offered for income and expenses.
//!
//! Each category carries a [GoalTag] that decides which goal views the
//! category appears in. The options are configuration, not user data.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The label used for transactions that have no category.
pub const UNCLASSIFIED_LABEL: &str = "Unclassified";

/// Which goal view a category belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalTag {
    /// Money put aside towards a savings target.
    Savings,
    /// Regular living costs.
    Expenses,
    /// Recurring services and bills.
    Subscriptions,
    /// Not used for goals.
    None,
}

impl GoalTag {
    /// The name of the goal view, or `None` for categories not used for goals.
    pub fn label(self) -> Option<&'static str> {
        match self {
            GoalTag::Savings => Some("Savings"),
            GoalTag::Expenses => Some("Expenses"),
            GoalTag::Subscriptions => Some("Subscriptions"),
            GoalTag::None => None,
        }
    }
}

/// Whether a category option is offered for income or for expenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    /// A source of income, e.g. "Salary".
    Income,
    /// Something money is spent on, e.g. "Food".
    Expense,
}

/// A category label together with its goal tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryOption {
    /// The label shown to the user and stored on transactions.
    pub label: &'static str,
    /// The goal view the category belongs to.
    pub goal: GoalTag,
    /// Whether this is an income or expense category.
    pub kind: CategoryKind,
}

const fn income(label: &'static str, goal: GoalTag) -> CategoryOption {
    CategoryOption {
        label,
        goal,
        kind: CategoryKind::Income,
    }
}

const fn expense(label: &'static str, goal: GoalTag) -> CategoryOption {
    CategoryOption {
        label,
        goal,
        kind: CategoryKind::Expense,
    }
}

/// The income categories, in display order.
pub const INCOME_CATEGORIES: [CategoryOption; 7] = [
    income("Business", GoalTag::Savings),
    income("Salary", GoalTag::None),
    income("AirBnB", GoalTag::None),
    income("Selling Products", GoalTag::Savings),
    income("Crypto", GoalTag::Savings),
    income("Stocks & Shares", GoalTag::Savings),
    income("Banking", GoalTag::None),
];

/// The expense categories, in display order.
pub const EXPENSE_CATEGORIES: [CategoryOption; 14] = [
    expense("Rent or Mortgage", GoalTag::Expenses),
    expense("Bills & Utilities", GoalTag::Expenses),
    expense("Food", GoalTag::Expenses),
    expense("Transportation", GoalTag::Expenses),
    expense("Gadgets", GoalTag::Savings),
    expense("Other", GoalTag::Expenses),
    expense("Piggy Pot", GoalTag::Savings),
    expense("Personal Care", GoalTag::Expenses),
    expense("Buying Car", GoalTag::Savings),
    expense("Holidays", GoalTag::Savings),
    expense("Netflix", GoalTag::Subscriptions),
    expense("Council Tax", GoalTag::Subscriptions),
    expense("Amazon Prime", GoalTag::Subscriptions),
    expense("Insurance", GoalTag::Subscriptions),
];

/// Every category option, income first.
pub fn all_categories() -> impl Iterator<Item = &'static CategoryOption> {
    INCOME_CATEGORIES.iter().chain(EXPENSE_CATEGORIES.iter())
}

/// Find the option for `label`, if it is one of the fixed categories.
pub fn find_category(label: &str) -> Option<&'static CategoryOption> {
    all_categories().find(|option| option.label == label)
}

/// Whether `label` is one of the fixed categories.
pub fn is_known_category(label: &str) -> bool {
    find_category(label).is_some()
}

/// The budget ceiling for each expense category, in the stored currency.
///
/// Categories without a configured ceiling have a ceiling of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetCeilings {
    ceilings: BTreeMap<&'static str, f64>,
}

impl Default for BudgetCeilings {
    fn default() -> Self {
        Self {
            ceilings: EXPENSE_CATEGORIES
                .iter()
                .map(|option| (option.label, 0.0))
                .collect(),
        }
    }
}

impl BudgetCeilings {
    /// Set the ceiling for an expense category.
    ///
    /// Returns `false` and leaves the ceilings unchanged if `category` is not
    /// one of the fixed expense categories.
    pub fn set(&mut self, category: &str, ceiling: f64) -> bool {
        match EXPENSE_CATEGORIES
            .iter()
            .find(|option| option.label == category)
        {
            Some(option) => {
                self.ceilings.insert(option.label, ceiling);
                true
            }
            None => false,
        }
    }

    /// The ceiling for `category`, zero if none was configured.
    pub fn get(&self, category: &str) -> f64 {
        self.ceilings.get(category).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{BudgetCeilings, CategoryKind, GoalTag, find_category, is_known_category};

    #[test]
    fn finds_known_categories() {
        let option = find_category("Netflix").unwrap();

        assert_eq!(option.goal, GoalTag::Subscriptions);
        assert_eq!(option.kind, CategoryKind::Expense);
        assert!(is_known_category("Salary"));
        assert!(!is_known_category("Lottery"));
    }

    #[test]
    fn goal_tags_have_labels() {
        assert_eq!(GoalTag::Savings.label(), Some("Savings"));
        assert_eq!(GoalTag::None.label(), None);
    }

    #[test]
    fn ceilings_default_to_zero() {
        let ceilings = BudgetCeilings::default();

        assert_eq!(ceilings.get("Food"), 0.0);
        assert_eq!(ceilings.get("Not a category"), 0.0);
    }

    #[test]
    fn only_expense_categories_take_ceilings() {
        let mut ceilings = BudgetCeilings::default();

        assert!(ceilings.set("Food", 300.0));
        assert!(!ceilings.set("Salary", 300.0));
        assert_eq!(ceilings.get("Food"), 300.0);
        assert_eq!(ceilings.get("Salary"), 0.0);
    }
}
