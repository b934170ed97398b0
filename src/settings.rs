//! The optional JSON settings file.
//!
//! ```json
//! {
//!   "exchangeRates": [{ "from": "USD", "to": "INR", "rate": 83.2 }],
//!   "budgetCeilings": { "Food": 400, "Rent or Mortgage": 1500 }
//! }
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use serde::Deserialize;

use crate::{
    Error,
    category::BudgetCeilings,
    currency::{CurrencyCode, ExchangeRates},
};

/// A rate that adds to or replaces one of the default exchange rates.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RateOverride {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub rate: f64,
}

/// Settings read at start up.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    /// Rates applied on top of the default exchange rate table.
    #[serde(default)]
    pub exchange_rates: Vec<RateOverride>,
    /// The budget ceiling for each expense category, in the stored currency.
    #[serde(default)]
    pub budget_ceilings: BTreeMap<String, f64>,
}

impl Settings {
    /// Read settings from the JSON file at `path`.
    ///
    /// # Errors
    /// Returns [Error::FileError] if the file cannot be read or is not valid settings JSON.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let file_error = |reason: String| Error::FileError {
            path: path.display().to_string(),
            reason,
        };

        let text = fs::read_to_string(path).map_err(|error| file_error(error.to_string()))?;

        serde_json::from_str(&text).map_err(|error| file_error(error.to_string()))
    }

    /// Build the exchange rate table and budget ceilings from the settings.
    ///
    /// Invalid rates and ceilings for categories that are not expense
    /// categories are skipped with a warning.
    pub fn into_parts(self) -> (ExchangeRates, BudgetCeilings) {
        let exchange_rates = self
            .exchange_rates
            .into_iter()
            .filter(|RateOverride { from, to, rate }| {
                let is_valid = rate.is_finite() && *rate > 0.0;
                if !is_valid {
                    tracing::warn!("Ignoring invalid exchange rate {rate} from {from} to {to}");
                }
                is_valid
            })
            .fold(ExchangeRates::default(), |rates, RateOverride { from, to, rate }| {
                rates.with_rate(from, to, rate)
            });

        let mut budget_ceilings = BudgetCeilings::default();

        for (category, ceiling) in self.budget_ceilings {
            if !ceiling.is_finite() || ceiling < 0.0 {
                tracing::warn!("Ignoring invalid budget ceiling {ceiling} for {category}");
            } else if !budget_ceilings.set(&category, ceiling) {
                tracing::warn!("Ignoring budget ceiling for \"{category}\", it is not an expense category");
            }
        }

        (exchange_rates, budget_ceilings)
    }
}
