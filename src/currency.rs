//! Currencies, exchange rates and money formatting.
//!
//! Amounts are always stored in [STORED_CURRENCY] exactly as they were
//! entered. Conversion into the user's display currency only happens when
//! figures are computed for display.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use numfmt::{Formatter, Precision};
use serde::{Deserialize, Serialize};

use crate::Error;

/// The currency that transaction amounts are recorded in.
pub const STORED_CURRENCY: CurrencyCode = CurrencyCode::USD;

/// The supported currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CurrencyCode {
    /// United States dollar.
    USD,
    /// Pound sterling.
    GBP,
    /// Euro.
    EUR,
    /// Indian rupee.
    INR,
    /// Australian dollar.
    AUD,
    /// Singapore dollar.
    SGD,
}

impl CurrencyCode {
    /// Every supported currency, in the order they are offered to the user.
    pub const ALL: [CurrencyCode; 6] = [
        CurrencyCode::USD,
        CurrencyCode::GBP,
        CurrencyCode::EUR,
        CurrencyCode::INR,
        CurrencyCode::AUD,
        CurrencyCode::SGD,
    ];

    /// The symbol shown in front of amounts in this currency.
    pub fn symbol(self) -> &'static str {
        match self {
            CurrencyCode::USD => "$",
            CurrencyCode::GBP => "£",
            CurrencyCode::EUR => "€",
            CurrencyCode::INR => "₹",
            CurrencyCode::AUD => "A$",
            CurrencyCode::SGD => "S$",
        }
    }

    /// The ISO 4217 code, e.g. "USD".
    pub fn as_str(self) -> &'static str {
        match self {
            CurrencyCode::USD => "USD",
            CurrencyCode::GBP => "GBP",
            CurrencyCode::EUR => "EUR",
            CurrencyCode::INR => "INR",
            CurrencyCode::AUD => "AUD",
            CurrencyCode::SGD => "SGD",
        }
    }
}

impl Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CurrencyCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();

        CurrencyCode::ALL
            .into_iter()
            .find(|currency| currency.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| Error::UnknownCurrency(code.to_owned()))
    }
}

/// A currency as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Currency {
    /// The symbol shown in front of amounts, e.g. "£".
    pub symbol: &'static str,
    /// The currency code.
    pub code: CurrencyCode,
}

impl From<CurrencyCode> for Currency {
    fn from(code: CurrencyCode) -> Self {
        Self {
            symbol: code.symbol(),
            code,
        }
    }
}

/// A fixed table of cross rates between currencies.
///
/// The default table holds the USD, GBP and EUR cross rates. Other pairs can
/// be added with [ExchangeRates::with_rate], e.g. from the settings file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRates {
    rates: HashMap<(CurrencyCode, CurrencyCode), f64>,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        use CurrencyCode::{EUR, GBP, USD};

        let rates = HashMap::from([
            ((USD, GBP), 0.82),
            ((USD, EUR), 0.95),
            ((GBP, USD), 1.22),
            ((GBP, EUR), 1.16),
            ((EUR, USD), 1.05),
            ((EUR, GBP), 0.86),
        ]);

        Self { rates }
    }
}

impl ExchangeRates {
    /// An exchange rate table with no rates.
    ///
    /// Only same-currency conversions succeed with an empty table.
    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    /// Add or replace the rate for converting `from` into `to`.
    pub fn with_rate(mut self, from: CurrencyCode, to: CurrencyCode, rate: f64) -> Self {
        self.rates.insert((from, to), rate);
        self
    }

    /// The multiplier for converting `from` into `to`, if one is known.
    pub fn rate(&self, from: CurrencyCode, to: CurrencyCode) -> Option<f64> {
        if from == to {
            return Some(1.0);
        }

        self.rates.get(&(from, to)).copied()
    }

    /// Convert `amount` from the currency `from` into the currency `to`.
    ///
    /// Converting into the same currency returns `amount` unchanged. No
    /// rounding is applied, rounding only happens when the amount is formatted.
    ///
    /// # Errors
    /// Returns [Error::MissingExchangeRate] if the table has no rate for the pair.
    pub fn convert(&self, amount: f64, from: CurrencyCode, to: CurrencyCode) -> Result<f64, Error> {
        if from == to {
            return Ok(amount);
        }

        self.rates
            .get(&(from, to))
            .map(|rate| amount * rate)
            .ok_or(Error::MissingExchangeRate { from, to })
    }

    /// Check that amounts in [STORED_CURRENCY] can be shown in `display`.
    ///
    /// # Errors
    /// Returns [Error::MissingExchangeRate] if the table has no rate for the pair.
    pub fn ensure_displayable(&self, display: CurrencyCode) -> Result<(), Error> {
        self.convert(0.0, STORED_CURRENCY, display).map(|_| ())
    }
}

/// Pick the display currency from an optional `?currency=` query value,
/// falling back to `default` when the value is missing or blank.
///
/// # Errors
/// Returns [Error::UnknownCurrency] for an unsupported code, or
/// [Error::MissingExchangeRate] if stored amounts cannot be shown in the
/// chosen currency.
pub fn select_display_currency(
    requested: Option<&str>,
    default: CurrencyCode,
    rates: &ExchangeRates,
) -> Result<CurrencyCode, Error> {
    let currency = match requested.map(str::trim) {
        None | Some("") => default,
        Some(code) => code.parse()?,
    };

    rates.ensure_displayable(currency)?;

    Ok(currency)
}

/// Format `amount` with the currency symbol and two decimal places,
/// e.g. "£1,234.50".
pub fn format_currency(amount: f64, code: CurrencyCode) -> String {
    format_with_precision(amount, code, 2)
}

/// Format `amount` rounded to the nearest whole number, e.g. "£1,235".
///
/// Used for compact labels next to bars.
pub fn format_currency_rounded(amount: f64, code: CurrencyCode) -> String {
    format_with_precision(amount.round(), code, 0)
}

fn format_with_precision(amount: f64, code: CurrencyCode, decimals: u8) -> String {
    let symbol = code.symbol();
    let scale = 10_f64.powi(i32::from(decimals));
    let amount = (amount * scale).round() / scale;

    let formatted = if amount == 0.0 {
        // Zero is hardcoded as "0" by numfmt, so we must specify the formatted string for zero
        format!("{symbol}0")
    } else {
        let prefix = if amount < 0.0 {
            format!("-{symbol}")
        } else {
            symbol.to_owned()
        };

        match Formatter::currency(&prefix) {
            Ok(formatter) => {
                let formatted = formatter
                    .precision(Precision::Decimals(decimals))
                    .fmt_string(amount.abs());
                // numfmt switches to scientific notation for very large amounts.
                if formatted.contains('e') {
                    format!("{prefix}{}", group_thousands(amount.abs(), decimals))
                } else {
                    formatted
                }
            }
            Err(error) => {
                tracing::warn!("could not create formatter for {code}: {error:?}");
                format!("{prefix}{}", group_thousands(amount.abs(), decimals))
            }
        }
    };

    pad_fraction(formatted, usize::from(decimals))
}

/// Write a non-negative `amount` with `decimals` fraction digits and commas
/// between groups of three digits, e.g. "1,234,567.80".
fn group_thousands(amount: f64, decimals: u8) -> String {
    let plain = format!("{amount:.*}", usize::from(decimals));
    let (whole, fraction) = match plain.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (plain.as_str(), None),
    };

    let mut grouped = String::with_capacity(plain.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    grouped
}

/// numfmt drops trailing zeros, e.g. "12.30" is rendered as "12.3", so the
/// fraction is padded back out to `decimals` digits.
fn pad_fraction(mut formatted: String, decimals: usize) -> String {
    if decimals == 0 {
        return formatted;
    }

    let fraction_digits = match formatted.rfind('.') {
        Some(point) => formatted.len() - point - 1,
        None => {
            formatted.push('.');
            0
        }
    };

    for _ in fraction_digits..decimals {
        formatted.push('0');
    }

    formatted
}



#[cfg(test)]
mod format_tests {
    use crate::currency::{
        CurrencyCode, format_currency, format_currency_rounded, group_thousands, pad_fraction,
    };

    #[test]
    fn formats_with_two_decimal_places() {
        assert_eq!(format_currency(12.3, CurrencyCode::USD), "$12.30");
        assert_eq!(format_currency(820.0, CurrencyCode::GBP), "£820.00");
        assert_eq!(format_currency(5.25, CurrencyCode::EUR), "€5.25");
    }

    #[test]
    fn rounds_to_two_decimal_places_at_display() {
        // 150 * 0.82 is not exactly 123 in floating point.
        assert_eq!(format_currency(150.0 * 0.82, CurrencyCode::GBP), "£123.00");
    }

    #[test]
    fn formats_negative_amounts() {
        assert_eq!(format_currency(-12.3, CurrencyCode::USD), "-$12.30");
    }

    #[test]
    fn formats_zero() {
        assert_eq!(format_currency(0.0, CurrencyCode::EUR), "€0.00");
        assert_eq!(format_currency_rounded(0.0, CurrencyCode::EUR), "€0");
    }

    #[test]
    fn rounded_format_has_no_fraction() {
        assert_eq!(format_currency_rounded(99.6, CurrencyCode::USD), "$100");
        assert_eq!(format_currency_rounded(-4.4, CurrencyCode::AUD), "-A$4");
    }

    #[test]
    fn large_amounts_are_not_in_scientific_notation() {
        assert_eq!(
            format_currency(1e15, CurrencyCode::GBP),
            "£1,000,000,000,000,000.00"
        );
        assert_eq!(
            format_currency_rounded(-1e15, CurrencyCode::INR),
            "-₹1,000,000,000,000,000"
        );
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(group_thousands(1234567.8, 2), "1,234,567.80");
        assert_eq!(group_thousands(999.0, 0), "999");
        assert_eq!(group_thousands(100000.0, 0), "100,000");
    }

    #[test]
    fn pads_missing_fraction_digits() {
        assert_eq!(pad_fraction("$12".to_owned(), 2), "$12.00");
        assert_eq!(pad_fraction("$12.3".to_owned(), 2), "$12.30");
        assert_eq!(pad_fraction("$12.34".to_owned(), 2), "$12.34");
        assert_eq!(pad_fraction("$12".to_owned(), 0), "$12");
    }
}
