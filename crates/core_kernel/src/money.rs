//! Money types with precise decimal arithmetic
//!
//! Fees and payments are recorded in one of a fixed set of currencies.
//! Amounts use rust_decimal so that billing totals never pick up
//! floating-point drift.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Currencies a student can be billed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    INR,
    USD,
    EUR,
    GBP,
    AUD,
}

impl Currency {
    /// Every supported currency, in display order
    pub const ALL: [Currency; 5] = [
        Currency::INR,
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::AUD,
    ];

    /// Returns the number of decimal places for this currency
    pub fn decimal_places(&self) -> u32 {
        2
    }

    /// Returns the currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::INR => "₹",
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::AUD => "A$",
        }
    }

    /// Returns the ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::INR => "INR",
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::AUD => "AUD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| MoneyError::UnsupportedCurrency(code.to_string()))
    }
}

/// Looks up the display symbol for a currency code
///
/// Unknown codes yield an empty string rather than an error, so callers can
/// render whatever code a record carries without a failure path.
pub fn currency_symbol(code: &str) -> &'static str {
    Currency::ALL
        .into_iter()
        .find(|c| c.code() == code)
        .map(|c| c.symbol())
        .unwrap_or("")
}

/// Errors that can occur during money operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),
}

/// A monetary amount with associated currency
///
/// Amounts are stored with 4 decimal places internally; display rounds to
/// the currency's standard precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

impl Money {
    /// Creates a new Money value
    pub fn new(amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: amount.round_dp(4),
            currency,
        }
    }

    /// Creates a non-negative Money value, as required for fee and payment amounts
    pub fn non_negative(amount: Decimal, currency: Currency) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::InvalidAmount(format!(
                "{} must not be negative",
                amount
            )));
        }
        Ok(Self::new(amount, currency))
    }

    /// Returns the amount
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Returns the currency
    pub fn currency(&self) -> Currency {
        self.currency
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dp = self.currency.decimal_places();
        write!(
            f,
            "{} {:.dp$}",
            self.currency.symbol(),
            self.amount.round_dp(dp),
            dp = dp as usize
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_creation() {
        let m = Money::new(dec!(100.50), Currency::INR);
        assert_eq!(m.amount(), dec!(100.50));
        assert_eq!(m.currency(), Currency::INR);
    }

    #[test]
    fn test_non_negative_rejects_negative() {
        assert!(Money::non_negative(dec!(-1), Currency::USD).is_err());
        assert!(Money::non_negative(dec!(0), Currency::USD).is_ok());
    }

    #[test]
    fn test_symbol_lookup() {
        assert_eq!(currency_symbol("GBP"), "£");
        assert_eq!(currency_symbol("JPY"), "");
    }
}
