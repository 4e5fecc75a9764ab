//! Order totals and currency display.
//!
//! Amounts stay `Decimal` everywhere in the core; text only exists in the
//! view model.

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use crate::model::{Extra, OrderQuantity};

/// Fraction digits shown for currency amounts.
pub const DECIMAL_PLACES: u32 = 2;

/// Largest unit price or extra value accepted from the API (1,000,000).
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);
/// Largest quantity of the food or of any single extra.
pub const MAX_QUANTITY: u32 = 9999;

/// Sum of `value * quantity` over all extras. Zero-quantity extras
/// contribute nothing; an empty slice yields zero. `None` on overflow.
pub fn extras_total(extras: &[Extra]) -> Option<Decimal> {
    extras.iter().try_fold(Decimal::ZERO, |acc, extra| {
        extra
            .value
            .checked_mul(Decimal::from(extra.quantity))
            .and_then(|line| acc.checked_add(line))
    })
}

/// `price * quantity + extras_total(extras)`, or `None` on overflow.
pub fn order_total(price: Decimal, quantity: OrderQuantity, extras: &[Extra]) -> Option<Decimal> {
    price
        .checked_mul(Decimal::from(quantity.get()))
        .and_then(|base| extras_total(extras).and_then(|e| base.checked_add(e)))
}

/// Locale rules for rendering an amount, e.g. `R$ 1.234,50`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyFormat {
    pub symbol: String,
    pub thousands_separator: char,
    pub decimal_separator: char,
}

impl CurrencyFormat {
    #[must_use]
    pub fn brl() -> Self {
        Self {
            symbol: "R$".to_string(),
            thousands_separator: '.',
            decimal_separator: ',',
        }
    }

    #[must_use]
    pub fn usd() -> Self {
        Self {
            symbol: "$".to_string(),
            thousands_separator: ',',
            decimal_separator: '.',
        }
    }

    #[must_use]
    pub fn format(&self, amount: Decimal) -> String {
        let rounded =
            amount.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();

        // `{:.2}` on a Decimal is exact, so splitting the text is safe here.
        let digits = format!("{:.2}", rounded.abs());
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(self.thousands_separator);
            }
            grouped.push(ch);
        }

        let sign = if negative { "-" } else { "" };
        format!(
            "{sign}{} {grouped}{}{fraction}",
            self.symbol, self.decimal_separator
        )
    }
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self::brl()
    }
}
