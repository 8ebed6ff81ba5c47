/*
[INPUT]:  Raw numeric values (Decimal, f64, optional) and market precision
[OUTPUT]: Display strings with fixed decimal digits or "N/A"
[POS]:    Presentation layer - stateless value formatting
[UPDATE]: When adding display formats or changing rounding rules
*/

use merco_adapter::MarketPrecision;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Shown for absent, NaN or infinite values
pub const NOT_AVAILABLE: &str = "N/A";

/// Digits used for percentages and money aggregates
pub const DEFAULT_DIGITS: u32 = 2;

/// A displayable value. Floats beyond `Decimal`'s range keep their binary form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayValue {
    Exact(Decimal),
    Float(f64),
}

impl DisplayValue {
    fn is_negative(&self) -> bool {
        match self {
            DisplayValue::Exact(value) => value.is_sign_negative() && !value.is_zero(),
            DisplayValue::Float(value) => *value < 0.0,
        }
    }
}

/// Anything the formatter can display.
pub trait DisplayNumber {
    /// `None` when the value cannot be displayed (absent, NaN, infinite)
    fn display_value(&self) -> Option<DisplayValue>;
}

impl DisplayNumber for Decimal {
    fn display_value(&self) -> Option<DisplayValue> {
        Some(DisplayValue::Exact(*self))
    }
}

impl DisplayNumber for f64 {
    fn display_value(&self) -> Option<DisplayValue> {
        if !self.is_finite() {
            return None;
        }
        Some(match Decimal::from_f64(*self) {
            Some(value) => DisplayValue::Exact(value),
            None => DisplayValue::Float(*self),
        })
    }
}

impl DisplayNumber for f32 {
    fn display_value(&self) -> Option<DisplayValue> {
        f64::from(*self).display_value()
    }
}

impl<T: DisplayNumber> DisplayNumber for Option<T> {
    fn display_value(&self) -> Option<DisplayValue> {
        self.as_ref().and_then(DisplayNumber::display_value)
    }
}

impl<T: DisplayNumber + ?Sized> DisplayNumber for &T {
    fn display_value(&self) -> Option<DisplayValue> {
        (**self).display_value()
    }
}

/// Fixed-point rendering with half-away-from-zero rounding. The sign of the input is
/// kept, so `-0.001` renders as `-0.00`.
fn render_fixed(value: DisplayValue, digits: u32) -> String {
    let magnitude = match value {
        DisplayValue::Exact(value) => {
            let mut rounded = value
                .abs()
                .round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(digits);
            rounded.to_string()
        }
        // Out of Decimal range: no fractional part left to round.
        DisplayValue::Float(value) => format!("{:.*}", digits as usize, value.abs()),
    };

    if value.is_negative() {
        format!("-{magnitude}")
    } else {
        magnitude
    }
}

pub fn format_number(value: impl DisplayNumber, digits: u32) -> String {
    match value.display_value() {
        Some(value) => render_fixed(value, digits),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Signed percentage: `+3.20%`, `-3.20%`
pub fn format_percent(value: impl DisplayNumber) -> String {
    match value.display_value() {
        Some(value) => {
            let sign = if value.is_negative() { "" } else { "+" };
            format!("{sign}{}%", render_fixed(value, DEFAULT_DIGITS))
        }
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Price with the market's price digits; "N/A" when the precision is unknown
pub fn format_price(value: impl DisplayNumber, precision: Option<&MarketPrecision>) -> String {
    match precision.and_then(MarketPrecision::price_digits) {
        Some(digits) => format_number(value, digits),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Amount with the market's amount digits; "N/A" when the precision is unknown
pub fn format_amount(value: impl DisplayNumber, precision: Option<&MarketPrecision>) -> String {
    match precision.and_then(MarketPrecision::amount_digits) {
        Some(digits) => format_number(value, digits),
        None => NOT_AVAILABLE.to_string(),
    }
}
