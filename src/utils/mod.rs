//! Utility functions for formatting and common operations
//!
//! Centralized formatting of money amounts and returns so every report shows
//! them the same way.

use rust_decimal::{Decimal, RoundingStrategy};

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Include "₹ " prefix (Indian Rupee)
    INR,
    /// No currency symbol (for table cells, calculations display)
    None,
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Group an integer digit string the Indian way: the last three digits, then
/// pairs (`12,34,567`).
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// Core formatting function with full control over output.
///
/// Formats a Decimal value using Indian digit grouping:
/// - Thousands, then lakhs and crores: `1,23,45,678`
/// - Decimal separator: `.`
///
/// # Arguments
/// * `value` - The decimal value to format
/// * `width` - Minimum width for padding (0 for no padding, right-aligned)
/// * `symbol` - Whether to include currency symbol
///
/// # Examples
/// ```
/// use perftrack::utils::{format_currency_with_width, CurrencySymbol};
/// use rust_decimal_macros::dec;
///
/// assert_eq!(
///     format_currency_with_width(dec!(1234567.5), 0, CurrencySymbol::INR),
///     "₹ 12,34,567.50"
/// );
///
/// assert_eq!(
///     format_currency_with_width(dec!(1234), 12, CurrencySymbol::None),
///     "    1,234.00"
/// );
/// ```
pub fn format_currency_with_width(value: Decimal, width: usize, symbol: CurrencySymbol) -> String {
    let rounded = round2(value);
    let is_negative = rounded < Decimal::ZERO;

    let formatted = format!("{:.2}", rounded.abs());
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let sign = if is_negative { "-" } else { "" };
    let prefix = match symbol {
        CurrencySymbol::INR => "₹ ",
        CurrencySymbol::None => "",
    };

    let result = format!(
        "{}{}{}.{}",
        prefix,
        sign,
        group_indian(integer_part),
        decimal_part
    );

    // Right-align by characters; the rupee sign is multi-byte
    let len = result.chars().count();
    if width > len {
        format!("{}{}", " ".repeat(width - len), result)
    } else {
        result
    }
}

/// Format as Indian Rupees with symbol: "₹ 1,23,456.78"
///
/// # Examples
/// ```
/// use perftrack::utils::format_currency;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_currency(dec!(123456.78)), "₹ 1,23,456.78");
/// assert_eq!(format_currency(dec!(-500)), "₹ -500.00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format_currency_with_width(value, 0, CurrencySymbol::INR)
}

/// Format number only (no symbol): "1,23,456.78"
pub fn format_amount(value: Decimal) -> String {
    format_currency_with_width(value, 0, CurrencySymbol::None)
}

/// Format a fractional return as a percentage with two decimals.
///
/// # Examples
/// ```
/// use perftrack::utils::format_percent;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(format_percent(dec!(0.0625)), "6.25%");
/// assert_eq!(format_percent(dec!(-0.05)), "-5.00%");
/// ```
pub fn format_percent(fraction: Decimal) -> String {
    format!("{:.2}%", round2(fraction * Decimal::ONE_HUNDRED))
}
