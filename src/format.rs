//! Display formatting for amounts
//!
//! Renders amounts with thousands grouping, the currency's own decimal
//! separator and symbol placement, and optional compact `K`/`M`/`B` scaling.

use crate::currency::{get_currency, DecimalSeparator, SymbolPosition};
use crate::fx::Money;

/// Placeholder used while swapping separators
const SWAP_MARKER: char = '\u{0}';

/// Display options. Fraction digits default to the currency's decimal places.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    pub show_symbol: bool,
    pub show_code: bool,
    pub show_sign: bool,
    pub compact: bool,
    pub minimum_fraction_digits: Option<u32>,
    pub maximum_fraction_digits: Option<u32>,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            show_symbol: true,
            show_code: false,
            show_sign: false,
            compact: false,
            minimum_fraction_digits: None,
            maximum_fraction_digits: None,
        }
    }
}

impl FormatOptions {
    pub fn compact() -> Self {
        Self {
            compact: true,
            ..Self::default()
        }
    }

    pub fn signed() -> Self {
        Self {
            show_sign: true,
            ..Self::default()
        }
    }
}

/// Format `amount` in `currency_code`. Unknown codes render as `"<amount> <code>"`.
pub fn format_amount(amount: f64, currency_code: &str, options: &FormatOptions) -> String {
    let Some(currency) = get_currency(currency_code) else {
        return format!("{:.2} {}", round_half_away(amount, 2), currency_code);
    };

    let abs = amount.abs();
    let body = if options.compact && abs >= 1_000.0 {
        compact_number(abs)
    } else {
        let min = options
            .minimum_fraction_digits
            .unwrap_or(currency.decimal_places);
        let max = options
            .maximum_fraction_digits
            .unwrap_or(currency.decimal_places)
            .max(min);
        let grouped = grouped_number(abs, min, max);
        match currency.decimal_separator {
            DecimalSeparator::Comma => swap_separators(&grouped),
            DecimalSeparator::Period => grouped,
        }
    };

    let sign = if amount < 0.0 && body_is_nonzero(&body) {
        "-"
    } else if options.show_sign && amount > 0.0 {
        "+"
    } else {
        ""
    };

    let mut out = String::from(sign);
    if options.show_symbol {
        match currency.symbol_position {
            SymbolPosition::Before => {
                out.push_str(currency.symbol);
                out.push_str(&body);
            }
            SymbolPosition::After => {
                out.push_str(&body);
                out.push_str(currency.symbol);
            }
        }
    } else {
        out.push_str(&body);
    }

    if options.show_code {
        out.push(' ');
        out.push_str(currency.code);
    }
    out
}

/// Format a [`Money`] value
pub fn format_money(money: &Money, options: &FormatOptions) -> String {
    format_amount(money.amount, &money.currency, options)
}

fn body_is_nonzero(body: &str) -> bool {
    body.chars().any(|c| c.is_ascii_digit() && c != '0')
}

/// Round ties away from zero at `digits` places. `format!` alone rounds
/// exact ties to even.
fn round_half_away(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    let rounded = (value * factor).round() / factor;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}

fn compact_number(abs: f64) -> String {
    if abs >= 1e9 {
        format!("{:.1}B", round_half_away(abs / 1e9, 1))
    } else if abs >= 1e6 {
        format!("{:.1}M", round_half_away(abs / 1e6, 1))
    } else {
        format!("{:.1}K", round_half_away(abs / 1e3, 1))
    }
}

/// `1234.5` -> `"1,234.50"` with between `min` and `max` fraction digits
fn grouped_number(abs: f64, min: u32, max: u32) -> String {
    let fixed = format!("{:.*}", max as usize, round_half_away(abs, max));
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (fixed, String::new()),
    };

    let mut frac = frac_part;
    while frac.len() > min as usize && frac.ends_with('0') {
        frac.pop();
    }

    let mut out = group_thousands(&int_part);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Two-pass swap of `,` and `.` through a placeholder
fn swap_separators(s: &str) -> String {
    s.replace(',', &SWAP_MARKER.to_string())
        .replace('.', ",")
        .replace(SWAP_MARKER, ".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_usd() {
        assert_eq!(format_amount(1234.5, "USD", &FormatOptions::default()), "$1,234.50");
        assert_eq!(format_amount(0.0, "USD", &FormatOptions::default()), "$0.00");
        assert_eq!(format_amount(1234567.891, "USD", &FormatOptions::default()), "$1,234,567.89");
    }

    #[test]
    fn test_compact() {
        let opts = FormatOptions::compact();
        assert_eq!(format_amount(1234.5, "USD", &opts), "$1.2K");
        assert_eq!(format_amount(2_500_000.0, "USD", &opts), "$2.5M");
        assert_eq!(format_amount(3_100_000_000.0, "USD", &opts), "$3.1B");
        assert_eq!(format_amount(999.0, "USD", &opts), "$999.00");
    }

    #[test]
    fn test_comma_separator_and_suffix_symbol() {
        assert_eq!(format_amount(1234.5, "EUR", &FormatOptions::default()), "1.234,50€");
        assert_eq!(format_amount(1500000.0, "VND", &FormatOptions::default()), "1.500.000₫");
    }

    #[test]
    fn test_zero_decimal_currency() {
        assert_eq!(format_amount(15000.4, "KRW", &FormatOptions::default()), "₩15,000");
    }

    #[test]
    fn test_sign() {
        assert_eq!(format_amount(5.0, "USD", &FormatOptions::signed()), "+$5.00");
        assert_eq!(format_amount(-5.0, "USD", &FormatOptions::signed()), "-$5.00");
        assert_eq!(format_amount(-5.0, "USD", &FormatOptions::default()), "-$5.00");
        assert_eq!(format_amount(0.0, "USD", &FormatOptions::signed()), "$0.00");
    }

    #[test]
    fn test_code_and_no_symbol() {
        let opts = FormatOptions {
            show_symbol: false,
            show_code: true,
            ..FormatOptions::default()
        };
        assert_eq!(format_amount(42.0, "GBP", &opts), "42.00 GBP");
    }

    #[test]
    fn test_fraction_digit_overrides() {
        let opts = FormatOptions {
            minimum_fraction_digits: Some(0),
            maximum_fraction_digits: Some(2),
            ..FormatOptions::default()
        };
        assert_eq!(format_amount(12.0, "USD", &opts), "$12");
        assert_eq!(format_amount(12.5, "USD", &opts), "$12.5");
        assert_eq!(format_amount(12.346, "USD", &opts), "$12.35");
    }

    #[test]
    fn test_ties_round_away_from_zero() {
        let opts = FormatOptions::default();
        assert_eq!(format_amount(0.125, "USD", &opts), "$0.13");
        assert_eq!(format_amount(1234.5, "KRW", &opts), "₩1,235");
        assert_eq!(format_amount(-2.5, "JPY", &opts), "-¥3");
        assert_eq!(format_amount(1250.0, "USD", &FormatOptions::compact()), "$1.3K");
        assert_eq!(format_amount(0.125, "XYZ", &opts), "0.13 XYZ");
    }

    #[test]
    fn test_unknown_currency() {
        assert_eq!(format_amount(12.5, "XYZ", &FormatOptions::default()), "12.50 XYZ");
    }

    #[test]
    fn test_format_money() {
        let money = Money::new(99.9, "GBP");
        assert_eq!(format_money(&money, &FormatOptions::default()), "£99.90");
    }
}
