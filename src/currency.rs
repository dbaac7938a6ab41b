//! Currency reference data
//!
//! A fixed table of display metadata per currency code. Nothing here is
//! user-editable; lookups are case-insensitive on the code.

use serde::Serialize;
use std::fmt;

/// Fixed intermediary currency for cross rates
pub const PIVOT_CURRENCY: &str = "USD";

/// Curated quick-pick list shown before any search
pub const POPULAR_CURRENCIES: [&str; 8] = ["USD", "EUR", "GBP", "JPY", "KRW", "THB", "SGD", "AUD"];

/// Where the symbol goes relative to the amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolPosition {
    Before,
    After,
}

/// Decimal separator used when rendering amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DecimalSeparator {
    #[serde(rename = ".")]
    Period,
    #[serde(rename = ",")]
    Comma,
}

/// Static reference row for one currency
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub code: &'static str,
    pub name: &'static str,
    pub symbol: &'static str,
    pub symbol_position: SymbolPosition,
    pub decimal_places: u32,
    pub decimal_separator: DecimalSeparator,
    pub flag: &'static str,
    pub country: &'static str,
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)
    }
}

macro_rules! currency {
    ($code:expr, $name:expr, $symbol:expr, $pos:ident, $places:expr, $sep:ident, $flag:expr, $country:expr) => {
        Currency {
            code: $code,
            name: $name,
            symbol: $symbol,
            symbol_position: SymbolPosition::$pos,
            decimal_places: $places,
            decimal_separator: DecimalSeparator::$sep,
            flag: $flag,
            country: $country,
        }
    };
}

static CURRENCIES: &[Currency] = &[
    currency!("USD", "US Dollar", "$", Before, 2, Period, "🇺🇸", "United States"),
    currency!("EUR", "Euro", "€", After, 2, Comma, "🇪🇺", "European Union"),
    currency!("GBP", "British Pound", "£", Before, 2, Period, "🇬🇧", "United Kingdom"),
    currency!("JPY", "Japanese Yen", "¥", Before, 0, Period, "🇯🇵", "Japan"),
    currency!("KRW", "South Korean Won", "₩", Before, 0, Period, "🇰🇷", "South Korea"),
    currency!("CNY", "Chinese Yuan", "¥", Before, 2, Period, "🇨🇳", "China"),
    currency!("THB", "Thai Baht", "฿", Before, 2, Period, "🇹🇭", "Thailand"),
    currency!("VND", "Vietnamese Dong", "₫", After, 0, Comma, "🇻🇳", "Vietnam"),
    currency!("SGD", "Singapore Dollar", "S$", Before, 2, Period, "🇸🇬", "Singapore"),
    currency!("HKD", "Hong Kong Dollar", "HK$", Before, 2, Period, "🇭🇰", "Hong Kong"),
    currency!("TWD", "New Taiwan Dollar", "NT$", Before, 0, Period, "🇹🇼", "Taiwan"),
    currency!("AUD", "Australian Dollar", "A$", Before, 2, Period, "🇦🇺", "Australia"),
    currency!("NZD", "New Zealand Dollar", "NZ$", Before, 2, Period, "🇳🇿", "New Zealand"),
    currency!("CAD", "Canadian Dollar", "C$", Before, 2, Period, "🇨🇦", "Canada"),
    currency!("CHF", "Swiss Franc", "CHF ", Before, 2, Period, "🇨🇭", "Switzerland"),
    currency!("MXN", "Mexican Peso", "MX$", Before, 2, Period, "🇲🇽", "Mexico"),
    currency!("BRL", "Brazilian Real", "R$", Before, 2, Comma, "🇧🇷", "Brazil"),
    currency!("INR", "Indian Rupee", "₹", Before, 2, Period, "🇮🇳", "India"),
    currency!("IDR", "Indonesian Rupiah", "Rp", Before, 0, Comma, "🇮🇩", "Indonesia"),
    currency!("PHP", "Philippine Peso", "₱", Before, 2, Period, "🇵🇭", "Philippines"),
    currency!("MYR", "Malaysian Ringgit", "RM", Before, 2, Period, "🇲🇾", "Malaysia"),
    currency!("SEK", "Swedish Krona", " kr", After, 2, Comma, "🇸🇪", "Sweden"),
    currency!("NOK", "Norwegian Krone", " kr", After, 2, Comma, "🇳🇴", "Norway"),
    currency!("DKK", "Danish Krone", " kr", After, 2, Comma, "🇩🇰", "Denmark"),
    currency!("TRY", "Turkish Lira", "₺", Before, 2, Comma, "🇹🇷", "Turkey"),
    currency!("ZAR", "South African Rand", "R", Before, 2, Period, "🇿🇦", "South Africa"),
    currency!("AED", "UAE Dirham", "AED ", Before, 2, Period, "🇦🇪", "United Arab Emirates"),
];

/// Look up a currency by code
pub fn get_currency(code: &str) -> Option<&'static Currency> {
    CURRENCIES
        .iter()
        .find(|c| c.code.eq_ignore_ascii_case(code.trim()))
}

/// Every currency in the reference table
pub fn all_currencies() -> &'static [Currency] {
    CURRENCIES
}

/// Match against code, name or country. An empty query returns everything.
pub fn search_currencies(query: &str) -> Vec<&'static Currency> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return CURRENCIES.iter().collect();
    }

    CURRENCIES
        .iter()
        .filter(|c| {
            c.code.to_lowercase().contains(&needle)
                || c.name.to_lowercase().contains(&needle)
                || c.country.to_lowercase().contains(&needle)
        })
        .collect()
}

/// The curated popular list, in display order
pub fn popular_currencies() -> Vec<&'static Currency> {
    POPULAR_CURRENCIES
        .iter()
        .filter_map(|code| get_currency(code))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_currency() {
        let usd = get_currency("USD").unwrap();
        assert_eq!(usd.symbol, "$");
        assert_eq!(usd.decimal_places, 2);
        assert_eq!(get_currency("eur").unwrap().code, "EUR");
        assert!(get_currency("XXX").is_none());
    }

    #[test]
    fn test_codes_are_unique() {
        let mut codes: Vec<_> = all_currencies().iter().map(|c| c.code).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), all_currencies().len());
    }

    #[test]
    fn test_search_currencies() {
        let hits = search_currencies("yen");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].code, "JPY");

        let by_country = search_currencies("korea");
        assert!(by_country.iter().any(|c| c.code == "KRW"));

        assert_eq!(search_currencies("  ").len(), all_currencies().len());
        assert!(search_currencies("zzz").is_empty());
    }

    #[test]
    fn test_popular_currencies() {
        let popular = popular_currencies();
        assert_eq!(popular.len(), 8);
        assert_eq!(popular[0].code, "USD");
    }

    #[test]
    fn test_pivot_is_known() {
        assert!(get_currency(PIVOT_CURRENCY).is_some());
    }
}
