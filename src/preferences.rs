//! Currency preferences
//!
//! One process-wide record: home/display currency, conversion behaviour,
//! rounding policy, plus recent and favourite currency lists.

use crate::fx::{RoundingMode, RoundingPolicy};
use serde::{Deserialize, Serialize};

/// Most-recent-first list length
pub const MAX_RECENT_CURRENCIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CurrencyPreferences {
    pub home_currency: String,
    pub display_currency: String,
    pub show_original_amount: bool,
    pub show_converted_amount: bool,
    pub auto_convert: bool,
    pub rounding_mode: RoundingMode,
    pub rounding_precision: u32,
    pub recent_currencies: Vec<String>,
    pub favorite_currencies: Vec<String>,
}

impl Default for CurrencyPreferences {
    fn default() -> Self {
        Self {
            home_currency: "USD".to_string(),
            display_currency: "USD".to_string(),
            show_original_amount: true,
            show_converted_amount: true,
            auto_convert: true,
            rounding_mode: RoundingMode::Nearest,
            rounding_precision: 2,
            recent_currencies: Vec::new(),
            favorite_currencies: Vec::new(),
        }
    }
}

impl CurrencyPreferences {
    pub fn rounding_policy(&self) -> RoundingPolicy {
        RoundingPolicy::new(self.rounding_mode, self.rounding_precision)
    }

    /// Move `code` to the front of the recent list, de-duplicated and capped
    pub fn record_recent(&mut self, code: &str) {
        self.recent_currencies.retain(|c| c != code);
        self.recent_currencies.insert(0, code.to_string());
        self.recent_currencies.truncate(MAX_RECENT_CURRENCIES);
    }

    /// Add or remove `code` from favourites; returns whether it is now a favourite
    pub fn toggle_favorite(&mut self, code: &str) -> bool {
        if let Some(idx) = self.favorite_currencies.iter().position(|c| c == code) {
            self.favorite_currencies.remove(idx);
            false
        } else {
            self.favorite_currencies.push(code.to_string());
            true
        }
    }

    pub fn is_favorite(&self, code: &str) -> bool {
        self.favorite_currencies.iter().any(|c| c == code)
    }
}

/// Partial update; `None` fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PreferencesUpdate {
    pub home_currency: Option<String>,
    pub display_currency: Option<String>,
    pub show_original_amount: Option<bool>,
    pub show_converted_amount: Option<bool>,
    pub auto_convert: Option<bool>,
    pub rounding_mode: Option<RoundingMode>,
    pub rounding_precision: Option<u32>,
    pub recent_currencies: Option<Vec<String>>,
    pub favorite_currencies: Option<Vec<String>>,
}

impl PreferencesUpdate {
    pub fn apply(self, prefs: &mut CurrencyPreferences) {
        if let Some(v) = self.home_currency {
            prefs.home_currency = v;
        }
        if let Some(v) = self.display_currency {
            prefs.display_currency = v;
        }
        if let Some(v) = self.show_original_amount {
            prefs.show_original_amount = v;
        }
        if let Some(v) = self.show_converted_amount {
            prefs.show_converted_amount = v;
        }
        if let Some(v) = self.auto_convert {
            prefs.auto_convert = v;
        }
        if let Some(v) = self.rounding_mode {
            prefs.rounding_mode = v;
        }
        if let Some(v) = self.rounding_precision {
            prefs.rounding_precision = v;
        }
        if let Some(mut v) = self.recent_currencies {
            let mut seen = Vec::with_capacity(v.len());
            v.retain(|c| {
                if seen.contains(c) {
                    false
                } else {
                    seen.push(c.clone());
                    true
                }
            });
            v.truncate(MAX_RECENT_CURRENCIES);
            prefs.recent_currencies = v;
        }
        if let Some(v) = self.favorite_currencies {
            prefs.favorite_currencies = v;
        }
    }
}
