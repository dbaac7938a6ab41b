//! Currency service
//!
//! Owns the rate table and the cached preferences, and is the single place
//! conversions and display formatting happen for the rest of the engine.
//! Cached state is replaced only after storage accepted the write.

use crate::currency::{self, Currency};
use crate::error::{LedgerError, Result};
use crate::format::{self, FormatOptions};
use crate::fx::quick::{self, QuickConversion};
use crate::fx::{
    seed_rates, ConversionResult, ConvertedMoney, Converter, ExchangeRate, Money, RateLookup,
    RateProvider, RateSource, RateTable,
};
use crate::preferences::{CurrencyPreferences, PreferencesUpdate};
use crate::storage::{keys, Storage};
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

pub struct CurrencyService {
    storage: Arc<Storage>,
    provider: Box<dyn RateProvider>,
    rates: RwLock<RateTable>,
    preferences: RwLock<CurrencyPreferences>,
}

impl CurrencyService {
    /// Load preferences and rates from storage. Without persisted rates the
    /// table is seeded from the static reference rates.
    pub fn open(storage: Arc<Storage>, provider: Box<dyn RateProvider>) -> Result<Self> {
        let preferences = storage
            .load::<CurrencyPreferences>(keys::PREFERENCES)?
            .unwrap_or_default();

        let last_fetched = storage.load::<DateTime<Utc>>(keys::RATES_TIMESTAMP)?;
        let table = match storage.load::<Vec<ExchangeRate>>(keys::RATES)? {
            Some(rates) if !rates.is_empty() => {
                log::debug!("Loaded {} persisted rates", rates.len());
                RateTable::from_rates(rates, last_fetched)?
            }
            _ => {
                log::debug!("No persisted rates, seeding reference table");
                RateTable::from_rates(seed_rates(Utc::now(), RateSource::Cached), None)?
            }
        };

        Ok(Self {
            storage,
            provider,
            rates: RwLock::new(table),
            preferences: RwLock::new(preferences),
        })
    }

    fn rate_table(&self) -> Result<RwLockReadGuard<'_, RateTable>> {
        self.rates
            .read()
            .map_err(|e| LedgerError::StorageError(format!("Rate table lock poisoned: {}", e)))
    }

    // ---- Reference data ----

    pub fn get_currency(&self, code: &str) -> Option<&'static Currency> {
        currency::get_currency(code)
    }

    pub fn get_all_currencies(&self) -> &'static [Currency] {
        currency::all_currencies()
    }

    pub fn search_currencies(&self, query: &str) -> Vec<&'static Currency> {
        currency::search_currencies(query)
    }

    pub fn get_popular_currencies(&self) -> Vec<&'static Currency> {
        currency::popular_currencies()
    }

    // ---- Preferences ----

    /// Current preferences (cached copy)
    pub fn preferences(&self) -> Result<CurrencyPreferences> {
        self.preferences
            .read()
            .map(|p| p.clone())
            .map_err(|e| LedgerError::StorageError(format!("Preferences lock poisoned: {}", e)))
    }

    /// Re-read preferences from storage into the cache
    pub fn load_preferences(&self) -> Result<CurrencyPreferences> {
        let loaded = self
            .storage
            .load::<CurrencyPreferences>(keys::PREFERENCES)?
            .unwrap_or_default();
        self.replace_cached_preferences(loaded.clone())?;
        Ok(loaded)
    }

    pub fn home_currency(&self) -> Result<String> {
        Ok(self.preferences()?.home_currency)
    }

    fn update_preferences<R>(&self, f: impl FnOnce(&mut CurrencyPreferences) -> R) -> Result<(CurrencyPreferences, R)> {
        let (updated, out) = self.storage.update(keys::PREFERENCES, |prefs: &mut CurrencyPreferences| {
            let out = f(prefs);
            Ok((prefs.clone(), out))
        })?;
        self.replace_cached_preferences(updated.clone())?;
        Ok((updated, out))
    }

    fn replace_cached_preferences(&self, prefs: CurrencyPreferences) -> Result<()> {
        let mut cached = self
            .preferences
            .write()
            .map_err(|e| LedgerError::StorageError(format!("Preferences lock poisoned: {}", e)))?;
        *cached = prefs;
        Ok(())
    }

    /// Merge a partial update and persist
    pub fn save_preferences(&self, update: PreferencesUpdate) -> Result<CurrencyPreferences> {
        let (prefs, ()) = self.update_preferences(|prefs| update.apply(prefs))?;
        log::info!("Preferences saved (home {})", prefs.home_currency);
        Ok(prefs)
    }

    /// Restore defaults
    pub fn reset_preferences(&self) -> Result<CurrencyPreferences> {
        let defaults = CurrencyPreferences::default();
        self.storage.save(keys::PREFERENCES, &defaults)?;
        self.replace_cached_preferences(defaults.clone())?;
        Ok(defaults)
    }

    pub fn add_recent_currency(&self, code: &str) -> Result<()> {
        self.update_preferences(|prefs| prefs.record_recent(code))?;
        Ok(())
    }

    /// Returns whether `code` is a favourite after the toggle
    pub fn toggle_favorite_currency(&self, code: &str) -> Result<bool> {
        let (_, now_favorite) = self.update_preferences(|prefs| prefs.toggle_favorite(code))?;
        Ok(now_favorite)
    }

    // ---- Rates ----

    /// Full table refresh from the provider. `false` on provider or storage failure,
    /// in which case the current table stays in place.
    pub fn fetch_latest_rates(&self, base: &str) -> bool {
        match self.try_fetch_latest_rates(base) {
            Ok(count) => {
                log::info!("Refreshed {} rates from {} (base {})", count, self.provider.name(), base);
                true
            }
            Err(e) => {
                log::error!("Rate refresh failed: {}", e);
                false
            }
        }
    }

    fn write_rate_table(&self) -> Result<RwLockWriteGuard<'_, RateTable>> {
        self.rates
            .write()
            .map_err(|e| LedgerError::StorageError(format!("Rate table lock poisoned: {}", e)))
    }

    fn try_fetch_latest_rates(&self, base: &str) -> Result<usize> {
        let rates = self.provider.fetch_rates(base)?;
        let fetched_at = Utc::now();

        let mut fresh = RateTable::new();
        fresh.replace_all(rates, fetched_at)?;
        let snapshot = fresh.rates();

        let mut table = self.write_rate_table()?;
        self.storage.save(keys::RATES, &snapshot)?;
        if let Err(e) = self.storage.save(keys::RATES_TIMESTAMP, &fetched_at) {
            // Put the stored table back so rates and timestamp stay paired
            if let Err(restore) = self.storage.save(keys::RATES, &table.rates()) {
                log::error!("Failed to restore persisted rates: {}", restore);
            }
            return Err(e);
        }
        *table = fresh;
        Ok(snapshot.len())
    }

    /// Add or overwrite one stored pair and persist the table
    pub fn insert_rate(&self, rate: ExchangeRate) -> Result<()> {
        let mut table = self.write_rate_table()?;
        let mut candidate = table.clone();
        candidate.insert(rate)?;
        self.storage.save(keys::RATES, &candidate.rates())?;
        *table = candidate;
        Ok(())
    }

    pub fn get_rate(&self, from: &str, to: &str) -> Result<Option<ExchangeRate>> {
        Ok(self.rate_table()?.get_rate(from, to))
    }

    pub fn rates_last_fetched(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.rate_table()?.last_fetched())
    }

    pub fn rate_table_snapshot(&self) -> Result<Vec<ExchangeRate>> {
        Ok(self.rate_table()?.rates())
    }

    // ---- Conversion ----

    /// Convert with the global rounding policy. `Ok(None)` means no rate path.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Result<Option<ConversionResult>> {
        let policy = self.preferences()?.rounding_policy();
        let table = self.rate_table()?;
        Ok(Converter::new(&*table, policy).convert(amount, from, to))
    }

    pub fn convert_to_home(&self, money: &Money) -> Result<Option<ConvertedMoney>> {
        let prefs = self.preferences()?;
        let table = self.rate_table()?;
        Ok(Converter::new(&*table, prefs.rounding_policy()).convert_to_home(money, &prefs.home_currency))
    }

    /// Sum `amounts` in `target`; entries without a rate contribute zero
    pub fn total_in(&self, amounts: &[Money], target: &str) -> Result<f64> {
        let policy = self.preferences()?.rounding_policy();
        let table = self.rate_table()?;
        Ok(Converter::new(&*table, policy).total_in(amounts, target))
    }

    // ---- Formatting ----

    pub fn format(&self, amount: f64, currency_code: &str, options: &FormatOptions) -> String {
        format::format_amount(amount, currency_code, options)
    }

    pub fn format_money(&self, money: &Money, options: &FormatOptions) -> String {
        format::format_money(money, options)
    }

    /// `"<original> (≈ <converted>)"`, or just the original when the target is
    /// the same currency or no rate exists. Target defaults to the display currency.
    pub fn format_with_conversion(&self, money: &Money, target: Option<&str>) -> Result<String> {
        let options = FormatOptions::default();
        let original = format::format_money(money, &options);

        let target = match target {
            Some(t) => t.to_string(),
            None => self.preferences()?.display_currency,
        };
        if target == money.currency {
            return Ok(original);
        }

        Ok(match self.convert(money.amount, &money.currency, &target)? {
            Some(result) => format!(
                "{} (≈ {})",
                original,
                format::format_amount(result.converted_amount, &target, &options)
            ),
            None => original,
        })
    }

    // ---- Quick conversions ----

    /// Most recently used first
    pub fn get_quick_conversions(&self) -> Result<Vec<QuickConversion>> {
        let mut list = self
            .storage
            .load::<Vec<QuickConversion>>(keys::QUICK_CONVERSIONS)?
            .unwrap_or_default();
        list.sort_by(|a, b| b.last_used.cmp(&a.last_used));
        Ok(list)
    }

    pub fn add_quick_conversion(&self, from: &str, to: &str) -> Result<QuickConversion> {
        self.storage.update(keys::QUICK_CONVERSIONS, |list: &mut Vec<QuickConversion>| {
            Ok(quick::touch_pair(list, from, to, Utc::now()))
        })
    }

    pub fn remove_quick_conversion(&self, id: Uuid) -> Result<bool> {
        self.storage.update(keys::QUICK_CONVERSIONS, |list: &mut Vec<QuickConversion>| {
            let before = list.len();
            list.retain(|q| q.id != id);
            Ok(list.len() != before)
        })
    }
}
