//! Expense ledger - CRUD over expenses and summary aggregation
//!
//! Expenses live in one persisted list. A `trip_id` scope filters that list;
//! no scope means every expense.

use super::expense::{Expense, ExpenseSummary, ExpenseUpdate, NewExpense};
use crate::error::Result;
use crate::service::CurrencyService;
use crate::storage::{keys, Storage};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ExpenseLedger {
    storage: Arc<Storage>,
    currency: Arc<CurrencyService>,
}

impl ExpenseLedger {
    pub fn new(storage: Arc<Storage>, currency: Arc<CurrencyService>) -> Self {
        Self { storage, currency }
    }

    /// Fill in the conversion snapshot when auto-convert is on and the
    /// expense is not already in the home currency
    fn take_snapshot(&self, expense: &mut Expense) -> Result<()> {
        expense.clear_snapshot();

        let prefs = self.currency.preferences()?;
        if !prefs.auto_convert || expense.currency == prefs.home_currency {
            return Ok(());
        }

        match self
            .currency
            .convert(expense.amount, &expense.currency, &prefs.home_currency)?
        {
            Some(result) => {
                expense.converted_amount = Some(result.converted_amount);
                expense.converted_currency = Some(result.converted_currency);
                expense.exchange_rate_used = Some(result.rate);
            }
            None => log::warn!(
                "No rate {}/{}; expense {} stored without conversion",
                expense.currency,
                prefs.home_currency,
                expense.id
            ),
        }
        Ok(())
    }

    /// Record a new expense and remember its currency as recently used
    pub fn add_expense(&self, new: NewExpense) -> Result<Expense> {
        let mut expense = new.into_expense(Utc::now());
        self.take_snapshot(&mut expense)?;

        self.storage.update(keys::EXPENSES, |list: &mut Vec<Expense>| {
            list.push(expense.clone());
            Ok(())
        })?;
        log::debug!("Added expense {} ({} {})", expense.id, expense.amount, expense.currency);

        // Expense is already stored
        if let Err(e) = self.currency.add_recent_currency(&expense.currency) {
            log::warn!("Failed to record recent currency {}: {}", expense.currency, e);
        }
        Ok(expense)
    }

    /// Merge `update` into expense `id`. The conversion snapshot is retaken
    /// only when the update carries an amount or currency.
    pub fn update_expense(&self, id: Uuid, update: ExpenseUpdate) -> Result<Option<Expense>> {
        let recompute = update.touches_money();
        self.storage.update(keys::EXPENSES, |list: &mut Vec<Expense>| {
            let Some(slot) = list.iter_mut().find(|e| e.id == id) else {
                return Ok(None);
            };

            update.apply(slot, Utc::now());
            if recompute {
                self.take_snapshot(slot)?;
            }
            Ok(Some(slot.clone()))
        })
    }

    /// Remove by id; `false` when nothing matched
    pub fn delete_expense(&self, id: Uuid) -> Result<bool> {
        let removed = self.storage.update(keys::EXPENSES, |list: &mut Vec<Expense>| {
            let before = list.len();
            list.retain(|e| e.id != id);
            Ok(list.len() != before)
        })?;
        if removed {
            log::debug!("Deleted expense {}", id);
        }
        Ok(removed)
    }

    pub fn get_expense(&self, id: Uuid) -> Result<Option<Expense>> {
        Ok(self
            .all_expenses()?
            .into_iter()
            .find(|e| e.id == id))
    }

    fn all_expenses(&self) -> Result<Vec<Expense>> {
        Ok(self
            .storage
            .load::<Vec<Expense>>(keys::EXPENSES)?
            .unwrap_or_default())
    }

    /// Expenses in scope, newest date first
    pub fn get_expenses(&self, trip_id: Option<&str>) -> Result<Vec<Expense>> {
        let mut expenses: Vec<Expense> = self
            .all_expenses()?
            .into_iter()
            .filter(|e| e.in_scope(trip_id))
            .collect();
        expenses.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(expenses)
    }

    /// Recompute the summary for the scope from scratch
    pub fn get_expense_summary(&self, trip_id: Option<&str>) -> Result<ExpenseSummary> {
        let expenses = self.get_expenses(trip_id)?;
        let home = self.currency.home_currency()?;

        let mut failure = None;
        let summary = ExpenseSummary::compute(&expenses, &home, |amount, currency| {
            match self.currency.convert(amount, currency, &home) {
                Ok(result) => result.map(|r| r.converted_amount),
                Err(e) => {
                    if failure.is_none() {
                        failure = Some(e);
                    }
                    None
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::expense::ExpenseCategory;
    use crate::fx::{ExchangeRate, MockRateProvider, RateSource};
    use crate::error::LedgerError;
    use crate::preferences::PreferencesUpdate;
    use crate::storage::{InMemoryStore, KeyValueStore};
    use chrono::NaiveDate;

    fn ledger() -> ExpenseLedger {
        let storage = Arc::new(Storage::in_memory());
        let currency = Arc::new(
            CurrencyService::open(Arc::clone(&storage), Box::new(MockRateProvider::default())).unwrap(),
        );
        currency
            .insert_rate(ExchangeRate::new("EUR", "USD", 1.08, Utc::now(), RateSource::Api).unwrap())
            .unwrap();
        ExpenseLedger::new(storage, currency)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    #[test]
    fn test_add_expense_snapshots_conversion() {
        let ledger = ledger();
        let expense = ledger
            .add_expense(NewExpense::new(100.0, "EUR", "museum", ExpenseCategory::Activities, day(1)))
            .unwrap();

        assert_eq!(expense.converted_amount, Some(108.0));
        assert_eq!(expense.converted_currency.as_deref(), Some("USD"));
        assert_eq!(expense.exchange_rate_used, Some(1.08));
        assert_eq!(ledger.currency.preferences().unwrap().recent_currencies, vec!["EUR"]);
    }

    #[test]
    fn test_home_currency_expense_has_no_snapshot() {
        let ledger = ledger();
        let expense = ledger
            .add_expense(NewExpense::new(12.0, "USD", "coffee", ExpenseCategory::Food, day(1)))
            .unwrap();
        assert!(expense.converted_amount.is_none());
    }

    #[test]
    fn test_auto_convert_off() {
        let ledger = ledger();
        ledger
            .currency
            .save_preferences(PreferencesUpdate {
                auto_convert: Some(false),
                ..PreferencesUpdate::default()
            })
            .unwrap();

        let expense = ledger
            .add_expense(NewExpense::new(100.0, "EUR", "museum", ExpenseCategory::Activities, day(1)))
            .unwrap();
        assert!(expense.converted_amount.is_none());

        // Summary still converts on the fly
        let summary = ledger.get_expense_summary(None).unwrap();
        assert_eq!(summary.total_in_home_currency, 108.0);
    }

    #[test]
    fn test_snapshot_survives_rate_change() {
        let ledger = ledger();
        ledger
            .add_expense(NewExpense::new(100.0, "EUR", "hotel", ExpenseCategory::Accommodation, day(2)))
            .unwrap();
        ledger
            .currency
            .insert_rate(ExchangeRate::new("EUR", "USD", 2.0, Utc::now(), RateSource::Api).unwrap())
            .unwrap();

        let summary = ledger.get_expense_summary(None).unwrap();
        assert_eq!(summary.total_in_home_currency, 108.0);
    }

    #[test]
    fn test_update_description_keeps_snapshot() {
        let ledger = ledger();
        let expense = ledger
            .add_expense(NewExpense::new(100.0, "EUR", "hotel", ExpenseCategory::Accommodation, day(2)))
            .unwrap();
        ledger
            .currency
            .insert_rate(ExchangeRate::new("EUR", "USD", 2.0, Utc::now(), RateSource::Api).unwrap())
            .unwrap();

        let updated = ledger
            .update_expense(
                expense.id,
                ExpenseUpdate {
                    description: Some("boutique hotel".to_string()),
                    ..ExpenseUpdate::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.converted_amount, Some(108.0));
        assert!(updated.updated_at >= expense.updated_at);
    }

    #[test]
    fn test_update_amount_retakes_snapshot() {
        let ledger = ledger();
        let expense = ledger
            .add_expense(NewExpense::new(100.0, "EUR", "hotel", ExpenseCategory::Accommodation, day(2)))
            .unwrap();

        let updated = ledger
            .update_expense(
                expense.id,
                ExpenseUpdate {
                    amount: Some(50.0),
                    ..ExpenseUpdate::default()
                },
            )
            .unwrap()
            .unwrap();
        assert_eq!(updated.converted_amount, Some(54.0));

        let to_home = ledger
            .update_expense(
                expense.id,
                ExpenseUpdate {
                    currency: Some("USD".to_string()),
                    ..ExpenseUpdate::default()
                },
            )
            .unwrap()
            .unwrap();
        assert!(to_home.converted_amount.is_none());
    }

    #[test]
    fn test_update_missing() {
        let ledger = ledger();
        assert!(ledger
            .update_expense(Uuid::new_v4(), ExpenseUpdate::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_and_scope() {
        let ledger = ledger();
        let a = ledger
            .add_expense(NewExpense::new(10.0, "USD", "a", ExpenseCategory::Food, day(1)).for_trip("tokyo"))
            .unwrap();
        ledger
            .add_expense(NewExpense::new(20.0, "USD", "b", ExpenseCategory::Food, day(3)).for_trip("seoul"))
            .unwrap();

        assert_eq!(ledger.get_expenses(Some("tokyo")).unwrap().len(), 1);
        assert_eq!(ledger.get_expenses(None).unwrap().len(), 2);
        assert_eq!(ledger.get_expenses(None).unwrap()[0].description, "b");

        assert!(ledger.delete_expense(a.id).unwrap());
        assert!(!ledger.delete_expense(a.id).unwrap());
        assert!(ledger.get_expense(a.id).unwrap().is_none());

        let summary = ledger.get_expense_summary(Some("tokyo")).unwrap();
        assert_eq!(summary.count, 0);
    }

    #[test]
    fn test_unconvertible_expense_counts_zero() {
        let ledger = ledger();
        ledger
            .add_expense(NewExpense::new(10.0, "XYZ", "mystery", ExpenseCategory::Other, day(1)))
            .unwrap();
        ledger
            .add_expense(NewExpense::new(5.0, "USD", "snack", ExpenseCategory::Food, day(1)))
            .unwrap();

        let summary = ledger.get_expense_summary(None).unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.total_in_home_currency, 5.0);
        assert_eq!(summary.by_currency["XYZ"], 10.0);
    }

    /// Store that rejects writes to the preferences document
    struct NoPreferencesStore(InMemoryStore);

    impl KeyValueStore for NoPreferencesStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if key == keys::PREFERENCES {
                return Err(LedgerError::StorageError("read-only".to_string()));
            }
            self.0.set(key, value)
        }
    }

    #[test]
    fn test_add_expense_survives_recent_currency_failure() {
        let storage = Arc::new(Storage::new(Arc::new(NoPreferencesStore(InMemoryStore::new()))));
        let currency = Arc::new(
            CurrencyService::open(Arc::clone(&storage), Box::new(MockRateProvider::default())).unwrap(),
        );
        let ledger = ExpenseLedger::new(storage, Arc::clone(&currency));

        let expense = ledger
            .add_expense(NewExpense::new(30.0, "JPY", "ramen", ExpenseCategory::Food, day(3)))
            .unwrap();

        let stored = ledger.get_expenses(None).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, expense.id);
        assert!(currency.preferences().unwrap().recent_currencies.is_empty());
    }
}
