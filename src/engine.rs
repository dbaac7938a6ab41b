//! Ledger engine - wires storage, the currency service and the finance services

use crate::config::EngineConfig;
use crate::error::Result;
use crate::finance::{
    Budget, BudgetEngine, CashWalletService, Expense, ExpenseLedger, ExpenseUpdate, NewExpense,
};
use crate::fx::{MockRateProvider, RateProvider};
use crate::service::CurrencyService;
use crate::storage::{InMemoryStore, KeyValueStore, Storage};
use std::sync::Arc;
use uuid::Uuid;

/// Top-level handle over one persisted ledger
pub struct LedgerEngine {
    config: EngineConfig,
    storage: Arc<Storage>,
    currency: Arc<CurrencyService>,
    ledger: ExpenseLedger,
    budgets: BudgetEngine,
    wallet: CashWalletService,
}

impl LedgerEngine {
    /// Open with the configured store and the mock rate feed
    pub fn open(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let store = Self::open_store(&config)?;
        let provider = Box::new(MockRateProvider::new(config.rate_jitter));
        Self::with_store(store, provider, config)
    }

    #[cfg(feature = "rusqlite-support")]
    fn open_store(config: &EngineConfig) -> Result<Arc<dyn KeyValueStore>> {
        use crate::storage::SqliteStore;

        Ok(match &config.storage_path {
            Some(path) => {
                log::info!("Opening ledger at {}", path.display());
                Arc::new(SqliteStore::open(path)?)
            }
            None => Arc::new(InMemoryStore::new()),
        })
    }

    #[cfg(not(feature = "rusqlite-support"))]
    fn open_store(config: &EngineConfig) -> Result<Arc<dyn KeyValueStore>> {
        if config.storage_path.is_some() {
            return Err(crate::error::LedgerError::ConfigError(
                "storage_path requires the rusqlite-support feature".to_string(),
            ));
        }
        Ok(Arc::new(InMemoryStore::new()))
    }

    /// Build over an explicit store and rate provider
    pub fn with_store(
        store: Arc<dyn KeyValueStore>,
        provider: Box<dyn RateProvider>,
        config: EngineConfig,
    ) -> Result<Self> {
        let storage = Arc::new(Storage::new(store));
        let currency = Arc::new(CurrencyService::open(Arc::clone(&storage), provider)?);
        let ledger = ExpenseLedger::new(Arc::clone(&storage), Arc::clone(&currency));
        let budgets = BudgetEngine::new(Arc::clone(&storage), Arc::clone(&currency), ledger.clone());
        let wallet = CashWalletService::new(Arc::clone(&storage), Arc::clone(&currency));

        Ok(Self {
            config,
            storage,
            currency,
            ledger,
            budgets,
            wallet,
        })
    }

    /// In-memory engine with default settings
    pub fn in_memory() -> Result<Self> {
        Self::open(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<Storage> {
        &self.storage
    }

    pub fn currency(&self) -> &Arc<CurrencyService> {
        &self.currency
    }

    pub fn ledger(&self) -> &ExpenseLedger {
        &self.ledger
    }

    pub fn budgets(&self) -> &BudgetEngine {
        &self.budgets
    }

    pub fn wallet(&self) -> &CashWalletService {
        &self.wallet
    }

    /// Refresh rates from the configured base currency
    pub fn refresh_rates(&self) -> bool {
        self.currency.fetch_latest_rates(&self.config.base_currency)
    }

    // ---- Expense mutations that keep the scope's budget current ----

    /// Recompute the budgets of the touched trip scopes, then the global
    /// budget, whose scope covers every expense
    fn refresh_budgets(&self, scopes: &[Option<&str>]) -> Result<()> {
        for scope in scopes.iter().flatten() {
            self.budgets.update_budget_from_expenses(Some(scope))?;
        }

        let has_global = self
            .budgets
            .list_budgets()?
            .iter()
            .any(|b| b.trip_id.is_none());
        if has_global {
            self.budgets.update_budget_from_expenses(None)?;
        }
        Ok(())
    }

    pub fn add_expense(&self, new: NewExpense) -> Result<Expense> {
        let expense = self.ledger.add_expense(new)?;
        self.refresh_budgets(&[expense.trip_id.as_deref()])?;
        Ok(expense)
    }

    pub fn update_expense(&self, id: Uuid, update: ExpenseUpdate) -> Result<Option<Expense>> {
        let previous_scope = self.ledger.get_expense(id)?.and_then(|e| e.trip_id);
        let updated = self.ledger.update_expense(id, update)?;
        if let Some(expense) = &updated {
            let old = previous_scope.as_deref().filter(|s| Some(*s) != expense.trip_id.as_deref());
            self.refresh_budgets(&[expense.trip_id.as_deref(), old])?;
        }
        Ok(updated)
    }

    pub fn delete_expense(&self, id: Uuid) -> Result<bool> {
        let scope = self.ledger.get_expense(id)?.and_then(|e| e.trip_id);
        let removed = self.ledger.delete_expense(id)?;
        if removed {
            self.refresh_budgets(&[scope.as_deref()])?;
        }
        Ok(removed)
    }

    /// Store a budget and immediately evaluate it against current spending
    pub fn save_budget(&self, budget: Budget) -> Result<Option<Budget>> {
        let trip_id = budget.trip_id.clone();
        self.budgets.save_budget(budget)?;
        self.budgets.update_budget_from_expenses(trip_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::ExpenseCategory;
    use chrono::NaiveDate;

    #[test]
    fn test_expense_updates_budget() {
        let engine = LedgerEngine::in_memory().unwrap();
        engine
            .save_budget(Budget::new("Lisbon", 100.0, "USD", Some("lisbon".to_string())))
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let expense = engine
            .add_expense(NewExpense::new(90.0, "USD", "hotel", ExpenseCategory::Accommodation, date).for_trip("lisbon"))
            .unwrap();

        let budget = engine.budgets().get_budget(Some("lisbon")).unwrap().unwrap();
        assert_eq!(budget.spent, 90.0);
        assert!(budget.alerts[0].triggered);

        engine.delete_expense(expense.id).unwrap();
        let budget = engine.budgets().get_budget(Some("lisbon")).unwrap().unwrap();
        assert_eq!(budget.spent, 0.0);
        assert_eq!(budget.remaining, 100.0);
        // Threshold alert stays triggered
        assert!(budget.alerts[0].triggered);
    }

    #[test]
    fn test_trip_expense_updates_global_budget() {
        let engine = LedgerEngine::in_memory().unwrap();
        engine
            .save_budget(Budget::new("Everything", 100.0, "USD", None))
            .unwrap();
        engine
            .save_budget(Budget::new("Rome", 100.0, "USD", Some("rome".to_string())))
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        let expense = engine
            .add_expense(NewExpense::new(90.0, "USD", "hotel", ExpenseCategory::Accommodation, date).for_trip("rome"))
            .unwrap();

        let global = engine.budgets().get_budget(None).unwrap().unwrap();
        assert!(global.trip_id.is_none());
        assert_eq!(global.spent, 90.0);
        assert!(global.alerts[0].triggered);
        let rome = engine.budgets().get_budget(Some("rome")).unwrap().unwrap();
        assert_eq!(rome.spent, 90.0);

        engine.delete_expense(expense.id).unwrap();
        let global = engine.budgets().get_budget(None).unwrap().unwrap();
        assert_eq!(global.spent, 0.0);
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let config = EngineConfig {
            rate_jitter: 2.0,
            ..EngineConfig::default()
        };
        assert!(LedgerEngine::open(config).is_err());
    }

    #[test]
    fn test_refresh_rates() {
        let engine = LedgerEngine::in_memory().unwrap();
        assert!(engine.currency().rates_last_fetched().unwrap().is_none());
        assert!(engine.refresh_rates());
        assert!(engine.currency().rates_last_fetched().unwrap().is_some());
    }

    #[cfg(feature = "rusqlite-support")]
    #[test]
    fn test_sqlite_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig {
            storage_path: Some(dir.path().join("ledger.sqlite3")),
            ..EngineConfig::default()
        };
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        {
            let engine = LedgerEngine::open(config.clone()).unwrap();
            engine
                .add_expense(NewExpense::new(12.5, "USD", "lunch", ExpenseCategory::Food, date))
                .unwrap();
        }

        let engine = LedgerEngine::open(config).unwrap();
        let expenses = engine.ledger().get_expenses(None).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].description, "lunch");
    }
}
