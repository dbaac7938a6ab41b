//! Budget engine
//!
//! One budget per scope (a trip, or global). Spending is derived from the
//! expense ledger's home-currency total; alerts are sticky once triggered.

use super::expense::ExpenseCategory;
use super::ledger::ExpenseLedger;
use crate::error::Result;
use crate::service::CurrencyService;
use crate::storage::{keys, Storage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Default warning level for new budgets, in percent
pub const DEFAULT_ALERT_THRESHOLD: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    /// Fires when percent used reaches `threshold`
    Threshold,
    /// Fires when remaining goes below zero
    Overspent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetAlert {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    pub message: String,
    pub triggered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub triggered_at: Option<DateTime<Utc>>,
}

impl BudgetAlert {
    pub fn threshold(percent: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            alert_type: AlertType::Threshold,
            threshold: Some(percent),
            message: format!("{}% of budget used", percent),
            triggered: false,
            triggered_at: None,
        }
    }

    pub fn overspent() -> Self {
        Self {
            id: Uuid::new_v4(),
            alert_type: AlertType::Overspent,
            threshold: None,
            message: "Budget exceeded".to_string(),
            triggered: false,
            triggered_at: None,
        }
    }

    fn condition_met(&self, percent_used: f64, remaining: f64) -> bool {
        match self.alert_type {
            AlertType::Threshold => self.threshold.is_some_and(|t| percent_used >= t),
            AlertType::Overspent => remaining < 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    pub name: String,
    pub total_amount: f64,
    pub currency: String,
    #[serde(default)]
    pub category_budgets: BTreeMap<ExpenseCategory, f64>,
    #[serde(default)]
    pub alerts: Vec<BudgetAlert>,
    #[serde(default)]
    pub spent: f64,
    #[serde(default)]
    pub remaining: f64,
    #[serde(default)]
    pub percent_used: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Budget {
    /// New budget with a threshold alert at [`DEFAULT_ALERT_THRESHOLD`] and an overspent alert
    pub fn new(name: impl Into<String>, total_amount: f64, currency: impl Into<String>, trip_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            trip_id,
            name: name.into(),
            total_amount,
            currency: currency.into(),
            category_budgets: BTreeMap::new(),
            alerts: vec![
                BudgetAlert::threshold(DEFAULT_ALERT_THRESHOLD),
                BudgetAlert::overspent(),
            ],
            spent: 0.0,
            remaining: total_amount,
            percent_used: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set spent and its derived figures, then evaluate alerts. Returns the
    /// alerts that fired on this call; already-triggered alerts stay triggered.
    pub fn apply_spent(&mut self, spent: f64, now: DateTime<Utc>) -> Vec<BudgetAlert> {
        self.spent = spent;
        self.remaining = self.total_amount - spent;
        self.percent_used = if self.total_amount == 0.0 {
            0.0
        } else {
            spent / self.total_amount * 100.0
        };
        self.updated_at = now;

        let mut fired = Vec::new();
        for alert in &mut self.alerts {
            if !alert.triggered && alert.condition_met(self.percent_used, self.remaining) {
                alert.triggered = true;
                alert.triggered_at = Some(now);
                fired.push(alert.clone());
            }
        }
        fired
    }

    /// Remaining amount clamped at zero for display
    pub fn display_remaining(&self) -> f64 {
        self.remaining.max(0.0)
    }
}

/// Budget for `trip_id`, else the first budget stored
fn find_budget_index(budgets: &[Budget], trip_id: Option<&str>) -> Option<usize> {
    budgets
        .iter()
        .position(|b| b.trip_id.as_deref() == trip_id)
        .or(if budgets.is_empty() { None } else { Some(0) })
}

pub struct BudgetEngine {
    storage: Arc<Storage>,
    currency: Arc<CurrencyService>,
    ledger: ExpenseLedger,
}

impl BudgetEngine {
    pub fn new(storage: Arc<Storage>, currency: Arc<CurrencyService>, ledger: ExpenseLedger) -> Self {
        Self {
            storage,
            currency,
            ledger,
        }
    }

    /// Upsert by id
    pub fn save_budget(&self, budget: Budget) -> Result<Budget> {
        self.storage.update(keys::BUDGETS, |list: &mut Vec<Budget>| {
            match list.iter_mut().find(|b| b.id == budget.id) {
                Some(slot) => *slot = budget.clone(),
                None => list.push(budget.clone()),
            }
            Ok(budget)
        })
    }

    pub fn list_budgets(&self) -> Result<Vec<Budget>> {
        Ok(self
            .storage
            .load::<Vec<Budget>>(keys::BUDGETS)?
            .unwrap_or_default())
    }

    /// Budget for the scope, falling back to the first stored budget
    pub fn get_budget(&self, trip_id: Option<&str>) -> Result<Option<Budget>> {
        let budgets = self.list_budgets()?;
        Ok(find_budget_index(&budgets, trip_id).map(|idx| budgets[idx].clone()))
    }

    pub fn delete_budget(&self, id: Uuid) -> Result<bool> {
        self.storage.update(keys::BUDGETS, |list: &mut Vec<Budget>| {
            let before = list.len();
            list.retain(|b| b.id != id);
            Ok(list.len() != before)
        })
    }

    /// Recompute spent/remaining/percent and alerts from the ledger. `None`
    /// when there is no budget at all.
    pub fn update_budget_from_expenses(&self, trip_id: Option<&str>) -> Result<Option<Budget>> {
        let summary = self.ledger.get_expense_summary(trip_id)?;
        let home = summary.home_currency.clone();

        self.storage.update(keys::BUDGETS, |list: &mut Vec<Budget>| {
            let Some(idx) = find_budget_index(list, trip_id) else {
                return Ok(None);
            };
            let budget = &mut list[idx];

            let spent = if budget.currency == home {
                summary.total_in_home_currency
            } else {
                match self
                    .currency
                    .convert(summary.total_in_home_currency, &home, &budget.currency)?
                {
                    Some(result) => result.converted_amount,
                    None => {
                        log::warn!(
                            "No rate {}/{} for budget {}; using home total",
                            home,
                            budget.currency,
                            budget.id
                        );
                        summary.total_in_home_currency
                    }
                }
            };

            for alert in budget.apply_spent(spent, Utc::now()) {
                log::info!("Budget '{}' alert: {}", budget.name, alert.message);
            }
            Ok(Some(budget.clone()))
        })
    }
}
