//! Expense records and the derived summary

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Expense category
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Food,
    Transport,
    Accommodation,
    Activities,
    Shopping,
    Entertainment,
    Gifts,
    Health,
    Communication,
    Fees,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Mobile,
    Other,
}

/// A recorded expense. The `converted_*` fields are the conversion snapshot
/// taken when the expense was entered (or when its amount/currency changed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: Uuid,
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub category: ExpenseCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate_used: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Expense {
    pub fn in_scope(&self, trip_id: Option<&str>) -> bool {
        match trip_id {
            Some(trip) => self.trip_id.as_deref() == Some(trip),
            None => true,
        }
    }

    pub fn clear_snapshot(&mut self) {
        self.converted_amount = None;
        self.converted_currency = None;
        self.exchange_rate_used = None;
    }

    /// Snapshot value if it is expressed in `home`
    pub fn snapshot_in(&self, home: &str) -> Option<f64> {
        match (&self.converted_currency, self.converted_amount) {
            (Some(currency), Some(amount)) if currency == home => Some(amount),
            _ => None,
        }
    }
}

/// Input for a new expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExpense {
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub category: ExpenseCategory,
    #[serde(default)]
    pub vendor: Option<String>,
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub trip_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl NewExpense {
    /// Minimal expense paid by card; adjust fields as needed
    pub fn new(amount: f64, currency: impl Into<String>, description: impl Into<String>, category: ExpenseCategory, date: NaiveDate) -> Self {
        Self {
            amount,
            currency: currency.into(),
            description: description.into(),
            category,
            vendor: None,
            date,
            payment_method: PaymentMethod::Card,
            trip_id: None,
            notes: None,
            tags: None,
        }
    }

    pub fn for_trip(mut self, trip_id: impl Into<String>) -> Self {
        self.trip_id = Some(trip_id.into());
        self
    }

    pub fn into_expense(self, now: DateTime<Utc>) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            amount: self.amount,
            currency: self.currency,
            description: self.description,
            category: self.category,
            vendor: self.vendor,
            date: self.date,
            payment_method: self.payment_method,
            trip_id: self.trip_id,
            notes: self.notes,
            tags: self.tags,
            converted_amount: None,
            converted_currency: None,
            exchange_rate_used: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial expense update; `None` fields are left as they are
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpenseUpdate {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub vendor: Option<String>,
    pub date: Option<NaiveDate>,
    pub payment_method: Option<PaymentMethod>,
    pub trip_id: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ExpenseUpdate {
    /// Whether the update changes what the conversion snapshot was taken from
    pub fn touches_money(&self) -> bool {
        self.amount.is_some() || self.currency.is_some()
    }

    pub fn apply(self, expense: &mut Expense, now: DateTime<Utc>) {
        if let Some(v) = self.amount {
            expense.amount = v;
        }
        if let Some(v) = self.currency {
            expense.currency = v;
        }
        if let Some(v) = self.description {
            expense.description = v;
        }
        if let Some(v) = self.category {
            expense.category = v;
        }
        if let Some(v) = self.vendor {
            expense.vendor = Some(v);
        }
        if let Some(v) = self.date {
            expense.date = v;
        }
        if let Some(v) = self.payment_method {
            expense.payment_method = v;
        }
        if let Some(v) = self.trip_id {
            expense.trip_id = Some(v);
        }
        if let Some(v) = self.notes {
            expense.notes = Some(v);
        }
        if let Some(v) = self.tags {
            expense.tags = Some(v);
        }
        expense.updated_at = now;
    }
}

/// Aggregates over a scope of expenses.
///
/// `by_category`, `by_currency` and `by_date` sum the raw `amount` of each
/// expense regardless of its currency; only `total_in_home_currency` is
/// converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub total_in_home_currency: f64,
    pub home_currency: String,
    pub by_category: BTreeMap<ExpenseCategory, f64>,
    pub by_currency: BTreeMap<String, f64>,
    pub by_date: BTreeMap<NaiveDate, f64>,
    pub count: usize,
    pub average_per_day: f64,
}

impl ExpenseSummary {
    /// Build the summary. Each expense contributes to the home total by, in
    /// order: its own amount when already in `home`, its snapshot when that is
    /// in `home`, else `convert(amount, currency)`. Unconvertible expenses add zero.
    pub fn compute<F>(expenses: &[Expense], home: &str, mut convert: F) -> Self
    where
        F: FnMut(f64, &str) -> Option<f64>,
    {
        let mut total = 0.0;
        let mut by_category = BTreeMap::new();
        let mut by_currency = BTreeMap::new();
        let mut by_date = BTreeMap::new();
        let mut days = BTreeSet::new();

        for expense in expenses {
            let in_home = if expense.currency == home {
                Some(expense.amount)
            } else if let Some(snapshot) = expense.snapshot_in(home) {
                Some(snapshot)
            } else {
                convert(expense.amount, &expense.currency)
            };
            match in_home {
                Some(value) => total += value,
                None => log::warn!(
                    "Expense {} in {} has no rate to {}; excluded from total",
                    expense.id,
                    expense.currency,
                    home
                ),
            }

            *by_category.entry(expense.category).or_insert(0.0) += expense.amount;
            *by_currency.entry(expense.currency.clone()).or_insert(0.0) += expense.amount;
            *by_date.entry(expense.date).or_insert(0.0) += expense.amount;
            days.insert(expense.date);
        }

        let average_per_day = if days.is_empty() {
            0.0
        } else {
            total / days.len() as f64
        };

        Self {
            total_in_home_currency: total,
            home_currency: home.to_string(),
            by_category,
            by_currency,
            by_date,
            count: expenses.len(),
            average_per_day,
        }
    }
}
