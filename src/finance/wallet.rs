//! Cash wallet - per-currency physical cash balances and their history

use crate::error::{LedgerError, Result};
use crate::fx::Money;
use crate::service::CurrencyService;
use crate::storage::{keys, Storage};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashTransactionType {
    Withdraw,
    Spend,
    Exchange,
    Receive,
    Adjustment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashBalance {
    pub currency: String,
    pub amount: f64,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashTransaction {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub tx_type: CashTransactionType,
    pub currency: String,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fees_currency: Option<String>,
}

impl CashTransaction {
    /// Currencies whose balance this transaction moves
    fn touches(&self, currency: &str) -> bool {
        self.currency == currency
            || self.from_currency.as_deref() == Some(currency)
            || self.to_currency.as_deref() == Some(currency)
    }
}

/// Input for a cash transaction; id and timestamps are assigned on apply
#[derive(Debug, Clone, PartialEq)]
pub struct NewCashTransaction {
    pub tx_type: CashTransactionType,
    pub currency: String,
    pub amount: f64,
    pub description: String,
    pub date: NaiveDate,
    pub from_currency: Option<String>,
    pub from_amount: Option<f64>,
    pub to_currency: Option<String>,
    pub to_amount: Option<f64>,
    pub fees: Option<f64>,
    pub fees_currency: Option<String>,
}

impl NewCashTransaction {
    pub fn simple(
        tx_type: CashTransactionType,
        amount: f64,
        currency: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            tx_type,
            currency: currency.into(),
            amount,
            description: description.into(),
            date: Utc::now().date_naive(),
            from_currency: None,
            from_amount: None,
            to_currency: None,
            to_amount: None,
            fees: None,
            fees_currency: None,
        }
    }

    /// Exchange `from_amount` of `from` for `to_amount` of `to`. The
    /// transaction is recorded on the receiving side.
    pub fn exchange(
        from: impl Into<String>,
        from_amount: f64,
        to: impl Into<String>,
        to_amount: f64,
        description: impl Into<String>,
    ) -> Self {
        let to = to.into();
        Self {
            tx_type: CashTransactionType::Exchange,
            currency: to.clone(),
            amount: to_amount,
            description: description.into(),
            date: Utc::now().date_naive(),
            from_currency: Some(from.into()),
            from_amount: Some(from_amount),
            to_currency: Some(to),
            to_amount: Some(to_amount),
            fees: None,
            fees_currency: None,
        }
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    /// Record fees; they are informational and not deducted from any balance
    pub fn with_fees(mut self, fees: f64, currency: impl Into<String>) -> Self {
        self.fees = Some(fees);
        self.fees_currency = Some(currency.into());
        self
    }

    fn validate(&self) -> Result<()> {
        let amounts = [Some(self.amount), self.from_amount, self.to_amount, self.fees];
        if amounts.iter().flatten().any(|a| !a.is_finite()) {
            return Err(LedgerError::InvalidInput(format!(
                "Cash amounts must be finite: {:?}",
                self
            )));
        }
        if self.tx_type == CashTransactionType::Exchange
            && (self.from_currency.is_none() || self.from_amount.is_none())
        {
            return Err(LedgerError::InvalidInput(
                "Exchange requires a source currency and amount".to_string(),
            ));
        }
        Ok(())
    }

    fn into_transaction(self, now: DateTime<Utc>) -> CashTransaction {
        let exchange_rate = match (self.from_amount, self.to_amount) {
            (Some(from), Some(to)) if from > 0.0 => Some(to / from),
            _ => None,
        };
        CashTransaction {
            id: Uuid::new_v4(),
            tx_type: self.tx_type,
            currency: self.currency,
            amount: self.amount,
            description: self.description,
            date: self.date,
            created_at: now,
            from_currency: self.from_currency,
            from_amount: self.from_amount,
            to_currency: self.to_currency,
            to_amount: self.to_amount,
            exchange_rate,
            fees: self.fees,
            fees_currency: self.fees_currency,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashWallet {
    pub home_currency: String,
    pub total_in_home_currency: f64,
    #[serde(default)]
    pub balances: Vec<CashBalance>,
    /// Newest first
    #[serde(default)]
    pub transactions: Vec<CashTransaction>,
}

impl CashWallet {
    pub fn new(home_currency: impl Into<String>) -> Self {
        Self {
            home_currency: home_currency.into(),
            total_in_home_currency: 0.0,
            balances: Vec::new(),
            transactions: Vec::new(),
        }
    }

    pub fn balance(&self, currency: &str) -> f64 {
        self.balances
            .iter()
            .find(|b| b.currency == currency)
            .map_or(0.0, |b| b.amount)
    }

    fn adjust_balance(&mut self, currency: &str, delta: f64, now: DateTime<Utc>) {
        match self.balances.iter_mut().find(|b| b.currency == currency) {
            Some(balance) => {
                balance.amount += delta;
                balance.last_updated = now;
            }
            None => self.balances.push(CashBalance {
                currency: currency.to_string(),
                amount: delta,
                last_updated: now,
            }),
        }
    }

    /// Record `tx` and move the balances it touches. Balances may go negative.
    pub fn apply(&mut self, tx: CashTransaction) {
        let now = tx.created_at;
        match tx.tx_type {
            CashTransactionType::Exchange => {
                if let (Some(from), Some(amount)) = (tx.from_currency.as_deref(), tx.from_amount) {
                    self.adjust_balance(from, -amount, now);
                }
                let to = tx.to_currency.as_deref().unwrap_or(&tx.currency);
                let received = tx.to_amount.unwrap_or(tx.amount);
                self.adjust_balance(to, received, now);
            }
            CashTransactionType::Spend => self.adjust_balance(&tx.currency, -tx.amount, now),
            CashTransactionType::Withdraw
            | CashTransactionType::Receive
            | CashTransactionType::Adjustment => self.adjust_balance(&tx.currency, tx.amount, now),
        }
        self.transactions.insert(0, tx);
    }

    fn holdings(&self) -> Vec<Money> {
        self.balances
            .iter()
            .map(|b| Money::new(b.amount, b.currency.clone()))
            .collect()
    }
}

pub struct CashWalletService {
    storage: Arc<Storage>,
    currency: Arc<CurrencyService>,
}

impl CashWalletService {
    pub fn new(storage: Arc<Storage>, currency: Arc<CurrencyService>) -> Self {
        Self { storage, currency }
    }

    fn refresh_total(&self, wallet: &mut CashWallet) -> Result<()> {
        wallet.home_currency = self.currency.home_currency()?;
        wallet.total_in_home_currency = self
            .currency
            .total_in(&wallet.holdings(), &wallet.home_currency)?;
        Ok(())
    }

    pub fn add_cash_transaction(&self, new: NewCashTransaction) -> Result<CashTransaction> {
        new.validate()?;
        let home = self.currency.home_currency()?;
        let tx = new.into_transaction(Utc::now());

        self.storage.update_or(
            keys::CASH_WALLET,
            || CashWallet::new(home),
            |wallet: &mut CashWallet| {
                wallet.apply(tx.clone());
                self.refresh_total(wallet)?;
                log::debug!(
                    "Cash {:?} {} {}; total {} {}",
                    tx.tx_type,
                    tx.amount,
                    tx.currency,
                    wallet.total_in_home_currency,
                    wallet.home_currency
                );
                Ok(tx)
            },
        )
    }

    pub fn withdraw_cash(&self, amount: f64, currency: &str, description: &str) -> Result<CashTransaction> {
        self.add_cash_transaction(NewCashTransaction::simple(
            CashTransactionType::Withdraw,
            amount,
            currency,
            description,
        ))
    }

    pub fn spend_cash(&self, amount: f64, currency: &str, description: &str) -> Result<CashTransaction> {
        self.add_cash_transaction(NewCashTransaction::simple(
            CashTransactionType::Spend,
            amount,
            currency,
            description,
        ))
    }

    pub fn receive_cash(&self, amount: f64, currency: &str, description: &str) -> Result<CashTransaction> {
        self.add_cash_transaction(NewCashTransaction::simple(
            CashTransactionType::Receive,
            amount,
            currency,
            description,
        ))
    }

    pub fn adjust_cash(&self, amount: f64, currency: &str, description: &str) -> Result<CashTransaction> {
        self.add_cash_transaction(NewCashTransaction::simple(
            CashTransactionType::Adjustment,
            amount,
            currency,
            description,
        ))
    }

    pub fn exchange_cash(
        &self,
        from: &str,
        from_amount: f64,
        to: &str,
        to_amount: f64,
        description: &str,
        fees: Option<(f64, String)>,
    ) -> Result<CashTransaction> {
        let mut new = NewCashTransaction::exchange(from, from_amount, to, to_amount, description);
        if let Some((amount, currency)) = fees {
            new = new.with_fees(amount, currency);
        }
        self.add_cash_transaction(new)
    }

    /// Stored wallet, or an empty one in the current home currency
    pub fn get_cash_wallet(&self) -> Result<CashWallet> {
        match self.storage.load::<CashWallet>(keys::CASH_WALLET)? {
            Some(wallet) => Ok(wallet),
            None => Ok(CashWallet::new(self.currency.home_currency()?)),
        }
    }

    pub fn get_cash_balance(&self, currency: &str) -> Result<f64> {
        Ok(self.get_cash_wallet()?.balance(currency))
    }

    /// History newest first, optionally limited to transactions touching `currency`
    pub fn get_cash_transactions(&self, currency: Option<&str>) -> Result<Vec<CashTransaction>> {
        let wallet = self.get_cash_wallet()?;
        Ok(match currency {
            Some(code) => wallet
                .transactions
                .into_iter()
                .filter(|tx| tx.touches(code))
                .collect(),
            None => wallet.transactions,
        })
    }

    /// Re-derive the home-currency total, e.g. after rates or the home currency change
    pub fn recalculate_wallet_total(&self) -> Result<CashWallet> {
        let home = self.currency.home_currency()?;
        self.storage.update_or(
            keys::CASH_WALLET,
            || CashWallet::new(home),
            |wallet: &mut CashWallet| {
                self.refresh_total(wallet)?;
                Ok(wallet.clone())
            },
        )
    }
}
