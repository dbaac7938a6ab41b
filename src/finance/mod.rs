//! Finance module - expenses, budgets and the cash wallet
//!
//! All three share the currency service for conversion and the storage
//! layer for persistence. Amounts are stored in the currency they were
//! recorded in; home-currency figures are derived.

pub mod budget;
pub mod expense;
pub mod ledger;
pub mod wallet;

pub use budget::{AlertType, Budget, BudgetAlert, BudgetEngine, DEFAULT_ALERT_THRESHOLD};
pub use expense::{
    Expense, ExpenseCategory, ExpenseSummary, ExpenseUpdate, NewExpense, PaymentMethod,
};
pub use ledger::ExpenseLedger;
pub use wallet::{
    CashBalance, CashTransaction, CashTransactionType, CashWallet, CashWalletService,
    NewCashTransaction,
};
