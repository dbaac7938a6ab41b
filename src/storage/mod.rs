//! Key-value persistence
//!
//! The engine persists whole JSON documents under string keys. Every
//! read-mutate-write cycle on a key runs under that key's lock, so two
//! concurrent updates to the same collection cannot lose each other's writes.

pub mod memory;
#[cfg(feature = "rusqlite-support")]
pub mod sqlite;

pub use memory::InMemoryStore;
#[cfg(feature = "rusqlite-support")]
pub use sqlite::SqliteStore;

use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Storage keys
pub mod keys {
    pub const PREFERENCES: &str = "currency_preferences";
    pub const RATES: &str = "exchange_rates";
    pub const RATES_TIMESTAMP: &str = "exchange_rates_timestamp";
    pub const EXPENSES: &str = "expenses";
    pub const BUDGETS: &str = "budgets";
    pub const CASH_WALLET: &str = "cash_wallet";
    pub const QUICK_CONVERSIONS: &str = "quick_conversions";
}

/// Opaque string store. No transactions across keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`, `None` if never written
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value under `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// JSON documents over a [`KeyValueStore`] with per-key write serialization
pub struct Storage {
    store: Arc<dyn KeyValueStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Storage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Storage over a fresh [`InMemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    fn key_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw)
    }

    /// Load and decode the document under `key`
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let lock = self.key_lock(key);
        let _guard = lock_guard(&lock);
        self.read(key)
    }

    /// Encode and store `value` under `key`
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let lock = self.key_lock(key);
        let _guard = lock_guard(&lock);
        self.write(key, value)
    }

    /// Read-mutate-write under the key lock. The document starts from
    /// `init()` when absent. If `f` fails nothing is written.
    pub fn update_or<T, R, I, F>(&self, key: &str, init: I, f: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize,
        I: FnOnce() -> T,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let lock = self.key_lock(key);
        let _guard = lock_guard(&lock);

        let mut doc = match self.read::<T>(key)? {
            Some(doc) => doc,
            None => init(),
        };
        let out = f(&mut doc)?;
        self.write(key, &doc)?;
        Ok(out)
    }

    /// [`update_or`](Self::update_or) starting from `T::default()`
    pub fn update<T, R, F>(&self, key: &str, f: F) -> Result<R>
    where
        T: DeserializeOwned + Serialize + Default,
        F: FnOnce(&mut T) -> Result<R>,
    {
        self.update_or(key, T::default, f)
    }
}

fn lock_guard(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}
