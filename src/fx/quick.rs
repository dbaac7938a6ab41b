//! Quick conversions: most-recently-used currency pairs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of remembered pairs
pub const MAX_QUICK_CONVERSIONS: usize = 10;

/// Preset amounts offered for a new pair
pub const DEFAULT_COMMON_AMOUNTS: [f64; 8] = [1.0, 5.0, 10.0, 20.0, 50.0, 100.0, 500.0, 1000.0];

/// A remembered ordered `(from, to)` pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickConversion {
    pub id: Uuid,
    pub from: String,
    pub to: String,
    pub common_amounts: Vec<f64>,
    pub last_used: DateTime<Utc>,
}

/// Touch `(from, to)` in an MRU list: existing pairs move to the front with a
/// fresh `last_used`, new pairs are inserted at the front. The list is capped.
pub fn touch_pair(list: &mut Vec<QuickConversion>, from: &str, to: &str, now: DateTime<Utc>) -> QuickConversion {
    let entry = match list.iter().position(|q| q.from == from && q.to == to) {
        Some(idx) => {
            let mut existing = list.remove(idx);
            existing.last_used = now;
            existing
        }
        None => QuickConversion {
            id: Uuid::new_v4(),
            from: from.to_string(),
            to: to.to_string(),
            common_amounts: DEFAULT_COMMON_AMOUNTS.to_vec(),
            last_used: now,
        },
    };

    list.insert(0, entry.clone());
    list.truncate(MAX_QUICK_CONVERSIONS);
    entry
}
