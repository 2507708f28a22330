//! Per-group, per-side trim adjustments

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::line_id::Side;

/// `"<group>|<side>"` -> cumulative signed adjustment in mm
///
/// Entries only ever change through whole-table copies. Applying a change
/// twice adds it twice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdjustmentTable(BTreeMap<String, f64>);

impl AdjustmentTable {
    pub fn key(group: &str, side: Side) -> String {
        format!("{}|{}", group.trim(), side)
    }

    /// Adjustment stored under a raw key, 0 when absent
    pub fn value(&self, key: &str) -> f64 {
        self.0.get(key).copied().filter(|v| v.is_finite()).unwrap_or(0.0)
    }

    pub fn get(&self, group: &str, side: Side) -> f64 {
        self.value(&Self::key(group, side))
    }

    /// Copy of the table with `delta` added to the entry under `key`
    pub fn accumulate(&self, key: &str, delta: f64) -> Self {
        let mut next = self.clone();
        let total = self.value(key) + delta;
        next.0.insert(key.to_string(), total);
        next
    }

    /// Copy of the table with `delta` added to a group side
    pub fn add(&self, group: &str, side: Side, delta: f64) -> Self {
        self.accumulate(&Self::key(group, side), delta)
    }

    /// Copy of the table with a group side set to an absolute value
    pub fn with_value(&self, group: &str, side: Side, value: f64) -> Self {
        let mut next = self.clone();
        next.0.insert(Self::key(group, side), value);
        next
    }

    /// Copy of the table with one group side removed
    pub fn without(&self, group: &str, side: Side) -> Self {
        let mut next = self.clone();
        next.0.remove(&Self::key(group, side));
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
