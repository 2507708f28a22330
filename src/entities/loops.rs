//! Maillon loop types, per-line loop assignments and saved presets

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::core::line_id::{LineId, Side};

/// Baseline loop type; lines without an assignment use it
pub const BASE_LOOP: &str = "SL";

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("Unknown loop type '{0}'. Define it first with 'wingtrim loops type <name> <mm>'")]
    UnknownType(String),

    #[error("Loop type name must not be empty")]
    EmptyName,

    #[error("Loop length must be a finite number, got {0}")]
    InvalidDelta(f64),

    #[error("Loop preset '{0}' not found")]
    UnknownPreset(String),

    #[error("The baseline loop type '{BASE_LOOP}' cannot be removed")]
    BaseType,
}

/// Loop type name -> signed length change in mm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoopTypeTable(BTreeMap<String, f64>);

impl Default for LoopTypeTable {
    fn default() -> Self {
        let mut types = BTreeMap::new();
        types.insert(BASE_LOOP.to_string(), 0.0);
        types.insert("L1".to_string(), -5.0);
        types.insert("L2".to_string(), -10.0);
        types.insert("L3".to_string(), -15.0);
        Self(types)
    }
}

impl LoopTypeTable {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Length change of a loop type; unknown or deleted types count as 0
    pub fn delta_for(&self, name: &str) -> f64 {
        self.get(name).filter(|v| v.is_finite()).unwrap_or(0.0)
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

    /// Copy of the table with a type defined or redefined
    pub fn with_type(&self, name: &str, delta: f64) -> Result<Self, LoopError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LoopError::EmptyName);
        }
        if !delta.is_finite() {
            return Err(LoopError::InvalidDelta(delta));
        }
        let mut next = self.clone();
        next.0.insert(name.to_string(), delta);
        Ok(next)
    }

    /// Copy of the table without a type
    pub fn without_type(&self, name: &str) -> Result<Self, LoopError> {
        if name == BASE_LOOP {
            return Err(LoopError::BaseType);
        }
        if !self.contains(name) {
            return Err(LoopError::UnknownType(name.to_string()));
        }
        let mut next = self.clone();
        next.0.remove(name);
        Ok(next)
    }
}

/// `"<line>|<side>"` -> loop type name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoopSetup(BTreeMap<String, String>);

impl LoopSetup {
    pub fn key(label: &str, side: Side) -> String {
        format!("{}|{}", LineId::canonical_label(label), side)
    }

    /// Loop type configured for a line side, `SL` when unset
    pub fn type_for(&self, label: &str, side: Side) -> &str {
        self.0
            .get(&Self::key(label, side))
            .map(String::as_str)
            .unwrap_or(BASE_LOOP)
    }

    /// Copy of the setup with one line side assigned
    ///
    /// Assigning the baseline type removes the entry so the table only holds
    /// deviations from the default.
    pub fn with_assignment(&self, label: &str, side: Side, loop_type: &str) -> Self {
        let mut next = self.clone();
        let key = Self::key(label, side);
        if loop_type == BASE_LOOP {
            next.0.remove(&key);
        } else {
            next.0.insert(key, loop_type.to_string());
        }
        next
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Named snapshot of a loop setup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopPreset {
    pub setup: LoopSetup,
    pub saved: DateTime<Utc>,
}

/// Preset name -> snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoopPresets(BTreeMap<String, LoopPreset>);

impl LoopPresets {
    pub fn get(&self, name: &str) -> Option<&LoopPreset> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LoopPreset)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn with_preset(&self, name: &str, setup: LoopSetup) -> Result<Self, LoopError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LoopError::EmptyName);
        }
        let mut next = self.clone();
        next.0.insert(
            name.to_string(),
            LoopPreset {
                setup,
                saved: Utc::now(),
            },
        );
        Ok(next)
    }

    pub fn without_preset(&self, name: &str) -> Result<Self, LoopError> {
        if !self.0.contains_key(name) {
            return Err(LoopError::UnknownPreset(name.to_string()));
        }
        let mut next = self.clone();
        next.0.remove(name);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_types_include_baseline() {
        let types = LoopTypeTable::default();
        assert_eq!(types.get(BASE_LOOP), Some(0.0));
        assert!(types.len() > 1);
    }

    #[test]
    fn test_unknown_type_counts_as_zero() {
        let types = LoopTypeTable::default();
        assert_eq!(types.delta_for("nope"), 0.0);
        assert_eq!(types.delta_for("L2"), -10.0);
    }

    #[test]
    fn test_with_type_rejects_bad_input() {
        let types = LoopTypeTable::default();
        assert!(matches!(types.with_type(" ", 1.0), Err(LoopError::EmptyName)));
        assert!(matches!(
            types.with_type("X", f64::NAN),
            Err(LoopError::InvalidDelta(_))
        ));
        let next = types.with_type(" XL ", 7.5).unwrap();
        assert_eq!(next.get("XL"), Some(7.5));
        assert_eq!(types.get("XL"), None);
    }

    #[test]
    fn test_without_type() {
        let types = LoopTypeTable::default().without_type("L1").unwrap();
        assert!(!types.contains("L1"));
        assert!(types.without_type("L1").is_err());
        assert!(matches!(
            types.without_type(BASE_LOOP),
            Err(LoopError::BaseType)
        ));
    }

    #[test]
    fn test_setup_defaults_to_baseline() {
        let setup = LoopSetup::default();
        assert_eq!(setup.type_for("A1", Side::Left), BASE_LOOP);
    }

    #[test]
    fn test_setup_keys_use_canonical_label() {
        let setup = LoopSetup::default().with_assignment("a01", Side::Right, "L1");
        assert_eq!(setup.type_for("A1", Side::Right), "L1");
        assert_eq!(setup.type_for("A1", Side::Left), BASE_LOOP);
        assert_eq!(setup.iter().next(), Some(("A1|R", "L1")));
    }

    #[test]
    fn test_assigning_baseline_removes_entry() {
        let setup = LoopSetup::default()
            .with_assignment("A1", Side::Left, "L2")
            .with_assignment("A1", Side::Left, BASE_LOOP);
        assert!(setup.is_empty());
    }

    #[test]
    fn test_presets_snapshot_setup() {
        let setup = LoopSetup::default().with_assignment("B3", Side::Left, "L1");
        let presets = LoopPresets::default().with_preset("race", setup.clone()).unwrap();
        assert_eq!(presets.get("race").map(|p| &p.setup), Some(&setup));
        assert!(presets.without_preset("other").is_err());
        assert!(presets.without_preset("race").unwrap().is_empty());
    }
}
