//! Workbench - owns every persisted table and runs the computation
//!
//! Each table sits in a [`Slot`] that only hands out shared references and
//! takes whole replacement values. A replacement is written to the store
//! immediately; a failed write is logged and the in-memory value is kept.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use crate::core::aggregate::{self, Computation, ComputeInput};
use crate::core::config::Config;
use crate::core::line_id::{LineId, Side};
use crate::core::plan::{self, LaneFilter, TargetProposal};
use crate::core::store::{keys, load_or, save, Store};
use crate::core::validate::validate_profile_set;
use crate::entities::adjustment::AdjustmentTable;
use crate::entities::loops::{LoopError, LoopPresets, LoopSetup, LoopTypeTable};
use crate::entities::measurement::{MeasurementRow, MeasurementSheet, SessionMeta};
use crate::entities::profile::{group_names, Profile, ProfileError, ProfileSet};
use crate::io::wide::{parse_wide, write_wide, ImportError};

/// Step of the tuning workflow the user is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStep {
    #[default]
    Import,
    Profile,
    Loops,
    Trim,
}

impl WorkflowStep {
    pub const ALL: [WorkflowStep; 4] = [
        WorkflowStep::Import,
        WorkflowStep::Profile,
        WorkflowStep::Loops,
        WorkflowStep::Trim,
    ];

    /// Following step; the last step stays put
    pub fn next(self) -> Self {
        match self {
            WorkflowStep::Import => WorkflowStep::Profile,
            WorkflowStep::Profile => WorkflowStep::Loops,
            WorkflowStep::Loops | WorkflowStep::Trim => WorkflowStep::Trim,
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStep::Import => write!(f, "import"),
            WorkflowStep::Profile => write!(f, "profile"),
            WorkflowStep::Loops => write!(f, "loops"),
            WorkflowStep::Trim => write!(f, "trim"),
        }
    }
}

impl FromStr for WorkflowStep {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "import" => Ok(WorkflowStep::Import),
            "profile" => Ok(WorkflowStep::Profile),
            "loops" => Ok(WorkflowStep::Loops),
            "trim" => Ok(WorkflowStep::Trim),
            _ => Err(format!(
                "Invalid step: {}. Use import, profile, loops, or trim",
                s
            )),
        }
    }
}

/// A persisted value with write-through replacement
#[derive(Debug)]
struct Slot<T> {
    key: &'static str,
    value: T,
}

impl<T: Serialize + DeserializeOwned> Slot<T> {
    fn load<S: Store>(store: &S, key: &'static str, default: impl FnOnce() -> T) -> Self {
        Self {
            key,
            value: load_or(store, key, default),
        }
    }

    fn get(&self) -> &T {
        &self.value
    }

    fn replace<S: Store>(&mut self, store: &mut S, next: T) {
        if let Err(e) = save(store, self.key, &next) {
            tracing::warn!("Failed to persist '{}': {}", self.key, e);
        }
        self.value = next;
    }
}

/// What an import replaced the sheet with
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub name: String,
    pub rows: usize,
    pub lines: usize,
    pub delimiter: char,
}

/// Group side as listed by `wingtrim groups`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupOverview {
    pub group: String,
    pub side: Side,
    /// `None` when no line of the group side has a finite deviation
    pub mean_delta: Option<f64>,
    pub samples: usize,
    pub adjustment: f64,
}

/// Summary of a profile document import
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileImport {
    pub imported: Vec<String>,
    pub warnings: Vec<String>,
}

/// Controller owning the tuning session state
pub struct Workbench<S: Store> {
    store: S,
    config: Config,
    step: Slot<WorkflowStep>,
    profiles: Slot<ProfileSet>,
    active_profile: Slot<Option<String>>,
    adjustments: Slot<AdjustmentTable>,
    loop_types: Slot<LoopTypeTable>,
    loop_setup: Slot<LoopSetup>,
    loop_presets: Slot<LoopPresets>,
    sheet: Slot<Option<MeasurementSheet>>,
}

impl<S: Store> Workbench<S> {
    /// Load every table from the store, using defaults for what is missing
    pub fn open(store: S, config: Config) -> Self {
        Self {
            step: Slot::load(&store, keys::STEP, WorkflowStep::default),
            profiles: Slot::load(&store, keys::PROFILES, ProfileSet::builtin),
            active_profile: Slot::load(&store, keys::ACTIVE_PROFILE, || None),
            adjustments: Slot::load(&store, keys::ADJUSTMENTS, AdjustmentTable::default),
            loop_types: Slot::load(&store, keys::LOOP_TYPES, LoopTypeTable::default),
            loop_setup: Slot::load(&store, keys::LOOP_SETUP, LoopSetup::default),
            loop_presets: Slot::load(&store, keys::LOOP_PRESETS, LoopPresets::default),
            sheet: Slot::load(&store, keys::SHEET, || None),
            store,
            config,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn step(&self) -> WorkflowStep {
        *self.step.get()
    }

    pub fn profiles(&self) -> &ProfileSet {
        self.profiles.get()
    }

    pub fn adjustments(&self) -> &AdjustmentTable {
        self.adjustments.get()
    }

    pub fn loop_types(&self) -> &LoopTypeTable {
        self.loop_types.get()
    }

    pub fn loop_setup(&self) -> &LoopSetup {
        self.loop_setup.get()
    }

    pub fn loop_presets(&self) -> &LoopPresets {
        self.loop_presets.get()
    }

    pub fn sheet(&self) -> Option<&MeasurementSheet> {
        self.sheet.get().as_ref()
    }

    pub fn rows(&self) -> &[MeasurementRow] {
        self.sheet().map(|s| s.rows.as_slice()).unwrap_or(&[])
    }

    // ---- workflow ----

    pub fn set_step(&mut self, step: WorkflowStep) {
        self.step.replace(&mut self.store, step);
    }

    /// Replace the measurement sheet with a parsed file
    ///
    /// A rejected file leaves the previous sheet in place.
    pub fn import_csv(&mut self, text: &str) -> Result<ImportSummary, ImportError> {
        let sheet = parse_wide(text)?;
        let summary = ImportSummary {
            name: sheet.meta.display_name(),
            rows: sheet.rows.len(),
            lines: sheet.line_count(),
            delimiter: sheet.delimiter,
        };
        tracing::info!("Imported sheet '{}' with {} lines", summary.name, summary.lines);

        self.sheet.replace(&mut self.store, Some(sheet));
        if self.step() == WorkflowStep::Import {
            self.set_step(WorkflowStep::Profile);
        }
        Ok(summary)
    }

    /// Serialize the current sheet, optionally with trims folded in
    pub fn export_csv(&self, applied: bool) -> Result<String, ImportError> {
        let sheet = self.sheet().ok_or(ImportError::NoSheet)?;
        if applied {
            write_wide(sheet, &self.applied_rows())
        } else {
            write_wide(sheet, &sheet.rows)
        }
    }

    // ---- profiles ----

    /// Key of the profile in use: the selected one if it still exists,
    /// else the first stored profile
    pub fn active_profile_key(&self) -> Option<&str> {
        match self.active_profile.get().as_deref() {
            Some(key) if self.profiles().contains(key) => Some(key),
            _ => self.profiles().first().map(|(key, _)| key),
        }
    }

    /// Profile in use, falling back to the built-in default
    pub fn active_profile(&self) -> Cow<'_, Profile> {
        match self.active_profile_key().and_then(|key| self.profiles().get(key)) {
            Some(profile) => Cow::Borrowed(profile),
            None => Cow::Owned(Profile::default()),
        }
    }

    pub fn set_active_profile(&mut self, key: &str) -> Result<(), ProfileError> {
        if !self.profiles().contains(key) {
            return Err(ProfileError::NotFound(key.to_string()));
        }
        self.active_profile
            .replace(&mut self.store, Some(key.to_string()));
        Ok(())
    }

    /// Add or replace a profile; returns its validation errors
    pub fn upsert_profile(&mut self, key: &str, profile: Profile) -> Result<Vec<String>, ProfileError> {
        let warnings = profile.validate(key);
        let next = self.profiles().with_profile(key, profile)?;
        self.profiles.replace(&mut self.store, next);
        Ok(warnings)
    }

    pub fn remove_profile(&mut self, key: &str) -> Result<(), ProfileError> {
        let next = self.profiles().without_profile(key)?;
        self.profiles.replace(&mut self.store, next);
        if self.active_profile.get().as_deref() == Some(key) {
            self.active_profile.replace(&mut self.store, None);
        }
        Ok(())
    }

    /// Merge a profile document into the stored set
    ///
    /// Profiles with structural errors are still imported; the errors come
    /// back as warnings.
    pub fn import_profiles(&mut self, content: &str) -> Result<ProfileImport, ProfileError> {
        let document: serde_json::Value = serde_json::from_str(content)?;
        let incoming = ProfileSet::from_json(&document)?;
        let warnings = validate_profile_set(&document);
        let imported: Vec<String> = incoming.keys().map(str::to_string).collect();

        let next = self.profiles().merged(&incoming);
        self.profiles.replace(&mut self.store, next);
        tracing::info!("Imported {} profile(s)", imported.len());

        Ok(ProfileImport { imported, warnings })
    }

    pub fn export_profiles(&self) -> Result<String, ProfileError> {
        self.profiles().to_json_pretty()
    }

    // ---- loops ----

    pub fn set_loop_type(&mut self, name: &str, delta_mm: f64) -> Result<(), LoopError> {
        let next = self.loop_types().with_type(name, delta_mm)?;
        self.loop_types.replace(&mut self.store, next);
        Ok(())
    }

    /// Remove a loop type; lines still assigned to it count as 0 mm
    pub fn remove_loop_type(&mut self, name: &str) -> Result<(), LoopError> {
        let next = self.loop_types().without_type(name)?;
        self.loop_types.replace(&mut self.store, next);
        Ok(())
    }

    pub fn assign_loop(&mut self, label: &str, side: Side, loop_type: &str) -> Result<(), LoopError> {
        if !self.loop_types().contains(loop_type) {
            return Err(LoopError::UnknownType(loop_type.to_string()));
        }
        let next = self.loop_setup().with_assignment(label, side, loop_type);
        self.loop_setup.replace(&mut self.store, next);
        Ok(())
    }

    pub fn clear_loops(&mut self) {
        self.loop_setup.replace(&mut self.store, LoopSetup::default());
    }

    pub fn save_preset(&mut self, name: &str) -> Result<(), LoopError> {
        let next = self
            .loop_presets()
            .with_preset(name, self.loop_setup().clone())?;
        self.loop_presets.replace(&mut self.store, next);
        Ok(())
    }

    /// Replace the loop setup with a saved snapshot
    pub fn load_preset(&mut self, name: &str) -> Result<(), LoopError> {
        let setup = self
            .loop_presets()
            .get(name)
            .map(|preset| preset.setup.clone())
            .ok_or_else(|| LoopError::UnknownPreset(name.to_string()))?;
        self.loop_setup.replace(&mut self.store, setup);
        Ok(())
    }

    pub fn delete_preset(&mut self, name: &str) -> Result<(), LoopError> {
        let next = self.loop_presets().without_preset(name)?;
        self.loop_presets.replace(&mut self.store, next);
        Ok(())
    }

    // ---- adjustments ----

    pub fn set_adjustment(&mut self, group: &str, side: Side, value_mm: f64) {
        let next = self.adjustments().with_value(group, side, value_mm);
        self.adjustments.replace(&mut self.store, next);
    }

    pub fn add_adjustment(&mut self, group: &str, side: Side, delta_mm: f64) {
        let next = self.adjustments().add(group, side, delta_mm);
        self.adjustments.replace(&mut self.store, next);
    }

    pub fn reset_adjustment(&mut self, group: &str, side: Side) {
        let next = self.adjustments().without(group, side);
        self.adjustments.replace(&mut self.store, next);
    }

    pub fn reset_adjustments(&mut self) {
        self.adjustments
            .replace(&mut self.store, AdjustmentTable::default());
    }

    /// Solve the plan for the current state and add it to the adjustments
    pub fn apply_plan(&mut self, lanes: LaneFilter) -> Vec<TargetProposal> {
        let proposals = self.compute(lanes).plan;
        if proposals.is_empty() {
            tracing::info!("Plan is empty, adjustments unchanged");
            return proposals;
        }
        let next = plan::apply_plan(self.adjustments(), &proposals);
        self.adjustments.replace(&mut self.store, next);
        tracing::info!("Applied plan with {} proposal(s)", proposals.len());
        proposals
    }

    // ---- computation ----

    /// Tolerance in effect: the configured override, else the sheet's
    pub fn tolerance(&self) -> f64 {
        self.config
            .tolerance_override
            .or_else(|| self.sheet().map(|s| s.meta.tolerance))
            .unwrap_or(0.0)
    }

    /// Sheet metadata with the effective tolerance
    pub fn meta(&self) -> SessionMeta {
        let mut meta = self.sheet().map(|s| s.meta.clone()).unwrap_or_default();
        meta.tolerance = self.tolerance();
        meta
    }

    /// Recompute every line, group mean and the target plan
    pub fn compute(&self, lanes: LaneFilter) -> Computation {
        let profile = self.active_profile();
        let meta = self.meta();
        aggregate::compute(&ComputeInput {
            rows: self.rows(),
            profile: &profile,
            loop_setup: self.loop_setup(),
            loop_types: self.loop_types(),
            adjustments: self.adjustments(),
            meta: &meta,
            lanes,
        })
    }

    /// Rows as they would measure with loops and adjustments applied
    pub fn applied_rows(&self) -> Vec<MeasurementRow> {
        let profile = self.active_profile();
        let meta = self.meta();
        aggregate::applied_rows(&ComputeInput {
            rows: self.rows(),
            profile: &profile,
            loop_setup: self.loop_setup(),
            loop_types: self.loop_types(),
            adjustments: self.adjustments(),
            meta: &meta,
            lanes: LaneFilter::all(),
        })
    }

    /// Groups of the active profile the current sheet resolves to, or every
    /// declared group when nothing resolves
    pub fn group_names(&self) -> Vec<String> {
        group_names(&self.active_profile(), self.rows())
    }

    /// One entry per group side of [`Self::group_names`], with the mean when
    /// the side has measurements
    pub fn group_overview(&self) -> Vec<GroupOverview> {
        let stats = self.compute(LaneFilter::all()).stats;
        self.group_names()
            .into_iter()
            .flat_map(|group| Side::ALL.map(|side| (group.clone(), side)))
            .map(|(group, side)| {
                let stat = stats.iter().find(|s| s.group == group && s.side == side);
                GroupOverview {
                    adjustment: self.adjustments().get(&group, side),
                    mean_delta: stat.map(|s| s.mean_delta),
                    samples: stat.map(|s| s.samples).unwrap_or(0),
                    group,
                    side,
                }
            })
            .collect()
    }

    /// Group of a line in the active profile
    pub fn group_for_line(&self, label: &str) -> Option<String> {
        LineId::parse(label)
            .and_then(|id| self.active_profile().group_for_id(id).map(str::to_string))
    }

    /// Hand the store back, e.g. to reopen it in tests
    pub fn into_store(self) -> S {
        self.store
    }
}
