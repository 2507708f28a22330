//! State aggregation - per-line deviations in three states and group means
//!
//! Every line side is evaluated three times:
//! - original: the raw measurement
//! - loops: the measurement plus its maillon loop change (the true
//!   "before trimming" baseline)
//! - after: loops plus the group side's adjustment
//!
//! Everything here is recomputed from scratch on each call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::core::deviation::{loop_delta, DeviationResult};
use crate::core::line_id::{LineId, Side};
use crate::core::plan::{solve, LaneFilter, TargetProposal};
use crate::entities::adjustment::AdjustmentTable;
use crate::entities::loops::{LoopSetup, LoopTypeTable};
use crate::entities::measurement::{MeasurementRow, SessionMeta};
use crate::entities::profile::{compare_groups, Profile};

/// Which of the three computation states to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    Original,
    Loops,
    #[default]
    After,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::Original => write!(f, "original"),
            StateKind::Loops => write!(f, "loops"),
            StateKind::After => write!(f, "after"),
        }
    }
}

/// All inputs of one recomputation
#[derive(Debug, Clone, Copy)]
pub struct ComputeInput<'a> {
    pub rows: &'a [MeasurementRow],
    pub profile: &'a Profile,
    pub loop_setup: &'a LoopSetup,
    pub loop_types: &'a LoopTypeTable,
    pub adjustments: &'a AdjustmentTable,
    pub meta: &'a SessionMeta,
    pub lanes: LaneFilter,
}

/// One side of a line in all three states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideStates {
    pub measured: Option<f64>,
    pub loop_type: String,
    pub loop_delta: f64,
    pub adjustment: f64,
    pub original: DeviationResult,
    pub loops: DeviationResult,
    pub after: DeviationResult,
}

impl SideStates {
    pub fn state(&self, kind: StateKind) -> &DeviationResult {
        match kind {
            StateKind::Original => &self.original,
            StateKind::Loops => &self.loops,
            StateKind::After => &self.after,
        }
    }

    /// Measurement with loop and adjustment applied
    pub fn applied_measurement(&self) -> Option<f64> {
        self.measured.map(|m| m + self.loop_delta + self.adjustment)
    }
}

/// One measured line with both sides evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStates {
    pub label: String,
    pub line_id: Option<LineId>,
    /// Lane column the block was read from
    pub column: char,
    pub group: Option<String>,
    pub nominal: f64,
    pub left: SideStates,
    pub right: SideStates,
}

impl LineStates {
    pub fn side(&self, side: Side) -> &SideStates {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

/// Mean after-state deviation of one group side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub group: String,
    pub side: Side,
    pub mean_delta: f64,
    /// Number of finite deltas in the mean
    pub samples: usize,
}

/// Result of one full recomputation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Computation {
    pub lines: Vec<LineStates>,
    pub stats: Vec<GroupStat>,
    pub plan: Vec<TargetProposal>,
}

/// Run the whole pipeline: line states, group means and target plan
pub fn compute(input: &ComputeInput<'_>) -> Computation {
    let lines = line_states(input);
    let stats = group_stats(&lines);
    let plan = solve(&stats, input.profile.step(), &input.lanes);
    Computation { lines, stats, plan }
}

/// Evaluate every block that has a line label and a nominal length
pub fn line_states(input: &ComputeInput<'_>) -> Vec<LineStates> {
    let tolerance = input.meta.tolerance;
    let correction = input.meta.correction;

    input
        .rows
        .iter()
        .flat_map(|row| row.lane_blocks())
        .filter(|(_, block)| block.has_label())
        .filter_map(|(column, block)| {
            let nominal = block.nominal?;
            let label = block.line.trim();
            let group = input.profile.group_for_line(label).map(str::to_string);

            let evaluate = |side: Side| {
                let measured = block.measured(side);
                let loop_type = input.loop_setup.type_for(label, side).to_string();
                let loop_d = loop_delta(label, side, input.loop_setup, input.loop_types);
                let adjustment = group
                    .as_deref()
                    .map(|g| input.adjustments.get(g, side))
                    .unwrap_or(0.0);
                let looped = measured.map(|m| m + loop_d);

                SideStates {
                    measured,
                    loop_type,
                    loop_delta: loop_d,
                    adjustment,
                    original: DeviationResult::evaluate(
                        Some(nominal),
                        measured,
                        correction,
                        0.0,
                        tolerance,
                    ),
                    loops: DeviationResult::evaluate(
                        Some(nominal),
                        looped,
                        correction,
                        0.0,
                        tolerance,
                    ),
                    after: DeviationResult::evaluate(
                        Some(nominal),
                        looped,
                        correction,
                        adjustment,
                        tolerance,
                    ),
                }
            };

            Some(LineStates {
                label: label.to_string(),
                line_id: block.line_id(),
                column,
                group: group.clone(),
                nominal,
                left: evaluate(Side::Left),
                right: evaluate(Side::Right),
            })
        })
        .collect()
}

/// Mean after-state deviation per group side
///
/// Only finite deltas of mapped lines count. A group side without any finite
/// delta produces no entry at all. Output is in group order, left before
/// right.
pub fn group_stats(lines: &[LineStates]) -> Vec<GroupStat> {
    let mut buckets: BTreeMap<(String, Side), (f64, usize)> = BTreeMap::new();

    for line in lines {
        let Some(group) = line.group.as_deref() else {
            continue;
        };
        for side in Side::ALL {
            if let Some(delta) = line.side(side).after.finite_delta() {
                let bucket = buckets.entry((group.to_string(), side)).or_insert((0.0, 0));
                bucket.0 += delta;
                bucket.1 += 1;
            }
        }
    }

    let mut stats: Vec<GroupStat> = buckets
        .into_iter()
        .map(|((group, side), (sum, count))| GroupStat {
            group,
            side,
            mean_delta: sum / count as f64,
            samples: count,
        })
        .collect();

    stats.sort_by(|a, b| compare_groups(&a.group, &b.group).then(a.side.cmp(&b.side)));
    stats
}

/// How a series combines the two sides of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesMode {
    Left,
    Right,
    #[default]
    Average,
}

/// One point of a per-lane series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub index: u32,
    pub value: f64,
}

/// Deviation series of one lane, ordered by line number
///
/// Averaging uses the single available side when only one has data; lines
/// with no data in the chosen mode are absent. When a line number appears
/// more than once, the first occurrence is used.
pub fn series(lines: &[LineStates], prefix: char, mode: SeriesMode, state: StateKind) -> Vec<SeriesPoint> {
    let prefix = prefix.to_ascii_uppercase();
    // Index -> value of the first occurrence, which may have no value
    let mut points: BTreeMap<u32, Option<f64>> = BTreeMap::new();

    for line in lines {
        let Some(id) = line.line_id else {
            continue;
        };
        if id.prefix != prefix || points.contains_key(&id.index) {
            continue;
        }
        let left = line.left.state(state).finite_delta();
        let right = line.right.state(state).finite_delta();
        let value = match mode {
            SeriesMode::Left => left,
            SeriesMode::Right => right,
            SeriesMode::Average => match (left, right) {
                (Some(l), Some(r)) => Some((l + r) / 2.0),
                (Some(v), None) | (None, Some(v)) => Some(v),
                (None, None) => None,
            },
        };
        points.insert(id.index, value);
    }

    points
        .into_iter()
        .filter_map(|(index, value)| value.map(|value| SeriesPoint { index, value }))
        .collect()
}

/// Direction a suggestion asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Shorten,
    Lengthen,
    #[serde(rename = "No change")]
    NoChange,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Shorten => write!(f, "Shorten"),
            Action::Lengthen => write!(f, "Lengthen"),
            Action::NoChange => write!(f, "No change"),
        }
    }
}

/// Per-group hint of how many loops the mean deviation corresponds to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub group: String,
    pub side: Side,
    pub mean_delta: f64,
    pub loops_signed: i64,
    pub action: Action,
    pub out_of_tol: bool,
}

/// Suggest loop counts for every group side
///
/// Positive loop counts mean the group is too long and should be
/// shortened.
pub fn suggest(stats: &[GroupStat], mm_per_loop: f64, tolerance: f64) -> Vec<Suggestion> {
    let step = crate::core::plan::effective_step(mm_per_loop);
    stats
        .iter()
        .map(|stat| {
            let loops_signed = (stat.mean_delta / step).round() as i64;
            let action = match loops_signed {
                n if n > 0 => Action::Shorten,
                n if n < 0 => Action::Lengthen,
                _ => Action::NoChange,
            };
            Suggestion {
                group: stat.group.clone(),
                side: stat.side,
                mean_delta: stat.mean_delta,
                loops_signed,
                action,
                out_of_tol: tolerance > 0.0 && stat.mean_delta.abs() >= tolerance,
            }
        })
        .collect()
}

/// Rows with loop changes and adjustments folded into the measurements
///
/// Used to export the sheet as it would measure after trimming. Blocks that
/// are skipped by the computation are copied unchanged.
pub fn applied_rows(input: &ComputeInput<'_>) -> Vec<MeasurementRow> {
    input
        .rows
        .iter()
        .map(|row| {
            let mut next = row.clone();
            for block in next.blocks.iter_mut() {
                if !block.has_label() || block.nominal.is_none() {
                    continue;
                }
                let label = block.line.trim().to_string();
                let group = input.profile.group_for_line(&label).map(str::to_string);
                for side in Side::ALL {
                    let adjustment = group
                        .as_deref()
                        .map(|g| input.adjustments.get(g, side))
                        .unwrap_or(0.0);
                    let delta = loop_delta(&label, side, input.loop_setup, input.loop_types);
                    let value = block.measured(side).map(|m| m + delta + adjustment);
                    block.set_measured(side, value);
                }
            }
            next
        })
        .collect()
}
