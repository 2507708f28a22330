//! Target plan solver - loop corrections that bring group means toward zero
//!
//! For every group side the solver proposes a whole number of loop steps
//! opposite to the current mean deviation. Applying a plan adds each
//! proposal's millimetre change to the adjustment table.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::aggregate::GroupStat;
use crate::core::line_id::{lane_index, Side, LANES};
use crate::entities::adjustment::AdjustmentTable;
use crate::entities::profile::group_lane;

/// Loop step used when a profile carries no usable value
pub const DEFAULT_MM_PER_LOOP: f64 = 10.0;

/// Loop step actually used for a configured value
pub fn effective_step(mm_per_loop: f64) -> f64 {
    if mm_per_loop.is_finite() && mm_per_loop > 0.0 {
        mm_per_loop
    } else {
        DEFAULT_MM_PER_LOOP
    }
}

/// Which lanes take part in a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneFilter {
    enabled: [bool; 4],
}

impl Default for LaneFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl LaneFilter {
    pub fn all() -> Self {
        Self { enabled: [true; 4] }
    }

    pub fn none() -> Self {
        Self {
            enabled: [false; 4],
        }
    }

    pub fn with_lane(mut self, lane: char, enabled: bool) -> Self {
        if let Some(i) = lane_index(lane) {
            self.enabled[i] = enabled;
        }
        self
    }

    pub fn is_enabled(&self, lane: char) -> bool {
        lane_index(lane).map(|i| self.enabled[i]).unwrap_or(false)
    }

    /// Whether a group takes part in the plan
    ///
    /// Groups whose lane cannot be determined from their name, or whose lane
    /// is not one of A..D, are always included.
    pub fn includes_group(&self, group: &str) -> bool {
        match group_lane(group).and_then(lane_index) {
            Some(i) => self.enabled[i],
            None => true,
        }
    }
}

impl FromStr for LaneFilter {
    type Err = String;

    /// Parse a lane list such as `ABD`, `a,c` or `all`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        let mut filter = Self::none();
        for c in trimmed.chars().filter(|c| !c.is_whitespace() && *c != ',') {
            if lane_index(c).is_none() {
                return Err(format!("Invalid lane '{}': expected letters A-D", c));
            }
            filter = filter.with_lane(c, true);
        }
        Ok(filter)
    }
}

impl fmt::Display for LaneFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (lane, enabled) in LANES.iter().zip(self.enabled.iter()) {
            if *enabled {
                write!(f, "{}", lane)?;
            }
        }
        Ok(())
    }
}

/// Proposed loop correction for one group side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetProposal {
    pub group: String,
    pub side: Side,
    pub current_mean: f64,
    pub mm_per_loop: f64,
    pub loops_to_apply_signed: i64,
    pub extra_mm: f64,
    pub predicted_mean: f64,
}

impl TargetProposal {
    pub fn key(&self) -> String {
        AdjustmentTable::key(&self.group, self.side)
    }
}

/// Propose loop corrections for every included group side
///
/// `loops = -round(mean / step)` with halves rounded away from zero. Group
/// sides that need no loop are left out. The result lists the largest
/// absolute means first.
pub fn solve(stats: &[GroupStat], mm_per_loop: f64, lanes: &LaneFilter) -> Vec<TargetProposal> {
    let step = effective_step(mm_per_loop);

    let mut plan: Vec<TargetProposal> = stats
        .iter()
        .filter(|stat| stat.mean_delta.is_finite())
        .filter(|stat| lanes.includes_group(&stat.group))
        .filter_map(|stat| {
            let loops = -(stat.mean_delta / step).round() as i64;
            if loops == 0 {
                return None;
            }
            let extra_mm = loops as f64 * step;
            Some(TargetProposal {
                group: stat.group.clone(),
                side: stat.side,
                current_mean: stat.mean_delta,
                mm_per_loop: step,
                loops_to_apply_signed: loops,
                extra_mm,
                predicted_mean: stat.mean_delta + extra_mm,
            })
        })
        .collect();

    plan.sort_by(|a, b| b.current_mean.abs().total_cmp(&a.current_mean.abs()));
    plan
}

/// Adjustment table after applying a plan
///
/// Each proposal's `extra_mm` is added to the existing entry; applying the
/// same plan twice doubles the change.
pub fn apply_plan(adjustments: &AdjustmentTable, plan: &[TargetProposal]) -> AdjustmentTable {
    plan.iter().fold(adjustments.clone(), |table, proposal| {
        table.accumulate(&proposal.key(), proposal.extra_mm)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(group: &str, side: Side, mean: f64) -> GroupStat {
        GroupStat {
            group: group.to_string(),
            side,
            mean_delta: mean,
            samples: 1,
        }
    }

    #[test]
    fn test_solve_basic_proposal() {
        let plan = solve(&[stat("AR1", Side::Left, 23.0)], 10.0, &LaneFilter::all());
        assert_eq!(plan.len(), 1);
        let p = &plan[0];
        assert_eq!(p.loops_to_apply_signed, -2);
        assert_eq!(p.extra_mm, -20.0);
        assert_eq!(p.predicted_mean, 3.0);
        assert_eq!(p.mm_per_loop, 10.0);
    }

    #[test]
    fn test_solve_rounds_half_away_from_zero() {
        let plan = solve(
            &[stat("AR1", Side::Left, 15.0), stat("AR2", Side::Left, -15.0)],
            10.0,
            &LaneFilter::all(),
        );
        let by_group = |g: &str| plan.iter().find(|p| p.group == g).unwrap().loops_to_apply_signed;
        assert_eq!(by_group("AR1"), -2);
        assert_eq!(by_group("AR2"), 2);
    }

    #[test]
    fn test_solve_drops_zero_loop_entries() {
        let plan = solve(
            &[stat("AR1", Side::Left, 4.9), stat("AR1", Side::Right, -4.9)],
            10.0,
            &LaneFilter::all(),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_solve_sorts_worst_first() {
        let plan = solve(
            &[
                stat("AR1", Side::Left, 12.0),
                stat("BR1", Side::Left, -31.0),
                stat("CR1", Side::Right, 20.0),
            ],
            10.0,
            &LaneFilter::all(),
        );
        let groups: Vec<&str> = plan.iter().map(|p| p.group.as_str()).collect();
        assert_eq!(groups, vec!["BR1", "CR1", "AR1"]);
    }

    #[test]
    fn test_solve_respects_lane_filter() {
        let stats = [
            stat("AR1", Side::Left, 20.0),
            stat("BR1", Side::Left, 20.0),
            stat("Brake", Side::Left, 20.0),
        ];
        let lanes: LaneFilter = "B".parse().unwrap();
        let groups: Vec<String> = solve(&stats, 10.0, &lanes)
            .into_iter()
            .map(|p| p.group)
            .collect();
        // Brake has no lane and is always included
        assert_eq!(groups, vec!["BR1", "Brake"]);
    }

    #[test]
    fn test_solve_uses_default_step_when_invalid() {
        let plan = solve(&[stat("AR1", Side::Left, 20.0)], f64::NAN, &LaneFilter::all());
        assert_eq!(plan[0].mm_per_loop, 10.0);
        assert_eq!(plan[0].loops_to_apply_signed, -2);
    }

    #[test]
    fn test_apply_plan_accumulates() {
        let plan = solve(&[stat("AR1", Side::Left, 20.0)], 10.0, &LaneFilter::all());
        let once = apply_plan(&AdjustmentTable::default(), &plan);
        assert_eq!(once.get("AR1", Side::Left), -20.0);
        let twice = apply_plan(&once, &plan);
        assert_eq!(twice.get("AR1", Side::Left), -40.0);
    }

    #[test]
    fn test_lane_filter_parse_and_display() {
        let filter: LaneFilter = "a, c".parse().unwrap();
        assert!(filter.is_enabled('A'));
        assert!(!filter.is_enabled('B'));
        assert_eq!(filter.to_string(), "AC");
        assert_eq!("all".parse::<LaneFilter>().unwrap(), LaneFilter::all());
        assert!("AX".parse::<LaneFilter>().is_err());
    }
}
