//! Value enums for command arguments
//!
//! Thin clap-facing mirrors of engine enums, so the engine does not depend
//! on clap.

use clap::ValueEnum;

use crate::core::aggregate::{SeriesMode, StateKind};
use crate::core::line_id::Side;

/// Computation state selector
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum StateArg {
    /// Raw measurement
    Original,
    /// Measurement with loop changes
    Loops,
    /// Loops plus group adjustments
    #[default]
    After,
}

impl From<StateArg> for StateKind {
    fn from(arg: StateArg) -> Self {
        match arg {
            StateArg::Original => StateKind::Original,
            StateArg::Loops => StateKind::Loops,
            StateArg::After => StateKind::After,
        }
    }
}

/// How a series combines both sides
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ModeArg {
    Left,
    Right,
    /// Mean of both sides, or the single available one
    #[default]
    Average,
}

impl From<ModeArg> for SeriesMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Left => SeriesMode::Left,
            ModeArg::Right => SeriesMode::Right,
            ModeArg::Average => SeriesMode::Average,
        }
    }
}

/// Wing side
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum SideArg {
    #[value(alias = "left")]
    L,
    #[value(alias = "right")]
    R,
    /// Both sides
    Both,
}

impl SideArg {
    /// Sides this selector covers
    pub fn sides(self) -> &'static [Side] {
        match self {
            SideArg::L => &[Side::Left],
            SideArg::R => &[Side::Right],
            SideArg::Both => &Side::ALL,
        }
    }
}

impl std::fmt::Display for SideArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SideArg::L => write!(f, "L"),
            SideArg::R => write!(f, "R"),
            SideArg::Both => write!(f, "L+R"),
        }
    }
}
