//! Core module - the tuning engine, persistence and session controller

pub mod aggregate;
pub mod config;
pub mod deviation;
pub mod line_id;
pub mod numeric;
pub mod plan;
pub mod store;
pub mod validate;
pub mod workbench;

pub use aggregate::{
    compute, group_stats, series, suggest, Action, Computation, ComputeInput, GroupStat,
    LineStates, SeriesMode, SeriesPoint, SideStates, StateKind, Suggestion,
};
pub use config::{Config, ConfigError};
pub use deviation::{deviation, loop_delta, DeviationResult, Severity};
pub use line_id::{LineId, Side, LANES};
pub use plan::{apply_plan, solve, LaneFilter, TargetProposal};
pub use store::{FileStore, MemoryStore, Store, StoreError};
pub use validate::{validate_profile, validate_profile_set};
pub use workbench::{GroupOverview, ImportSummary, ProfileImport, Workbench, WorkflowStep};
