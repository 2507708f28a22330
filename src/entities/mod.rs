//! Session data: profiles, measurements, loops and adjustments

pub mod adjustment;
pub mod loops;
pub mod measurement;
pub mod profile;

pub use adjustment::AdjustmentTable;
pub use loops::{LoopError, LoopPreset, LoopPresets, LoopSetup, LoopTypeTable};
pub use measurement::{LineBlock, MeasurementRow, MeasurementSheet, SessionMeta};
pub use profile::{Profile, ProfileError, ProfileSet, Range};
