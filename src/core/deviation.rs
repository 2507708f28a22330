//! Length deviation and severity classification
//!
//! A line's deviation is its effective length minus its nominal length:
//! `measured + correction + adjustment - nominal`. Loop corrections are folded
//! into `measured` before the deviation is taken.

use serde::{Deserialize, Serialize};

use crate::core::line_id::Side;
use crate::entities::loops::{LoopSetup, LoopTypeTable};

/// Width of the warning band below the tolerance, in mm
pub const WARN_MARGIN_MM: f64 = 3.0;

/// Signed deviation in mm, `None` when nominal or measurement is missing
pub fn deviation(
    nominal: Option<f64>,
    measured: Option<f64>,
    correction: f64,
    adjustment: f64,
) -> Option<f64> {
    let nominal = nominal?;
    let measured = measured?;
    Some(measured + correction + adjustment - nominal)
}

/// Length change configured for a line side through its maillon loop type
pub fn loop_delta(label: &str, side: Side, setup: &LoopSetup, types: &LoopTypeTable) -> f64 {
    types.delta_for(setup.type_for(label, side))
}

/// Severity band of a deviation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Severity {
    /// No data
    #[default]
    None,
    /// Inside the tolerance, outside the warning band
    Ok,
    /// Within 3 mm of the tolerance
    Yellow,
    /// At or beyond the tolerance
    Red,
}

impl Severity {
    /// Classify a deviation against a tolerance
    ///
    /// A tolerance of 0 or less disables flagging. The warning band starts a
    /// fixed 3 mm below the tolerance.
    pub fn classify(delta: Option<f64>, tolerance: f64) -> Self {
        let delta = match delta {
            Some(d) if d.is_finite() => d,
            _ => return Severity::None,
        };
        if tolerance.is_nan() || tolerance <= 0.0 {
            return Severity::Ok;
        }

        let warn_band = (tolerance - WARN_MARGIN_MM).max(0.0);
        let magnitude = delta.abs();
        if magnitude >= tolerance {
            Severity::Red
        } else if magnitude >= warn_band {
            Severity::Yellow
        } else {
            Severity::Ok
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::None => write!(f, "none"),
            Severity::Ok => write!(f, "ok"),
            Severity::Yellow => write!(f, "yellow"),
            Severity::Red => write!(f, "red"),
        }
    }
}

/// Deviation of one line side in one computation state
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DeviationResult {
    pub delta: Option<f64>,
    pub severity: Severity,
}

impl DeviationResult {
    pub fn evaluate(
        nominal: Option<f64>,
        measured: Option<f64>,
        correction: f64,
        adjustment: f64,
        tolerance: f64,
    ) -> Self {
        let delta = deviation(nominal, measured, correction, adjustment);
        Self {
            delta,
            severity: Severity::classify(delta, tolerance),
        }
    }

    /// Delta if present and finite
    pub fn finite_delta(&self) -> Option<f64> {
        self.delta.filter(|d| d.is_finite())
    }
}
