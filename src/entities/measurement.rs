//! Measurement sheet - one imported set of rigging-line measurements

use serde::{Deserialize, Serialize};

use crate::core::line_id::{LineId, Side, LANES};

/// One line's measurement: label, nominal length and both measured halves
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineBlock {
    /// Free-text line label, e.g. "A7"
    #[serde(default)]
    pub line: String,

    /// Nominal length in millimetres
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nominal: Option<f64>,

    /// Measured length of the left line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meas_l: Option<f64>,

    /// Measured length of the right line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meas_r: Option<f64>,
}

impl LineBlock {
    pub fn new(
        line: impl Into<String>,
        nominal: Option<f64>,
        meas_l: Option<f64>,
        meas_r: Option<f64>,
    ) -> Self {
        Self {
            line: line.into(),
            nominal,
            meas_l,
            meas_r,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.line.trim().is_empty()
            && self.nominal.is_none()
            && self.meas_l.is_none()
            && self.meas_r.is_none()
    }

    pub fn has_label(&self) -> bool {
        !self.line.trim().is_empty()
    }

    pub fn line_id(&self) -> Option<LineId> {
        LineId::parse(&self.line)
    }

    pub fn measured(&self, side: Side) -> Option<f64> {
        match side {
            Side::Left => self.meas_l,
            Side::Right => self.meas_r,
        }
    }

    pub fn set_measured(&mut self, side: Side, value: Option<f64>) {
        match side {
            Side::Left => self.meas_l = value,
            Side::Right => self.meas_r = value,
        }
    }
}

/// One input row: a block per lane, in lane order A..D
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub blocks: [LineBlock; 4],
}

impl MeasurementRow {
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(LineBlock::is_empty)
    }

    /// Block of a lane letter, if the letter is one of the fixed lanes
    pub fn block(&self, lane: char) -> Option<&LineBlock> {
        crate::core::line_id::lane_index(lane).map(|i| &self.blocks[i])
    }

    /// Blocks paired with the lane letter of the column they were read from
    pub fn lane_blocks(&self) -> impl Iterator<Item = (char, &LineBlock)> {
        LANES.iter().copied().zip(self.blocks.iter())
    }
}

/// Session data entered on the sheet's second row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMeta {
    #[serde(default)]
    pub input1: String,

    #[serde(default)]
    pub input2: String,

    /// Allowed absolute deviation in mm; 0 disables flagging
    #[serde(default)]
    pub tolerance: f64,

    /// Global rig offset added to every measurement, in mm
    #[serde(default)]
    pub correction: f64,
}

impl SessionMeta {
    /// Name shown for the measured wing, built from both free-text inputs
    pub fn display_name(&self) -> String {
        format!("{} {}", self.input1.trim(), self.input2.trim())
            .trim()
            .to_string()
    }
}

fn default_delimiter() -> char {
    ','
}

/// A whole imported file, replaced wholesale on every import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementSheet {
    pub meta: SessionMeta,

    #[serde(default)]
    pub rows: Vec<MeasurementRow>,

    /// Delimiter detected on import, reused on export
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// First row as read (free headers)
    #[serde(default)]
    pub header_row: Vec<String>,

    /// Third row as read (column labels)
    #[serde(default)]
    pub label_row: Vec<String>,
}

impl Default for MeasurementSheet {
    fn default() -> Self {
        Self {
            meta: SessionMeta::default(),
            rows: Vec::new(),
            delimiter: default_delimiter(),
            header_row: Vec::new(),
            label_row: Vec::new(),
        }
    }
}

impl MeasurementSheet {
    /// Number of blocks that carry a line label
    pub fn line_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.blocks.iter())
            .filter(|b| b.has_label())
            .count()
    }
}
