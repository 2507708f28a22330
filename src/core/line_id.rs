//! Line identifiers and wing sides
//!
//! A suspension line is labelled with a lane letter and a number, e.g. `A7`
//! or `c 012`. Lanes run front to back (A..D) and every line exists once on
//! the left and once on the right wing half.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The fixed lane letters, front to back
pub const LANES: [char; 4] = ['A', 'B', 'C', 'D'];

/// Position of a lane letter in [`LANES`]
pub fn lane_index(lane: char) -> Option<usize> {
    let upper = lane.to_ascii_uppercase();
    LANES.iter().position(|l| *l == upper)
}

/// Parsed line label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineId {
    /// Uppercase lane letter
    pub prefix: char,

    /// Line number within the lane, always >= 1
    pub index: u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid line label '{0}': expected a letter followed by a number, e.g. A7")]
pub struct LineIdError(pub String);

impl LineId {
    pub fn new(prefix: char, index: u32) -> Self {
        Self {
            prefix: prefix.to_ascii_uppercase(),
            index,
        }
    }

    /// Parse a free-text label such as `A7`, ` b 03 ` or `C012`
    ///
    /// Returns `None` when the label is not a single letter followed by
    /// digits, or when the number is zero.
    pub fn parse(label: &str) -> Option<Self> {
        let trimmed = label.trim();
        let mut chars = trimmed.chars();
        let letter = chars.next()?;
        if !letter.is_ascii_alphabetic() {
            return None;
        }

        let digits = chars.as_str().trim_start();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let significant = digits.trim_start_matches('0');
        if significant.is_empty() {
            return None;
        }

        let index = significant.parse::<u32>().ok()?;
        Some(Self::new(letter, index))
    }

    /// Canonical label used as part of storage keys
    ///
    /// Labels that do not parse are kept as trimmed text so they still get a
    /// stable key.
    pub fn canonical_label(label: &str) -> String {
        match Self::parse(label) {
            Some(id) => id.to_string(),
            None => label.trim().to_string(),
        }
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.index)
    }
}

impl FromStr for LineId {
    type Err = LineIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| LineIdError(s.to_string()))
    }
}

/// Wing half
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "L")]
    Left,
    #[serde(rename = "R")]
    Right,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Left, Side::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "L",
            Side::Right => "R",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "L" | "LEFT" => Ok(Side::Left),
            "R" | "RIGHT" => Ok(Side::Right),
            other => Err(format!("Invalid side '{}': expected L or R", other)),
        }
    }
}
