//! Shared helper functions for CLI commands

use console::style;

use crate::core::deviation::{DeviationResult, Severity};
use crate::core::numeric::{format_number, format_signed_mm};

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Plain text of an optional measurement, "-" when absent
pub fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| "-".to_string())
}

/// Signed deviation text, "-" when there is none
pub fn format_delta(result: &DeviationResult) -> String {
    result
        .finite_delta()
        .map(format_signed_mm)
        .unwrap_or_else(|| "-".to_string())
}

/// Deviation text colored by severity, for terminal output
pub fn styled_delta(result: &DeviationResult) -> String {
    let text = format_delta(result);
    match result.severity {
        Severity::Red => style(text).red().bold().to_string(),
        Severity::Yellow => style(text).yellow().to_string(),
        Severity::Ok => style(text).green().to_string(),
        Severity::None => style(text).dim().to_string(),
    }
}

/// Parse a lane letter argument
pub fn parse_lane(lane: char) -> Option<char> {
    let lane = lane.to_ascii_uppercase();
    lane.is_ascii_alphabetic().then_some(lane)
}
