//! Number parsing and formatting shared by import, export and validation

/// Parse a decimal number that may use either `.` or `,` as decimal separator
///
/// Returns `None` for blank cells, unparsable text and non-finite values.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = trimmed.replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Read a finite number from a JSON value, accepting numeric strings
pub fn number_from_json(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        serde_json::Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Format a number without a trailing `.0` and without negative zero
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// Format a signed millimetre value for display, e.g. `+5.0` or `-2.5`
pub fn format_signed_mm(value: f64) -> String {
    if value == 0.0 {
        return "0.0".to_string();
    }
    format!("{:+.1}", value)
}
