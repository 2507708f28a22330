//! Profile validation - structural checks and range overlap detection
//!
//! Validation works on the raw JSON form so that malformed entries, which the
//! typed [`Profile`](crate::entities::profile::Profile) silently drops, are
//! still reported. Errors are advisory: a profile with errors can still be
//! stored and used.

use serde_json::Value;

use crate::core::line_id::LANES;
use crate::core::numeric::{format_number, number_from_json};

/// A range that passed the per-entry checks, kept for the overlap pass
struct CheckedRange {
    min: f64,
    max: f64,
}

/// Collect every structural error of one profile
///
/// An empty result means the profile is valid.
pub fn validate_profile(key: &str, profile: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    let label = if key.trim().is_empty() { "<unnamed>" } else { key };
    let prefix = format!("profile '{}'", label);

    match profile.as_object() {
        None => {
            errors.push(format!("{}: must be an object", prefix));
        }
        Some(object) => {
            let name_ok = object
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|n| !n.trim().is_empty());
            if !name_ok {
                errors.push(format!("{}: name must be a non-empty string", prefix));
            }

            let mm_ok = object
                .get("mmPerLoop")
                .and_then(Value::as_f64)
                .is_some_and(f64::is_finite);
            if !mm_ok {
                errors.push(format!("{}: mmPerLoop must be a finite number", prefix));
            }

            match object.get("mapping").and_then(Value::as_object) {
                None => errors.push(format!("{}: mapping must be an object", prefix)),
                Some(mapping) => {
                    for lane in LANES {
                        validate_lane(&prefix, lane, mapping.get(&lane.to_string()), &mut errors);
                    }
                }
            }
        }
    }

    if key.trim().is_empty() {
        errors.push("profile key must be a non-empty string".to_string());
    }

    errors
}

fn validate_lane(prefix: &str, lane: char, entries: Option<&Value>, errors: &mut Vec<String>) {
    let Some(entries) = entries.and_then(Value::as_array) else {
        errors.push(format!("{}: mapping.{} must be an array", prefix, lane));
        return;
    };

    let mut valid: Vec<CheckedRange> = Vec::new();

    for (i, entry) in entries.iter().enumerate() {
        let at = format!("{}: mapping.{}[{}]", prefix, lane, i);
        let Some(items) = entry.as_array().filter(|items| items.len() == 3) else {
            errors.push(format!("{} must be [min, max, group]", at));
            continue;
        };

        let min = number_from_json(&items[0]);
        let max = number_from_json(&items[1]);
        if min.is_none() {
            errors.push(format!("{}: min is not a number", at));
        }
        if max.is_none() {
            errors.push(format!("{}: max is not a number", at));
        }

        let mut entry_ok = min.is_some() && max.is_some();
        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                errors.push(format!(
                    "{}: min {} is greater than max {}",
                    at,
                    format_number(min),
                    format_number(max)
                ));
                entry_ok = false;
            }
        }

        let group_ok = items[2].as_str().is_some_and(|g| !g.trim().is_empty());
        if !group_ok {
            errors.push(format!("{}: group must be a non-empty string", at));
            entry_ok = false;
        }

        if let (true, Some(min), Some(max)) = (entry_ok, min, max) {
            valid.push(CheckedRange { min, max });
        }
    }

    // Overlap check is order independent, unlike lookup
    valid.sort_by(|a, b| a.min.total_cmp(&b.min));
    for pair in valid.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.min <= prev.max {
            errors.push(format!(
                "{}: mapping.{} ranges overlap: {}-{} and {}-{} (start {} <= end {})",
                prefix,
                lane,
                format_number(prev.min),
                format_number(prev.max),
                format_number(next.min),
                format_number(next.max),
                format_number(next.min),
                format_number(prev.max)
            ));
        }
    }
}

/// Validate every profile of an interchange document
pub fn validate_profile_set(document: &Value) -> Vec<String> {
    match document.as_object() {
        None => vec!["profile document must be an object keyed by profile name".to_string()],
        Some(profiles) => profiles
            .iter()
            .flat_map(|(key, profile)| validate_profile(key, profile))
            .collect(),
    }
}
