//! Profile entity - line-to-group mapping for one wing model
//!
//! A profile assigns every line of a lane to a named tuning group through an
//! ordered list of number ranges, and carries the length one maillon loop
//! adds or removes. Profiles are exchanged as a JSON document keyed by
//! profile key:
//!
//! ```json
//! { "generic": { "name": "Generic", "mmPerLoop": 10,
//!                "mapping": { "A": [[1, 4, "AR1"], [5, 8, "AR2"]] } } }
//! ```

use rust_embed::Embed;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::core::line_id::{LineId, LANES};
use crate::core::numeric::number_from_json;
use crate::core::plan::{effective_step, DEFAULT_MM_PER_LOOP};
use crate::entities::measurement::MeasurementRow;

#[derive(Embed)]
#[folder = "profiles/"]
struct EmbeddedProfiles;

const BUILTIN_FILE: &str = "builtin.json";

/// Errors raised when handling profiles
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile '{0}' not found")]
    NotFound(String),

    #[error("Profile key must not be empty")]
    EmptyKey,

    #[error("Failed to parse profile document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Profile document must be a JSON object keyed by profile name")]
    NotAnObject,
}

/// One `[min, max, group]` entry of a lane's mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub min: i64,
    pub max: i64,
    pub group: String,
}

impl Range {
    pub fn new(min: i64, max: i64, group: impl Into<String>) -> Self {
        Self {
            min,
            max,
            group: group.into(),
        }
    }

    pub fn contains(&self, index: u32) -> bool {
        let index = i64::from(index);
        index >= self.min && index <= self.max
    }

    /// Read a range from its JSON tuple form
    ///
    /// Fractional bounds are narrowed to the integers they enclose. Entries
    /// that are not a `[number, number, non-empty string]` tuple yield `None`
    /// and are skipped by lookups.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        let items = value.as_array()?;
        if items.len() != 3 {
            return None;
        }
        let min = number_from_json(&items[0])?.ceil();
        let max = number_from_json(&items[1])?.floor();
        let group = items[2].as_str()?.trim();
        if group.is_empty() {
            return None;
        }
        Some(Self::new(min as i64, max as i64, group))
    }
}

impl Serialize for Range {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.min, self.max, &self.group).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Range::from_json(&value)
            .ok_or_else(|| serde::de::Error::custom("expected [min, max, \"group\"]"))
    }
}

/// Lane mapping with malformed entries dropped instead of failing the profile
fn lenient_mapping<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<Range>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let Some(lanes) = raw.as_object() else {
        return Ok(BTreeMap::new());
    };
    Ok(lanes
        .iter()
        .map(|(lane, entries)| {
            let ranges = entries
                .as_array()
                .map(|items| items.iter().filter_map(Range::from_json).collect())
                .unwrap_or_default();
            (lane.trim().to_ascii_uppercase(), ranges)
        })
        .collect())
}

fn default_mm_per_loop() -> f64 {
    DEFAULT_MM_PER_LOOP
}

/// Loop step read from a number or numeric string; anything else is the default
fn lenient_mm_per_loop<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(number_from_json(&raw).unwrap_or(DEFAULT_MM_PER_LOOP))
}

/// Display name; a non-string name reads as empty and is left to the validator
fn lenient_name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw.as_str().unwrap_or_default().to_string())
}

/// Line-to-group mapping for one wing model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Display name
    #[serde(default, deserialize_with = "lenient_name")]
    pub name: String,

    /// Length change of one maillon loop in millimetres
    #[serde(
        default = "default_mm_per_loop",
        deserialize_with = "lenient_mm_per_loop"
    )]
    pub mm_per_loop: f64,

    /// Lane letter -> ranges, scanned in stored order
    #[serde(default, deserialize_with = "lenient_mapping")]
    pub mapping: BTreeMap<String, Vec<Range>>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            mm_per_loop: DEFAULT_MM_PER_LOOP,
            mapping: BTreeMap::new(),
        }
    }
}

impl Profile {
    pub fn new(name: impl Into<String>, mm_per_loop: f64) -> Self {
        Self {
            name: name.into(),
            mm_per_loop,
            mapping: BTreeMap::new(),
        }
    }

    /// Builder-style helper to append a range to a lane
    pub fn with_range(mut self, lane: char, min: i64, max: i64, group: &str) -> Self {
        self.mapping
            .entry(lane.to_ascii_uppercase().to_string())
            .or_default()
            .push(Range::new(min, max, group));
        self
    }

    /// Loop step to use in computations; falls back to 10 mm when unusable
    pub fn step(&self) -> f64 {
        effective_step(self.mm_per_loop)
    }

    /// Ranges of one lane in stored order
    pub fn lane_ranges(&self, lane: char) -> &[Range] {
        self.mapping
            .get(&lane.to_ascii_uppercase().to_string())
            .map(|r| r.as_slice())
            .unwrap_or(&[])
    }

    /// Resolve a line label to its group
    ///
    /// The first range containing the line number wins, in the order the
    /// ranges are stored. Overlapping ranges are therefore resolved by table
    /// order.
    pub fn group_for_line(&self, label: &str) -> Option<&str> {
        let id = LineId::parse(label)?;
        self.group_for_id(id)
    }

    pub fn group_for_id(&self, id: LineId) -> Option<&str> {
        self.lane_ranges(id.prefix)
            .iter()
            .find(|range| range.contains(id.index))
            .map(|range| range.group.as_str())
    }

    /// Every group named anywhere in the mapping, sorted by group order
    pub fn declared_groups(&self) -> Vec<String> {
        let names: BTreeSet<&str> = self
            .mapping
            .values()
            .flatten()
            .map(|r| r.group.as_str())
            .collect();
        sorted_groups(names.into_iter().map(str::to_string))
    }

    /// Parse a single profile from JSON
    ///
    /// Malformed ranges are dropped and an unusable loop step reads as the
    /// default; only a non-object entry yields `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Structural check of this profile, see [`crate::core::validate`]
    pub fn validate(&self, key: &str) -> Vec<String> {
        match serde_json::to_value(self) {
            Ok(value) => crate::core::validate::validate_profile(key, &value),
            Err(e) => vec![format!("profile '{}': cannot be serialized: {}", key, e)],
        }
    }
}

/// Split a conventional group name (`AR1`) into lane letter and number
fn split_group(name: &str) -> Option<(char, u32)> {
    let trimmed = name.trim();
    let mut chars = trimmed.chars();
    let lane = chars.next()?;
    if !lane.is_ascii_alphabetic() {
        return None;
    }
    let rest = chars.as_str();
    let digits = rest.strip_prefix('R').or_else(|| rest.strip_prefix('r'))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number = digits.parse::<u32>().ok()?;
    Some((lane.to_ascii_uppercase(), number))
}

/// Lane letter of a group following the `<Letter>R<number>` convention
pub fn group_lane(name: &str) -> Option<char> {
    split_group(name).map(|(lane, _)| lane)
}

/// Order groups by (lane, number); unconventional names follow, by raw text
pub fn compare_groups(a: &str, b: &str) -> Ordering {
    match (split_group(a), split_group(b)) {
        (Some(ka), Some(kb)) => ka.cmp(&kb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn sorted_groups(names: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut names: Vec<String> = names.into_iter().collect();
    names.sort_by(|a, b| compare_groups(a, b));
    names
}

/// Distinct groups the measured lines resolve to
///
/// Falls back to every group declared in the profile when no measured line
/// resolves, so an empty import still shows the profile's groups.
pub fn group_names(profile: &Profile, rows: &[MeasurementRow]) -> Vec<String> {
    let resolved: BTreeSet<String> = rows
        .iter()
        .flat_map(|row| row.blocks.iter())
        .filter_map(|block| profile.group_for_line(&block.line))
        .map(str::to_string)
        .collect();

    if resolved.is_empty() {
        profile.declared_groups()
    } else {
        sorted_groups(resolved)
    }
}

/// All known profiles keyed by profile key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProfileSet {
    profiles: BTreeMap<String, Profile>,
}

impl<'de> Deserialize<'de> for ProfileSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        ProfileSet::from_json(&value)
            .map_err(|e| serde::de::Error::custom(e.to_string()))
    }
}

impl ProfileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Profiles shipped with the tool
    pub fn builtin() -> Self {
        EmbeddedProfiles::get(BUILTIN_FILE)
            .and_then(|file| std::str::from_utf8(&file.data).ok().map(str::to_string))
            .and_then(|content| Self::parse(&content).ok())
            .filter(|set| !set.is_empty())
            .unwrap_or_else(|| {
                let mut set = Self::new();
                set.profiles.insert("default".to_string(), Profile::default());
                set
            })
    }

    /// Build a set from a JSON document, skipping entries that are not profiles
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ProfileError> {
        let object = value.as_object().ok_or(ProfileError::NotAnObject)?;
        let mut profiles = BTreeMap::new();
        for (key, entry) in object {
            if key.trim().is_empty() {
                continue;
            }
            match Profile::from_json(entry) {
                Some(profile) => {
                    profiles.insert(key.clone(), profile);
                }
                None => tracing::warn!("Skipping unreadable profile '{}'", key),
            }
        }
        Ok(Self { profiles })
    }

    /// Parse the interchange document
    pub fn parse(content: &str) -> Result<Self, ProfileError> {
        let value: serde_json::Value = serde_json::from_str(content)?;
        Self::from_json(&value)
    }

    pub fn to_json_pretty(&self) -> Result<String, ProfileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn get(&self, key: &str) -> Option<&Profile> {
        self.profiles.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.profiles.contains_key(key)
    }

    pub fn first(&self) -> Option<(&str, &Profile)> {
        self.profiles.iter().next().map(|(k, p)| (k.as_str(), p))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Profile)> {
        self.profiles.iter().map(|(k, p)| (k.as_str(), p))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Copy of this set with `key` added or replaced
    pub fn with_profile(&self, key: &str, profile: Profile) -> Result<Self, ProfileError> {
        if key.trim().is_empty() {
            return Err(ProfileError::EmptyKey);
        }
        let mut next = self.clone();
        next.profiles.insert(key.to_string(), profile);
        Ok(next)
    }

    /// Copy of this set without `key`
    pub fn without_profile(&self, key: &str) -> Result<Self, ProfileError> {
        if !self.contains(key) {
            return Err(ProfileError::NotFound(key.to_string()));
        }
        let mut next = self.clone();
        next.profiles.remove(key);
        Ok(next)
    }

    /// Copy of this set with every profile of `other` added, overriding same keys
    pub fn merged(&self, other: &ProfileSet) -> Self {
        let mut next = self.clone();
        for (key, profile) in &other.profiles {
            next.profiles.insert(key.clone(), profile.clone());
        }
        next
    }

    /// Validate every profile of the set
    pub fn validate(&self) -> Vec<String> {
        self.profiles
            .iter()
            .flat_map(|(key, profile)| profile.validate(key))
            .collect()
    }
}

/// Lanes that are absent from a profile's mapping
pub fn missing_lanes(profile: &Profile) -> Vec<char> {
    LANES
        .iter()
        .copied()
        .filter(|lane| !profile.mapping.contains_key(&lane.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::measurement::LineBlock;

    fn sample_profile() -> Profile {
        Profile::new("Sample", 10.0)
            .with_range('A', 1, 4, "AR1")
            .with_range('A', 5, 8, "AR2")
            .with_range('B', 1, 8, "BR1")
    }

    fn row_with_lines(labels: &[&str]) -> MeasurementRow {
        let mut row = MeasurementRow::default();
        for (i, label) in labels.iter().enumerate() {
            row.blocks[i] = LineBlock::new(*label, Some(1000.0), Some(1000.0), Some(1000.0));
        }
        row
    }

    #[test]
    fn test_group_for_line_resolves_range() {
        let profile = sample_profile();
        assert_eq!(profile.group_for_line("A1"), Some("AR1"));
        assert_eq!(profile.group_for_line("a04"), Some("AR1"));
        assert_eq!(profile.group_for_line("A5"), Some("AR2"));
        assert_eq!(profile.group_for_line("B8"), Some("BR1"));
    }

    #[test]
    fn test_group_for_line_unmapped() {
        let profile = sample_profile();
        assert_eq!(profile.group_for_line("A9"), None);
        assert_eq!(profile.group_for_line("C1"), None);
        assert_eq!(profile.group_for_line("brake"), None);
        assert_eq!(profile.group_for_line(""), None);
    }

    #[test]
    fn test_group_for_line_first_match_wins_in_stored_order() {
        let profile = Profile::new("Overlap", 10.0)
            .with_range('A', 5, 10, "AR2")
            .with_range('A', 1, 6, "AR1");
        assert_eq!(profile.group_for_line("A5"), Some("AR2"));
        assert_eq!(profile.group_for_line("A6"), Some("AR2"));
        assert_eq!(profile.group_for_line("A4"), Some("AR1"));
        // Deterministic across calls
        assert_eq!(profile.group_for_line("A6"), profile.group_for_line("A6"));
    }

    #[test]
    fn test_step_falls_back_to_default() {
        assert_eq!(Profile::new("x", 5.0).step(), 5.0);
        assert_eq!(Profile::new("x", f64::NAN).step(), 10.0);
        assert_eq!(Profile::new("x", 0.0).step(), 10.0);
    }

    #[test]
    fn test_from_json_tolerates_unusable_fields() {
        let profile = Profile::from_json(&serde_json::json!({
            "name": 7,
            "mmPerLoop": "7,5",
            "mapping": [1, 2]
        }))
        .unwrap();
        assert_eq!(profile.name, "");
        assert_eq!(profile.mm_per_loop, 7.5);
        assert!(profile.mapping.is_empty());

        let profile = Profile::from_json(&serde_json::json!({ "mmPerLoop": null })).unwrap();
        assert_eq!(profile.mm_per_loop, 10.0);
        assert!(Profile::from_json(&serde_json::json!("nope")).is_none());
    }

    #[test]
    fn test_group_lane() {
        assert_eq!(group_lane("AR1"), Some('A'));
        assert_eq!(group_lane("cr12"), Some('C'));
        assert_eq!(group_lane("Stab"), None);
        assert_eq!(group_lane("AX1"), None);
        assert_eq!(group_lane("AR"), None);
    }

    #[test]
    fn test_compare_groups_orders_by_lane_then_number() {
        let mut names = vec!["BR1", "Stab", "AR10", "AR2", "Brake", "AR1"];
        names.sort_by(|a, b| compare_groups(a, b));
        assert_eq!(names, vec!["AR1", "AR2", "AR10", "BR1", "Brake", "Stab"]);
    }

    #[test]
    fn test_group_names_from_rows() {
        let profile = sample_profile();
        let rows = vec![row_with_lines(&["A6", "B2"]), row_with_lines(&["A1", "Z9"])];
        assert_eq!(group_names(&profile, &rows), vec!["AR1", "AR2", "BR1"]);
    }

    #[test]
    fn test_group_names_falls_back_to_declared() {
        let profile = sample_profile();
        let rows = vec![row_with_lines(&["Z1"])];
        assert_eq!(group_names(&profile, &rows), vec!["AR1", "AR2", "BR1"]);
        assert_eq!(group_names(&profile, &[]), vec!["AR1", "AR2", "BR1"]);
    }

    #[test]
    fn test_profile_json_roundtrip_uses_tuples() {
        let profile = sample_profile();
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["mmPerLoop"], serde_json::json!(10.0));
        assert_eq!(json["mapping"]["A"][0], serde_json::json!([1, 4, "AR1"]));

        let parsed: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, profile);
    }

    #[test]
    fn test_malformed_ranges_are_skipped() {
        let json = serde_json::json!({
            "name": "Messy",
            "mmPerLoop": 8,
            "mapping": {
                "a": [[1, 4, "AR1"], [5, "x", "AR2"], "garbage", [6, 9]],
                "B": "not an array"
            }
        });
        let profile = Profile::from_json(&json).unwrap();
        assert_eq!(profile.lane_ranges('A'), &[Range::new(1, 4, "AR1")]);
        assert!(profile.lane_ranges('B').is_empty());
        assert_eq!(profile.group_for_line("A2"), Some("AR1"));
        assert_eq!(profile.group_for_line("A6"), None);
    }

    #[test]
    fn test_fractional_bounds_are_narrowed() {
        let range = Range::from_json(&serde_json::json!([1.5, "4,7", "AR1"])).unwrap();
        assert_eq!(range, Range::new(2, 4, "AR1"));
    }

    #[test]
    fn test_missing_mm_per_loop_defaults() {
        let profile: Profile = serde_json::from_str(r#"{"name":"x"}"#).unwrap();
        assert_eq!(profile.mm_per_loop, 10.0);
        assert!(profile.mapping.is_empty());
    }

    #[test]
    fn test_builtin_profiles_are_valid() {
        let set = ProfileSet::builtin();
        assert!(!set.is_empty());
        assert!(set.validate().is_empty(), "{:?}", set.validate());
    }

    #[test]
    fn test_profile_set_skips_unreadable_entries() {
        let set = ProfileSet::parse(r#"{"good":{"name":"G"},"bad":42,"":{"name":"E"}}"#).unwrap();
        assert_eq!(set.len(), 1);
        assert!(set.contains("good"));
    }

    #[test]
    fn test_profile_set_rejects_non_object() {
        assert!(matches!(ProfileSet::parse("[1,2]"), Err(ProfileError::NotAnObject)));
        assert!(matches!(ProfileSet::parse("{"), Err(ProfileError::Parse(_))));
    }

    #[test]
    fn test_profile_set_with_and_without() {
        let set = ProfileSet::new()
            .with_profile("one", sample_profile())
            .unwrap();
        assert!(set.with_profile("  ", Profile::default()).is_err());
        let removed = set.without_profile("one").unwrap();
        assert!(removed.is_empty());
        assert!(matches!(
            removed.without_profile("one"),
            Err(ProfileError::NotFound(_))
        ));
        // Original untouched
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_missing_lanes() {
        assert_eq!(missing_lanes(&sample_profile()), vec!['C', 'D']);
    }
}
