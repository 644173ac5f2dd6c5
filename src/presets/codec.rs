//! Persisted preset encoding.
//!
//! Custom presets are stored as a JSON array of
//! `{name, label, durations: {inhale, hold1, exhale, hold2}, repeatMinutes}`.
//! Decoding is lenient per entry: a malformed entry is dropped and the rest
//! still load. A value that is not an array at all decodes as empty.

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::Preset;
use crate::types::{checked_seconds, DurationSet};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredPreset<'a> {
    name: &'a str,
    label: &'a str,
    durations: &'a DurationSet,
    repeat_minutes: u32,
}

/// Encodes custom presets for storage.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_custom_presets(presets: &[Preset]) -> Result<String, serde_json::Error> {
    let stored: Vec<StoredPreset<'_>> = presets
        .iter()
        .map(|p| StoredPreset {
            name: &p.name,
            label: &p.label,
            durations: &p.durations,
            repeat_minutes: p.repeat_minutes,
        })
        .collect();
    serde_json::to_string(&stored)
}

/// Decodes stored custom presets, dropping malformed entries.
pub fn decode_custom_presets(raw: &str) -> Vec<Preset> {
    let Some(items) = parse_array(raw, "custom presets") else {
        return Vec::new();
    };

    let total = items.len();
    let presets: Vec<Preset> = items.iter().filter_map(sanitize_custom_preset).collect();
    if presets.len() < total {
        warn!("Dropped {} malformed custom preset(s)", total - presets.len());
    }
    presets
}

/// Validates one stored entry.
///
/// Requires an object with a string `name` and a `durations` object; every
/// duration and `repeatMinutes` must be a finite number (or numeric string).
/// Values are rounded and clamped at zero.
pub fn sanitize_custom_preset(value: &Value) -> Option<Preset> {
    let record = value.as_object()?;
    let name = record.get("name")?.as_str()?;
    let durations = record.get("durations")?.as_object()?;

    let field = |key: &str| durations.get(key).and_then(numeric);
    let durations = DurationSet::new(
        field("inhale")?,
        field("hold1")?,
        field("exhale")?,
        field("hold2")?,
    );
    let repeat_minutes = record.get("repeatMinutes").and_then(numeric)?;

    let label = record
        .get("label")
        .and_then(Value::as_str)
        .unwrap_or(name)
        .to_string();

    Some(Preset {
        name: name.to_string(),
        label,
        durations,
        repeat_minutes,
        is_custom: true,
    })
}

fn numeric(value: &Value) -> Option<u32> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    checked_seconds(n)
}

/// Encodes a name list (favorites or hidden built-ins).
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn encode_names<'a>(names: impl IntoIterator<Item = &'a String>) -> Result<String, serde_json::Error> {
    serde_json::to_string(&names.into_iter().collect::<Vec<_>>())
}

/// Decodes a name list, dropping non-string items.
pub fn decode_names(raw: &str) -> Vec<String> {
    parse_array(raw, "name list")
        .map(|items| {
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_array(raw: &str, what: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => Some(items),
        Ok(_) => {
            warn!("Stored {} is not an array; ignoring", what);
            None
        }
        Err(e) => {
            warn!("Stored {} is not valid JSON: {}", what, e);
            None
        }
    }
}
