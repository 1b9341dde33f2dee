// src/config/merge.rs

//! Overlay per-design parameter overrides onto the template parameters.
//!
//! The experiment table hands each job a (possibly nested) mapping of values
//! sampled for that design point; those overlay the `[parameters]` template
//! key by key. Nested mappings merge recursively; any other value type
//! replaces the template value outright.

use serde_json::{Map, Value};

/// Merge `overrides` onto `template`, returning the merged mapping.
///
/// Neither input is modified. Keys present only in `template` are kept; keys
/// present in `overrides` win, except that two object values merge
/// recursively.
pub fn merge(template: &Map<String, Value>, overrides: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = template.clone();

    for (key, value) in overrides {
        match (merged.get_mut(key), value) {
            (Some(Value::Object(base)), Value::Object(patch)) => {
                *base = merge(base, patch);
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }

    merged
}
