//! Override ("surcharge") files.
//!
//! # Responsibilities
//! - Recognise `<stem>-surcharge.<ext>` files and name the base they target
//! - Parse their content into [`OverrideSpec`]s
//! - Patch the base sequence in place of the first element that structurally
//!   contains the spec's `replace` predicate
//!
//! # Design Decisions
//! - Specs apply sequentially: spec N+1 sees the output of spec N
//! - Only ordered sequences can be patched; any other base shape is returned
//!   untouched
//! - One replacement per spec; later matching elements are left alone

use serde::Deserialize;
use serde_json::{Map, Value};

const OVERRIDE_MARKER: &str = "-surcharge.";

/// A single `replace` / `with` patch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OverrideSpec {
    /// Predicate: every key present here must be present and equal in the
    /// element being replaced.
    pub replace: Value,

    /// Fields shallow-merged onto the matched element.
    pub with: Map<String, Value>,
}

impl OverrideSpec {
    /// Parse override file content: a sequence of specs, or one spec.
    ///
    /// Malformed entries are dropped with a debug log.
    pub fn parse_all(content: &Value) -> Vec<OverrideSpec> {
        let entries: Vec<&Value> = match content {
            Value::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<OverrideSpec>(entry.clone()) {
                Ok(spec) if !spec.replace.is_null() => Some(spec),
                Ok(_) => {
                    tracing::debug!("Override spec has a null `replace`, skipping");
                    None
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Malformed override spec, skipping");
                    None
                }
            })
            .collect()
    }
}

/// True if `file_name` follows the override naming convention.
pub fn is_override(file_name: &str) -> bool {
    file_name.contains(OVERRIDE_MARKER)
}

/// Name of the base config an override file targets.
///
/// `mqtt-surcharge.yaml` → `mqtt.yaml`. The stem is split at the first
/// marker occurrence; `None` when the stem or the extension is empty.
pub fn target_name(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.split_once(OVERRIDE_MARKER)?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(format!("{}.{}", stem, ext))
}

/// Apply `specs` to `base`, in order.
pub fn merge(base: &Value, specs: &[OverrideSpec]) -> Value {
    let Value::Array(items) = base else {
        if !specs.is_empty() {
            tracing::debug!("Override target is not a sequence, leaving it unchanged");
        }
        return base.clone();
    };

    let mut result = items.clone();
    for spec in specs {
        match result.iter().position(|item| contains(item, &spec.replace)) {
            Some(index) => {
                let patched = match &result[index] {
                    Value::Object(fields) => {
                        let mut fields = fields.clone();
                        fields.extend(spec.with.iter().map(|(k, v)| (k.clone(), v.clone())));
                        fields
                    }
                    _ => spec.with.clone(),
                };
                result[index] = Value::Object(patched);
            }
            None => {
                tracing::debug!(replace = %spec.replace, "Override predicate matched nothing");
            }
        }
    }

    Value::Array(result)
}

/// Structural containment: every key of `pattern` exists in `candidate` with
/// a contained value. Extra keys in `candidate` are ignored.
pub fn contains(candidate: &Value, pattern: &Value) -> bool {
    match (candidate, pattern) {
        (Value::Object(have), Value::Object(want)) => want
            .iter()
            .all(|(key, expected)| have.get(key).is_some_and(|actual| contains(actual, expected))),
        _ => candidate == pattern,
    }
}
