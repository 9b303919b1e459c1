//! Path resolution over raw metadata trees
//!
//! A metadata tree is whatever the upstream extraction pipeline produced for
//! one file: nested JSON objects keyed by group (`exif`, `gps`, `filesystem`,
//! ...) with key spellings that differ by backend and capture device. All
//! lookups in this crate go through [`resolve_value`] with an ordered list of
//! candidate paths, so priority between sources is decided in one place.
//!
//! ## Example
//!
//! ```rust
//! use soma_findings::tree::resolve_value;
//! use serde_json::json;
//!
//! let tree = json!({ "exif": { "Make": "Apple" } });
//! let make = resolve_value(&tree, &[&["exif", "Make"], &["tiff", "Make"]]);
//! assert_eq!(make, Some(&json!("Apple")));
//! ```

use serde_json::Value;

/// Raw extraction result for one file (read-only inside the engine)
pub type MetadataTree = Value;

/// One possible key chain leading to a semantic value
pub type CandidatePath<'a> = &'a [&'a str];

/// Return the first present, non-empty value among `paths`, tried in order
///
/// Missing keys, `null` intermediates and empty strings make a path fail and
/// the next one is tried. Absence is not an error, so this returns `None`
/// rather than a `Result`.
pub fn resolve_value<'t>(tree: &'t Value, paths: &[CandidatePath<'_>]) -> Option<&'t Value> {
    resolve_value_indexed(tree, paths).map(|(_, value)| value)
}

/// Like [`resolve_value`] but also reports which candidate path matched
pub fn resolve_value_indexed<'t>(
    tree: &'t Value,
    paths: &[CandidatePath<'_>],
) -> Option<(usize, &'t Value)> {
    debug_assert!(!paths.is_empty(), "candidate path list must not be empty");
    paths
        .iter()
        .enumerate()
        .find_map(|(index, path)| walk(tree, path).map(|value| (index, value)))
}

/// Resolve a value and render it as text (strings, numbers and booleans only)
pub fn resolve_str(tree: &Value, paths: &[CandidatePath<'_>]) -> Option<String> {
    resolve_value(tree, paths).and_then(value_as_string)
}

/// Number of keys in the object at `path`, zero when absent or not an object
pub fn count_keys(tree: &Value, path: CandidatePath<'_>) -> usize {
    walk(tree, path)
        .and_then(|v| v.as_object())
        .map(|obj| obj.len())
        .unwrap_or(0)
}

/// Number of top-level keys carrying a group prefix such as `EXIF:`
///
/// Flat exiftool-style trees put every tag at the root as `Group:Tag`.
pub fn count_prefixed_keys(tree: &Value, prefix: &str) -> usize {
    tree.as_object()
        .map(|obj| {
            obj.iter()
                .filter(|(key, value)| key.starts_with(prefix) && !value.is_null())
                .count()
        })
        .unwrap_or(0)
}

fn walk<'t>(tree: &'t Value, path: CandidatePath<'_>) -> Option<&'t Value> {
    let mut current = tree;
    for key in path {
        current = match current {
            Value::Object(map) => map.get(*key)?,
            Value::Array(items) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
        if current.is_null() {
            return None;
        }
    }

    match current {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        _ => Some(current),
    }
}

// ============================================================================
// Value coercion helpers
// ============================================================================

/// Scalar value as display text
pub fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric value, accepting numeric strings as some backends emit them
pub fn value_as_f64(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|v| v.is_finite())
}

/// Loose truthiness for flags written by heterogeneous backends
///
/// `"false"`, `"no"`, `"0"`, zero and empty containers are false; any other
/// present value (including an opaque thumbnail blob) is true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(s) => !matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "" | "false" | "no" | "0" | "none" | "null"
        ),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
