//! Dotted-path field extraction over untyped JSON.
//!
//! Provider responses are arbitrary JSON documents whose shape this crate does not
//! control. A [field path](resolve) such as `data.user.open_id` names a location
//! inside such a document. Resolution never fails: a path which does not resolve
//! yields the zero value of the requested type.
//!
//! Path syntax:
//!
//! * segments are separated by `.`
//! * a literal dot inside a key is written `\.`
//! * a segment consisting only of digits indexes into an array
//! * an empty path resolves to nothing

use serde_json::Value;

/// Resolves `path` against `value`, returning the node it names.
#[must_use]
pub fn resolve<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    segments(path).try_fold(value, |node, segment| match node {
        Value::Object(map) => map.get(segment.as_str()),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index)),
        _ => None,
    })
}

/// Reads the node at `path` as a string.
///
/// Strings are returned as-is, numbers and booleans in their JSON spelling, and
/// objects or arrays as compact JSON. `null` and missing paths give `""`.
#[must_use]
pub fn string(value: &Value, path: &str) -> String {
    resolve(value, path).map(stringify).unwrap_or_default()
}

/// Reads the node at `path` as an integer.
///
/// Floats are truncated, strings holding a number are parsed and `true` counts as
/// one. Anything else gives `0`.
#[must_use]
pub fn int(value: &Value, path: &str) -> i64 {
    resolve(value, path).map_or(0, integer)
}

/// Reads the node at `path` as a list of strings, preserving order.
///
/// Arrays give their elements and objects their values, each converted as by
/// [`string`]. A scalar gives a one-element list. `null` and missing paths give an
/// empty list.
#[must_use]
pub fn strings(value: &Value, path: &str) -> Vec<String> {
    match resolve(value, path) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().map(stringify).collect(),
        Some(Value::Object(map)) => map.values().map(stringify).collect(),
        Some(scalar) => vec![stringify(scalar)],
    }
}

/// The top-level keys of an object, for logging response shapes without values.
pub(crate) fn keys(value: &Value) -> Vec<&str> {
    value
        .as_object()
        .map(|map| map.keys().map(String::as_str).collect())
        .unwrap_or_default()
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn integer(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or_default()
        }
        Value::Bool(b) => i64::from(*b),
        Value::Null | Value::Array(_) | Value::Object(_) => 0,
    }
}

/// Splits a path on unescaped dots.
fn segments(path: &str) -> impl Iterator<Item = String> + '_ {
    let mut chars = path.chars().peekable();
    std::iter::from_fn(move || {
        chars.peek()?;
        let mut segment = String::new();
        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&'.') => {
                    segment.push('.');
                    chars.next();
                }
                '.' => return Some(segment),
                c => segment.push(c),
            }
        }
        Some(segment)
    })
}
