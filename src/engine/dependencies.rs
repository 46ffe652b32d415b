//! Cross-field `dependencies` and `excludes`, including dot-notation and
//! `^`/`^^` root-relative addressing.
//!
//! An address with no leading caret is a sibling lookup in the current
//! mapping. A single leading `^` resets the lookup to the document root: the
//! (possibly dotted) remainder is resolved from there, regardless of how
//! deeply the declaring field is nested. `^^` is not "ascend two levels" —
//! it is an escape for a field whose name literally starts with a caret, so
//! `^^foo` looks up a sibling field named `^foo` with an ordinary,
//! non-root-relative lookup.

use crate::schema::RuleSet;
use crate::value::Value;
use indexmap::IndexMap;

fn step_into<'a>(value: &'a Value, key: &Value) -> Option<&'a Value> {
    match value {
        Value::Map(m) => m.get(key),
        Value::Seq(items) | Value::Tuple(items) => {
            let idx = match key {
                Value::Int(i) => usize::try_from(*i).ok()?,
                Value::String(s) => s.parse::<usize>().ok()?,
                _ => return None,
            };
            items.get(idx)
        }
        _ => None,
    }
}

/// Resolve a root-relative address (the part of a dependency name after a
/// single leading `^`) against the whole document `root`.
fn resolve_root_path(rest: &str, root: &Value) -> Option<Value> {
    if rest.is_empty() {
        return Some(root.clone());
    }
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    let mut current = root;
    for segment in rest.split('.') {
        current = step_into(current, &Value::str(segment))?;
    }
    Some(current.clone())
}

fn resolve_name(name: &str, doc: &IndexMap<Value, Value>, root: &Value) -> Option<Value> {
    if let Some(rest) = name.strip_prefix("^^") {
        // Escaped literal caret: look up the sibling field actually named
        // `^<rest>`, not root-relatively.
        let literal = format!("^{rest}");
        doc.get(&Value::str(literal.as_str())).cloned()
    } else if let Some(rest) = name.strip_prefix('^') {
        resolve_root_path(rest, root)
    } else {
        doc.get(&Value::str(name)).cloned()
    }
}

/// `true` if the field's `dependencies` rule is satisfied (or absent).
pub fn dependencies_satisfied(ruleset: &RuleSet, doc: &IndexMap<Value, Value>, root: &Value) -> bool {
    let Some(dependencies) = ruleset.get("dependencies") else { return true };
    match dependencies {
        Value::String(name) => resolve_name(name, doc, root).is_some(),
        Value::Seq(names) => names.iter().all(|n| n.as_str().is_some_and(|name| resolve_name(name, doc, root).is_some())),
        Value::Map(expected) => expected.iter().all(|(key, expected_value)| {
            let Some(name) = key.as_str() else { return false };
            match resolve_name(name, doc, root) {
                None => false,
                Some(actual) => match expected_value {
                    Value::Seq(options) => options.contains(&actual),
                    other => *other == actual,
                },
            }
        }),
        _ => true,
    }
}

/// `Some(names)` of the excluded sibling fields that are present alongside
/// this one, if any.
pub fn excludes_conflict(ruleset: &RuleSet, doc: &IndexMap<Value, Value>) -> Option<Vec<Value>> {
    let excludes = ruleset.get("excludes")?;
    let names: Vec<String> = match excludes {
        Value::String(s) => vec![s.clone()],
        Value::Seq(items) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => return None,
    };
    let present: Vec<Value> = names
        .into_iter()
        .filter(|n| doc.contains_key(&Value::str(n.as_str())))
        .map(Value::String)
        .collect();
    if present.is_empty() {
        None
    } else {
        Some(present)
    }
}
