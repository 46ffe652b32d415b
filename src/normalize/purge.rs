//! Normalization steps 2 and 3: `purge_readonly` and `purge_unknown`.

use super::FieldPlan;
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Drop any present field whose rule-set marks it `readonly: true`. Runs
/// after renaming so it keys off each field's post-rename name.
pub fn purge_readonly(doc: &mut IndexMap<Value, Value>, fields: &[FieldPlan]) {
    for field in fields {
        if field.ruleset.get("readonly").and_then(Value::as_bool).unwrap_or(false) {
            doc.shift_remove(&field.new_name);
        }
    }
}

/// Drop keys with no corresponding schema field, when `purge` applies
/// (either the validator-wide flag, or an `allow_unknown` rule-set at this
/// nesting that itself sets `purge_unknown`).
pub fn purge_unknown(doc: &mut IndexMap<Value, Value>, fields: &[FieldPlan], purge: bool) {
    if !purge {
        return;
    }
    let known: HashSet<Value> = fields.iter().map(|f| f.new_name.clone()).collect();
    doc.retain(|key, _| known.contains(key));
}
