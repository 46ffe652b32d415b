//! Normalization step 4: `default` and `default_setter`.

use super::FieldPlan;
use crate::callables::{chain_names, CallableRegistry};
use crate::error::{ErrorCode, ValidationError};
use crate::value::Value;
use indexmap::IndexMap;

/// Fill in missing fields. Literal `default` wins immediately; a
/// `default_setter` chain is retried across multiple passes since a setter
/// may read a sibling that another setter has not yet populated. A field
/// whose setter never succeeds within that many passes is left absent and
/// reported as a normalization error rather than silently dropped.
pub fn apply_defaults(
    doc: &mut IndexMap<Value, Value>,
    fields: &[FieldPlan],
    callables: &CallableRegistry,
    path: &[Value],
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut pending: Vec<&FieldPlan> = fields
        .iter()
        .filter(|f| {
            !doc.contains_key(&f.new_name) && (f.ruleset.has("default") || f.ruleset.has("default_setter"))
        })
        .collect();

    let max_passes = pending.len().max(1);
    for _ in 0..max_passes {
        if pending.is_empty() {
            break;
        }
        let mut still_pending = Vec::new();
        for field in pending {
            if let Some(literal) = field.ruleset.get("default") {
                doc.insert(field.new_name.clone(), literal.clone());
                continue;
            }

            let Some(constraint) = field.ruleset.get("default_setter") else {
                continue;
            };
            let names = chain_names(constraint);
            let siblings = Value::Map(doc.clone());
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let mut computed = None;
                for name in &names {
                    if let Some(setter) = callables.default_setter(name) {
                        computed = Some(setter(&siblings));
                    }
                }
                computed
            }));
            match outcome {
                Ok(Some(value)) => {
                    doc.insert(field.new_name.clone(), value);
                }
                Ok(None) | Err(_) => still_pending.push(field),
            }
        }
        pending = still_pending;
    }

    for field in pending {
        let mut field_path = path.to_vec();
        field_path.push(field.new_name.clone());
        errors.push(ValidationError::new(
            field_path.clone(),
            field_path,
            ErrorCode::SETTING_DEFAULT_FAILED,
            "default_setter",
            None,
            Value::Null,
        ));
    }

    errors
}
