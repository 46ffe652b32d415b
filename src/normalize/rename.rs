//! Normalization step 1: `rename` and `rename_handler`.

use super::FieldPlan;
use crate::callables::{chain_names, CallableRegistry};
use crate::error::{ErrorCode, ValidationError};
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// Rewrite document keys per each field's own `rename` rule, then route any
/// key with no matching schema field through the nested `rename_handler`
/// chain declared on `allow_unknown` (when it names one). Collisions between
/// two inputs resolving to the same output key are reported and the later
/// one is dropped rather than silently overwriting the first.
pub fn apply_rename(
    doc: IndexMap<Value, Value>,
    fields: &[FieldPlan],
    allow_unknown: &Option<Value>,
    callables: &CallableRegistry,
    path: &[Value],
) -> (IndexMap<Value, Value>, Vec<ValidationError>) {
    let mut old_to_new: HashMap<Value, Value> = HashMap::new();
    for field in fields {
        old_to_new.insert(field.original_name.clone(), field.new_name.clone());
    }

    let handler_names = match allow_unknown {
        Some(Value::Map(ruleset)) => ruleset
            .get(&Value::str("rename_handler"))
            .map(chain_names)
            .unwrap_or_default(),
        _ => Vec::new(),
    };

    let mut renamed = IndexMap::new();
    let mut errors = Vec::new();

    for (key, value) in doc {
        let new_key = if let Some(mapped) = old_to_new.get(&key) {
            mapped.clone()
        } else if !handler_names.is_empty() {
            let key_for_closure = key.clone();
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                let mut current = key_for_closure.clone();
                for name in &handler_names {
                    if let Some(handler) = callables.rename_handler(name) {
                        current = handler(&current);
                    }
                }
                current
            }));
            match outcome {
                Ok(renamed_key) => renamed_key,
                Err(_) => {
                    let mut field_path = path.to_vec();
                    field_path.push(key.clone());
                    errors.push(ValidationError::new(
                        field_path.clone(),
                        field_path,
                        ErrorCode::RENAMING_FAILED,
                        "rename_handler",
                        None,
                        key.clone(),
                    ));
                    key.clone()
                }
            }
        } else {
            key.clone()
        };

        if renamed.contains_key(&new_key) {
            let mut field_path = path.to_vec();
            field_path.push(new_key.clone());
            errors.push(ValidationError::new(
                field_path.clone(),
                field_path,
                ErrorCode::RENAME_COLLISION,
                "rename",
                None,
                new_key,
            ));
            continue;
        }
        renamed.insert(new_key, value);
    }

    (renamed, errors)
}
