//! Normalization step 5: `coerce`.

use crate::callables::{chain_names, CallableRegistry};
use crate::error::{ErrorCode, ValidationError};
use crate::schema::RuleSet;
use crate::value::Value;

/// Apply a field's `coerce` chain to its own value. An explicit `Null` on a
/// `nullable` field is left alone rather than handed to the chain — a
/// coercer written for the field's real type has no reason to expect `Null`
/// and the nullable check already accepts it as-is. A panicking coercer
/// degrades to the identity transform and is reported, not propagated,
/// since coercion failures are a normalization concern, not a crash.
pub fn apply_single(
    value: Value,
    ruleset: &RuleSet,
    callables: &CallableRegistry,
    path: &[Value],
    errors: &mut Vec<ValidationError>,
) -> Value {
    let Some(constraint) = ruleset.get("coerce") else {
        return value;
    };
    let nullable = ruleset.get("nullable").and_then(Value::as_bool).unwrap_or(false);
    if matches!(value, Value::Null) && nullable {
        return value;
    }

    let names = chain_names(constraint);
    let value_for_closure = value.clone();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let mut current = value_for_closure.clone();
        for name in &names {
            if let Some(coercer) = callables.coercer(name) {
                current = coercer(&current);
            }
        }
        current
    }));

    match outcome {
        Ok(coerced) => coerced,
        Err(_) => {
            errors.push(ValidationError::new(
                path.to_vec(),
                path.to_vec(),
                ErrorCode::COERCION_FAILED,
                "coerce",
                None,
                value.clone(),
            ));
            value
        }
    }
}
