//! Scalar constraint checks run against a single field's own value: `type`,
//! `empty`, `min`/`max`, `minlength`/`maxlength`, `allowed`/`forbidden`,
//! `regex`, `contains`, and `check_with`.
//!
//! Grounded on `engine/rules/bounds.rs`'s `NumericBoundsRule` (comparison
//! logic) and `validation.rs::validate_constraints` (the
//! minLength/maxLength/pattern/minimum/maximum dispatch shape), generalized
//! from JSON scalars to the full `Value` taxonomy.

use super::EngineContext;
use crate::callables::chain_names;
use crate::error::{ErrorCode, ValidationError};
use crate::schema::RuleSet;
use crate::value::Value;

pub fn type_names(constraint: &Value) -> Vec<String> {
    match constraint {
        Value::String(s) => vec![s.clone()],
        Value::Seq(items) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}

/// Returns `true` and terminates field checking on failure (a type
/// mismatch makes every downstream rule meaningless).
pub fn check_type(value: &Value, ruleset: &RuleSet, path: &[Value], ctx: &EngineContext, errors: &mut Vec<ValidationError>) -> bool {
    let Some(constraint) = ruleset.get("type") else { return true };
    let names = type_names(constraint);
    if ctx.type_registry.matches_any(&names, value) {
        true
    } else {
        errors.push(ValidationError::new(
            path.to_vec(),
            path.to_vec(),
            ErrorCode::BAD_TYPE,
            "type",
            Some(constraint.clone()),
            value.clone(),
        ));
        false
    }
}

/// Returns `false` and reports a violation when `empty: false` is set on an
/// empty sized value; rules that are meaningless on a value already flagged
/// empty (`allowed`, `forbidden`, `minlength`/`maxlength`, `regex`,
/// `check_with`, `items`) are skipped by the caller when this returns
/// `false`.
pub fn check_empty(value: &Value, ruleset: &RuleSet, path: &[Value], errors: &mut Vec<ValidationError>) -> bool {
    if !value.is_sized() || !value.is_empty_sized() {
        return true;
    }
    let allow_empty = ruleset.get("empty").and_then(Value::as_bool).unwrap_or(true);
    if !allow_empty {
        errors.push(ValidationError::new(
            path.to_vec(),
            path.to_vec(),
            ErrorCode::EMPTY_NOT_ALLOWED,
            "empty",
            None,
            value.clone(),
        ));
    }
    allow_empty
}

pub fn check_bounds(value: &Value, ruleset: &RuleSet, path: &[Value], errors: &mut Vec<ValidationError>) {
    if let (Some(min), Some(actual)) = (ruleset.get("min"), value.as_f64()) {
        if let Some(bound) = min.as_f64() {
            if actual < bound {
                errors.push(ValidationError::new(
                    path.to_vec(),
                    path.to_vec(),
                    ErrorCode::MIN_VALUE,
                    "min",
                    Some(min.clone()),
                    value.clone(),
                ));
            }
        }
    }
    if let (Some(max), Some(actual)) = (ruleset.get("max"), value.as_f64()) {
        if let Some(bound) = max.as_f64() {
            if actual > bound {
                errors.push(ValidationError::new(
                    path.to_vec(),
                    path.to_vec(),
                    ErrorCode::MAX_VALUE,
                    "max",
                    Some(max.clone()),
                    value.clone(),
                ));
            }
        }
    }
}

pub fn check_length(value: &Value, ruleset: &RuleSet, path: &[Value], errors: &mut Vec<ValidationError>) {
    let Some(len) = value.len() else { return };
    if let Some(minlength) = ruleset.get("minlength") {
        if let Some(bound) = minlength.as_f64() {
            if (len as f64) < bound {
                errors.push(ValidationError::new(
                    path.to_vec(),
                    path.to_vec(),
                    ErrorCode::MIN_LENGTH,
                    "minlength",
                    Some(minlength.clone()),
                    value.clone(),
                ));
            }
        }
    }
    if let Some(maxlength) = ruleset.get("maxlength") {
        if let Some(bound) = maxlength.as_f64() {
            if (len as f64) > bound {
                errors.push(ValidationError::new(
                    path.to_vec(),
                    path.to_vec(),
                    ErrorCode::MAX_LENGTH,
                    "maxlength",
                    Some(maxlength.clone()),
                    value.clone(),
                ));
            }
        }
    }
}

pub fn check_allowed(value: &Value, ruleset: &RuleSet, path: &[Value], errors: &mut Vec<ValidationError>) {
    let Some(allowed) = ruleset.get("allowed") else { return };
    let Value::Seq(options) = allowed else { return };

    if matches!(value, Value::Seq(_) | Value::Set(_) | Value::FrozenSet(_) | Value::Tuple(_)) {
        let bad: Vec<Value> = value.iter_elements().filter(|v| !options.contains(v)).cloned().collect();
        if !bad.is_empty() {
            errors.push(ValidationError::new(
                path.to_vec(),
                path.to_vec(),
                ErrorCode::UNALLOWED_VALUES,
                "allowed",
                Some(allowed.clone()),
                Value::Seq(bad),
            ));
        }
    } else if !options.contains(value) {
        errors.push(ValidationError::new(
            path.to_vec(),
            path.to_vec(),
            ErrorCode::UNALLOWED_VALUE,
            "allowed",
            Some(allowed.clone()),
            value.clone(),
        ));
    }
}

pub fn check_forbidden(value: &Value, ruleset: &RuleSet, path: &[Value], errors: &mut Vec<ValidationError>) {
    let Some(forbidden) = ruleset.get("forbidden") else { return };
    let Value::Seq(options) = forbidden else { return };

    if matches!(value, Value::Seq(_) | Value::Set(_) | Value::FrozenSet(_) | Value::Tuple(_)) {
        let bad: Vec<Value> = value.iter_elements().filter(|v| options.contains(v)).cloned().collect();
        if !bad.is_empty() {
            errors.push(ValidationError::new(
                path.to_vec(),
                path.to_vec(),
                ErrorCode::FORBIDDEN_VALUES,
                "forbidden",
                Some(forbidden.clone()),
                Value::Seq(bad),
            ));
        }
    } else if options.contains(value) {
        errors.push(ValidationError::new(
            path.to_vec(),
            path.to_vec(),
            ErrorCode::FORBIDDEN_VALUE,
            "forbidden",
            Some(forbidden.clone()),
            value.clone(),
        ));
    }
}

pub fn check_regex(value: &Value, ruleset: &RuleSet, path: &[Value], errors: &mut Vec<ValidationError>) {
    let Some(pattern) = ruleset.get("regex") else { return };
    let (Value::String(pattern_str), Value::String(text)) = (pattern, value) else { return };
    match regex::Regex::new(pattern_str) {
        Ok(re) if re.is_match(text) => {}
        _ => errors.push(ValidationError::new(
            path.to_vec(),
            path.to_vec(),
            ErrorCode::REGEX_MISMATCH,
            "regex",
            Some(pattern.clone()),
            value.clone(),
        )),
    }
}

pub fn check_contains(value: &Value, ruleset: &RuleSet, path: &[Value], errors: &mut Vec<ValidationError>) {
    let Some(required) = ruleset.get("contains") else { return };
    if !value.is_sized() {
        return;
    }
    let required_members: Vec<Value> = match required {
        Value::Seq(items) => items.clone(),
        other => vec![other.clone()],
    };
    let missing: Vec<Value> = required_members
        .into_iter()
        .filter(|m| !value.iter_elements().any(|v| v == m))
        .collect();
    if !missing.is_empty() {
        errors.push(ValidationError::new(
            path.to_vec(),
            path.to_vec(),
            ErrorCode::MISSING_MEMBER,
            "contains",
            Some(Value::Seq(missing)),
            value.clone(),
        ));
    }
}

pub fn check_with(value: &Value, ruleset: &RuleSet, path: &[Value], ctx: &EngineContext, errors: &mut Vec<ValidationError>) {
    let Some(constraint) = ruleset.get("check_with") else { return };
    for name in chain_names(constraint) {
        let Some(callable) = ctx.callables.check_with(&name) else { continue };
        let mut reported: Vec<(Vec<Value>, String)> = Vec::new();
        {
            let mut report = |extra_path: Vec<Value>, message: String| reported.push((extra_path, message));
            callable(path, value, &mut report);
        }
        for (extra_path, message) in reported {
            let mut full_path = path.to_vec();
            full_path.extend(extra_path);
            errors.push(
                ValidationError::new(full_path.clone(), full_path, ErrorCode::CUSTOM, "check_with", None, value.clone())
                    .with_info(crate::error::ErrorInfo::Text(message)),
            );
        }
    }
}
