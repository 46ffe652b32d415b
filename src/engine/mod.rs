//! The validation engine (component G): the recursive interpreter that
//! walks a document in lock-step with a schema.
//!
//! Grounded on `validation.rs::Validator::validate_against_schema` — the
//! same "walk the mapping, recurse into nested properties/items, collect
//! constraint violations" shape — generalized from a closed
//! JSON-Schema-flavored rule list to the full rule taxonomy, and made
//! synchronous (the source `Rule` trait is `async`; this domain performs
//! no I/O while validating, so there is nothing for `async` to usefully
//! suspend on).

mod combinators;
mod dependencies;
mod rules;

use crate::callables::CallableRegistry;
use crate::error::{ErrorCode, ValidationError};
use crate::registry::{resolve_ruleset_ref, resolve_schema_value, RuleSetRegistry, SchemaRegistry};
use crate::schema::{RuleSet, Schema};
use crate::types::TypeRegistry;
use crate::value::Value;
use indexmap::IndexMap;

/// Read-only configuration and collaborators shared by every recursive call
/// within one `validate` invocation.
pub struct EngineContext<'a> {
    pub type_registry: &'a TypeRegistry,
    pub callables: &'a CallableRegistry,
    pub rules_set_registry: &'a RuleSetRegistry,
    pub schema_registry: &'a SchemaRegistry,
    pub allow_unknown: bool,
    pub require_all: bool,
    pub ignore_none_values: bool,
    /// Suppresses `required` errors for fields missing from the document,
    /// for partial (PATCH-style) updates against a schema written for a
    /// full document.
    pub update: bool,
}

/// Entry point. `document` must already be known to be a mapping; a
/// non-mapping top-level document is a `DocumentError`, raised by the
/// caller before the engine is ever invoked.
pub fn validate_document(document: &Value, schema: &Schema, ctx: &EngineContext) -> Vec<ValidationError> {
    let Value::Map(doc) = document else { return Vec::new() };
    validate_mapping(doc, schema, None, None, document, &[], ctx)
}

fn resolved_field_ruleset(raw: &Value, ctx: &EngineContext) -> Option<RuleSet> {
    let mut ruleset = resolve_ruleset_ref(raw, ctx.rules_set_registry).ok()?;
    ruleset.normalize_aliases();
    ruleset.expand_typesavers();
    Some(ruleset)
}

/// Validate one mapping level against its schema. `allow_unknown_override`
/// and `require_all_override` come from the containing field's own
/// rule-set when this is a nested call (`schema` rule); both are `None` at
/// the document root, where the validator-wide defaults in `ctx` apply.
fn validate_mapping(
    doc: &IndexMap<Value, Value>,
    schema: &Schema,
    allow_unknown_override: Option<Value>,
    require_all_override: Option<bool>,
    root: &Value,
    path: &[Value],
    ctx: &EngineContext,
) -> Vec<ValidationError> {
    let fields: Vec<(Value, RuleSet)> = schema
        .fields()
        .filter_map(|(name, raw)| resolved_field_ruleset(raw, ctx).map(|rs| (name.clone(), rs)))
        .collect();

    let mut errors = Vec::new();
    let require_all = require_all_override.unwrap_or(ctx.require_all);

    for (name, ruleset) in &fields {
        if doc.contains_key(name) {
            continue;
        }
        let required = ruleset.get("required").and_then(Value::as_bool).unwrap_or(require_all);
        if required && !ctx.update {
            let mut field_path = path.to_vec();
            field_path.push(name.clone());
            errors.push(ValidationError::new(
                field_path.clone(),
                field_path,
                ErrorCode::REQUIRED_FIELD,
                "required",
                None,
                Value::Null,
            ));
        }
    }

    for (key, value) in doc.iter() {
        if fields.iter().any(|(name, _)| name == key) {
            continue;
        }
        match &allow_unknown_override {
            Some(Value::Map(unknown_ruleset)) => {
                if let Ok(rs) = RuleSet::from_value(&Value::Map(unknown_ruleset.clone())) {
                    let mut field_path = path.to_vec();
                    field_path.push(key.clone());
                    errors.extend(validate_field_value(value, &rs, &field_path, root, ctx));
                }
            }
            Some(Value::Bool(true)) => {}
            Some(Value::Bool(false)) => push_unknown_field_error(&mut errors, key, value, path),
            None if ctx.allow_unknown => {}
            None => push_unknown_field_error(&mut errors, key, value, path),
            _ => {}
        }
    }

    for (name, ruleset) in &fields {
        let Some(value) = doc.get(name) else { continue };
        let mut field_path = path.to_vec();
        field_path.push(name.clone());

        if ruleset.get("readonly").and_then(Value::as_bool).unwrap_or(false) {
            errors.push(ValidationError::new(
                field_path.clone(),
                field_path.clone(),
                ErrorCode::READONLY_FIELD,
                "readonly",
                None,
                value.clone(),
            ));
            continue;
        }

        if !dependencies::dependencies_satisfied(ruleset, doc, root) {
            errors.push(ValidationError::new(
                field_path.clone(),
                field_path.clone(),
                ErrorCode::DEPENDENCIES_FIELD,
                "dependencies",
                ruleset.get("dependencies").cloned(),
                value.clone(),
            ));
            continue;
        }

        if let Some(conflicting) = dependencies::excludes_conflict(ruleset, doc) {
            errors.push(ValidationError::new(
                field_path.clone(),
                field_path.clone(),
                ErrorCode::EXCLUDES_FIELD,
                "excludes",
                ruleset.get("excludes").cloned(),
                Value::Seq(conflicting),
            ));
        }

        if ctx.ignore_none_values && matches!(value, Value::Null) {
            continue;
        }

        errors.extend(validate_field_value(value, ruleset, &field_path, root, ctx));
    }

    errors
}

fn push_unknown_field_error(errors: &mut Vec<ValidationError>, key: &Value, value: &Value, path: &[Value]) {
    let mut field_path = path.to_vec();
    field_path.push(key.clone());
    errors.push(ValidationError::new(
        field_path.clone(),
        field_path,
        ErrorCode::UNKNOWN_FIELD,
        "allow_unknown",
        None,
        value.clone(),
    ));
}

/// Validate a single value against a single rule-set: `nullable` and `type`
/// first (either can terminate further checking for this field), then the
/// scalar rules, `check_with`, the combinators, and finally recursion into
/// `schema`/`items`/`keysrules`/`valuesrules`.
pub(crate) fn validate_field_value(
    value: &Value,
    ruleset: &RuleSet,
    path: &[Value],
    root: &Value,
    ctx: &EngineContext,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if matches!(value, Value::Null) {
        let nullable = ruleset.get("nullable").and_then(Value::as_bool).unwrap_or(false);
        if !nullable {
            errors.push(ValidationError::new(
                path.to_vec(),
                path.to_vec(),
                ErrorCode::NOT_NULLABLE,
                "nullable",
                None,
                Value::Null,
            ));
        }
        return errors;
    }

    if !rules::check_type(value, ruleset, path, ctx, &mut errors) {
        return errors;
    }

    let not_empty = rules::check_empty(value, ruleset, path, &mut errors);
    rules::check_bounds(value, ruleset, path, &mut errors);
    rules::check_contains(value, ruleset, path, &mut errors);
    if not_empty {
        rules::check_length(value, ruleset, path, &mut errors);
        rules::check_allowed(value, ruleset, path, &mut errors);
        rules::check_forbidden(value, ruleset, path, &mut errors);
        rules::check_regex(value, ruleset, path, &mut errors);
        rules::check_with(value, ruleset, path, ctx, &mut errors);
    }

    for combinator in ["allof", "anyof", "oneof", "noneof"] {
        if let Some(Value::Seq(alternatives)) = ruleset.get(combinator) {
            errors.extend(combinators::evaluate(combinator, alternatives, value, path, root, ctx));
        }
    }

    errors.extend(validate_nested(value, ruleset, path, root, ctx, not_empty));
    errors
}

fn validate_nested(
    value: &Value,
    ruleset: &RuleSet,
    path: &[Value],
    root: &Value,
    ctx: &EngineContext,
    not_empty: bool,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if let Some(raw) = ruleset.get("schema") {
        match value {
            Value::Map(m) => {
                if let Ok(resolved) = resolve_schema_value(raw, ctx.schema_registry) {
                    if let Ok(nested_schema) = Schema::from_value(resolved) {
                        let allow_unknown = ruleset.get("allow_unknown").cloned();
                        let require_all = ruleset.get("require_all").and_then(Value::as_bool);
                        let child_errors =
                            validate_mapping(m, &nested_schema, allow_unknown, require_all, root, path, ctx);
                        if !child_errors.is_empty() {
                            errors.push(ValidationError::group(
                                path.to_vec(),
                                path.to_vec(),
                                ErrorCode::MAPPING_SCHEMA,
                                "schema",
                                child_errors,
                            ));
                        }
                    }
                }
            }
            Value::Seq(items) => {
                if let Ok(item_ruleset) = RuleSet::from_value(raw) {
                    let child_errors: Vec<ValidationError> = items
                        .iter()
                        .enumerate()
                        .flat_map(|(i, item)| {
                            let mut item_path = path.to_vec();
                            item_path.push(Value::Int(i as i64));
                            validate_field_value(item, &item_ruleset, &item_path, root, ctx)
                        })
                        .collect();
                    if !child_errors.is_empty() {
                        errors.push(ValidationError::group(
                            path.to_vec(),
                            path.to_vec(),
                            ErrorCode::SEQUENCE_SCHEMA,
                            "schema",
                            child_errors,
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    if let (true, Some(Value::Seq(item_rulesets)), Value::Seq(items)) = (not_empty, ruleset.get("items"), value) {
        if items.len() != item_rulesets.len() {
            errors.push(ValidationError::new(
                path.to_vec(),
                path.to_vec(),
                ErrorCode::BAD_ITEMS,
                "items",
                Some(Value::Int(item_rulesets.len() as i64)),
                value.clone(),
            ));
        } else {
            let child_errors: Vec<ValidationError> = items
                .iter()
                .zip(item_rulesets.iter())
                .enumerate()
                .flat_map(|(i, (item, rs_value))| {
                    let rs = RuleSet::from_value(rs_value).ok();
                    let mut item_path = path.to_vec();
                    item_path.push(Value::Int(i as i64));
                    match rs {
                        Some(rs) => validate_field_value(item, &rs, &item_path, root, ctx),
                        None => Vec::new(),
                    }
                })
                .collect();
            if !child_errors.is_empty() {
                errors.push(ValidationError::group(
                    path.to_vec(),
                    path.to_vec(),
                    ErrorCode::SEQUENCE_SCHEMA,
                    "items",
                    child_errors,
                ));
            }
        }
    }

    if let (Some(keys_rule), Value::Map(m)) = (ruleset.get("keysrules"), value) {
        if let Ok(key_ruleset) = RuleSet::from_value(keys_rule) {
            let child_errors: Vec<ValidationError> =
                m.keys().flat_map(|k| validate_field_value(k, &key_ruleset, path, root, ctx)).collect();
            if !child_errors.is_empty() {
                errors.push(ValidationError::group(
                    path.to_vec(),
                    path.to_vec(),
                    ErrorCode::KEYS_SCHEMA,
                    "keysrules",
                    child_errors,
                ));
            }
        }
    }

    if let (Some(values_rule), Value::Map(m)) = (ruleset.get("valuesrules"), value) {
        if let Ok(value_ruleset) = RuleSet::from_value(values_rule) {
            let child_errors: Vec<ValidationError> = m
                .iter()
                .flat_map(|(k, v)| {
                    let mut value_path = path.to_vec();
                    value_path.push(k.clone());
                    validate_field_value(v, &value_ruleset, &value_path, root, ctx)
                })
                .collect();
            if !child_errors.is_empty() {
                errors.push(ValidationError::group(
                    path.to_vec(),
                    path.to_vec(),
                    ErrorCode::VALUES_SCHEMA,
                    "valuesrules",
                    child_errors,
                ));
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(
        types: &'a TypeRegistry,
        callables: &'a CallableRegistry,
        rules: &'a RuleSetRegistry,
        schemas: &'a SchemaRegistry,
    ) -> EngineContext<'a> {
        EngineContext {
            type_registry: types,
            callables,
            rules_set_registry: rules,
            schema_registry: schemas,
            allow_unknown: false,
            require_all: false,
            ignore_none_values: false,
            update: false,
        }
    }

    fn field(pairs: Vec<(&str, Value)>) -> Value {
        let mut m = IndexMap::new();
        for (k, v) in pairs {
            m.insert(Value::str(k), v);
        }
        Value::Map(m)
    }

    #[test]
    fn required_field_missing_is_reported() {
        let mut schema_map = IndexMap::new();
        schema_map.insert(Value::str("name"), field(vec![("required", Value::Bool(true))]));
        let schema = Schema(schema_map);
        let document = Value::Map(IndexMap::new());

        let types = TypeRegistry::with_builtins();
        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&types, &callables, &rules, &schemas);
        let errors = validate_document(&document, &schema, &c);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::REQUIRED_FIELD);
    }

    #[test]
    fn unknown_field_is_reported_unless_allowed() {
        let schema = Schema(IndexMap::new());
        let mut doc_map = IndexMap::new();
        doc_map.insert(Value::str("extra"), Value::Int(1));
        let document = Value::Map(doc_map);

        let types = TypeRegistry::with_builtins();
        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&types, &callables, &rules, &schemas);
        let errors = validate_document(&document, &schema, &c);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::UNKNOWN_FIELD);
    }

    #[test]
    fn type_mismatch_short_circuits_further_checks() {
        let mut schema_map = IndexMap::new();
        schema_map.insert(
            Value::str("age"),
            field(vec![("type", Value::str("integer")), ("min", Value::Int(0))]),
        );
        let schema = Schema(schema_map);
        let mut doc_map = IndexMap::new();
        doc_map.insert(Value::str("age"), Value::str("not a number"));
        let document = Value::Map(doc_map);

        let types = TypeRegistry::with_builtins();
        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&types, &callables, &rules, &schemas);
        let errors = validate_document(&document, &schema, &c);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::BAD_TYPE);
    }

    #[test]
    fn dependencies_unmet_skips_remaining_checks() {
        let mut schema_map = IndexMap::new();
        schema_map.insert(
            Value::str("zip"),
            field(vec![
                ("dependencies", Value::str("country")),
                ("type", Value::str("integer")),
            ]),
        );
        let schema = Schema(schema_map);
        let mut doc_map = IndexMap::new();
        doc_map.insert(Value::str("zip"), Value::str("not-an-int"));
        let document = Value::Map(doc_map);

        let types = TypeRegistry::with_builtins();
        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&types, &callables, &rules, &schemas);
        let errors = validate_document(&document, &schema, &c);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::DEPENDENCIES_FIELD);
    }

    #[test]
    fn nested_schema_errors_are_grouped() {
        let mut inner = IndexMap::new();
        inner.insert(Value::str("city"), field(vec![("required", Value::Bool(true))]));
        let mut schema_map = IndexMap::new();
        schema_map.insert(
            Value::str("address"),
            field(vec![("type", Value::str("dict")), ("schema", Value::Map(inner))]),
        );
        let schema = Schema(schema_map);
        let mut doc_map = IndexMap::new();
        doc_map.insert(Value::str("address"), Value::Map(IndexMap::new()));
        let document = Value::Map(doc_map);

        let types = TypeRegistry::with_builtins();
        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&types, &callables, &rules, &schemas);
        let errors = validate_document(&document, &schema, &c);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::MAPPING_SCHEMA);
        assert_eq!(errors[0].children().count(), 1);
    }

    #[test]
    fn readonly_field_present_is_reported() {
        let mut schema_map = IndexMap::new();
        schema_map.insert(Value::str("id"), field(vec![("readonly", Value::Bool(true))]));
        let schema = Schema(schema_map);
        let mut doc_map = IndexMap::new();
        doc_map.insert(Value::str("id"), Value::Int(1));
        let document = Value::Map(doc_map);

        let types = TypeRegistry::with_builtins();
        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&types, &callables, &rules, &schemas);
        let errors = validate_document(&document, &schema, &c);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::READONLY_FIELD);
    }

    #[test]
    fn update_mode_suppresses_required_errors() {
        let mut schema_map = IndexMap::new();
        schema_map.insert(Value::str("name"), field(vec![("required", Value::Bool(true))]));
        let schema = Schema(schema_map);
        let document = Value::Map(IndexMap::new());

        let types = TypeRegistry::with_builtins();
        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let mut c = ctx(&types, &callables, &rules, &schemas);
        c.update = true;
        let errors = validate_document(&document, &schema, &c);

        assert!(errors.is_empty());
    }
}
