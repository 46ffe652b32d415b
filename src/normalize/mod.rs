//! Normalization pipeline (component F): `rename` → `purge_readonly` →
//! `purge_unknown` → `default`/`default_setter` → `coerce`, recursing into
//! nested `schema`/`items`/`keysrules`/`valuesrules` but never into a
//! logical combinator (`allof`/`anyof`/`oneof`/`noneof` are validation-only
//! and are left untouched here).
//!
//! Grounded on the config-validation engine's dispatch-by-category shape
//! (`engine/mod.rs::ValidationEngine`) adapted from "run every registered
//! rule" to "run this fixed, ordered pipeline of steps", since normalization
//! in Cerberus is a pipeline rather than an open rule set.

mod coerce;
mod defaults;
mod purge;
mod rename;

use crate::callables::CallableRegistry;
use crate::error::{ErrorList, ValidationError};
use crate::registry::{resolve_ruleset_ref, resolve_schema_value, RuleSetRegistry, SchemaRegistry};
use crate::schema::{RuleSet, Schema};
use crate::value::Value;
use indexmap::IndexMap;

/// Validator-wide normalization switches (mirrors the matching fields on
/// `Validator`, threaded through here so normalization can run standalone).
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeConfig {
    pub purge_unknown: bool,
    pub purge_readonly: bool,
}

pub struct NormalizeContext<'a> {
    pub config: NormalizeConfig,
    pub rules_set_registry: &'a RuleSetRegistry,
    pub schema_registry: &'a SchemaRegistry,
    pub callables: &'a CallableRegistry,
}

/// A schema field resolved to its final (post-rename) name and its
/// reference-expanded, alias-normalized rule-set.
struct FieldPlan {
    original_name: Value,
    new_name: Value,
    ruleset: RuleSet,
}

fn build_field_plans(schema: &Schema, ctx: &NormalizeContext) -> Vec<FieldPlan> {
    schema
        .fields()
        .filter_map(|(name, raw)| {
            let mut ruleset = resolve_ruleset_ref(raw, ctx.rules_set_registry).ok()?;
            ruleset.normalize_aliases();
            let new_name = ruleset.get("rename").cloned().unwrap_or_else(|| name.clone());
            Some(FieldPlan { original_name: name.clone(), new_name, ruleset })
        })
        .collect()
}

/// Entry point: normalize a whole top-level document against its schema.
/// Returns the normalized document and any normalization-class errors
/// accumulated along the way (these carry `0x60`-class codes and are merged
/// into the validator's error list rather than raised).
pub fn normalize_document(document: Value, schema: &Schema, ctx: &NormalizeContext) -> (Value, ErrorList) {
    let mut errors = ErrorList::new();
    let normalized = match document {
        Value::Map(map) => {
            let (normalized_map, field_errors) =
                normalize_mapping(map, schema, &None, ctx.config.purge_unknown, Vec::new(), ctx);
            errors.extend(field_errors);
            Value::Map(normalized_map)
        }
        other => other,
    };
    (normalized, errors)
}

/// Run the pipeline over a single mapping level. `allow_unknown` is the
/// override inherited from the *containing* field's own rule-set (`None` at
/// the document root, unless a caller threads one through explicitly).
fn normalize_mapping(
    doc: IndexMap<Value, Value>,
    schema: &Schema,
    allow_unknown: &Option<Value>,
    purge_unknown_effective: bool,
    path: Vec<Value>,
    ctx: &NormalizeContext,
) -> (IndexMap<Value, Value>, Vec<ValidationError>) {
    let fields = build_field_plans(schema, ctx);
    let mut errors = Vec::new();

    let (mut result, rename_errors) = rename::apply_rename(doc, &fields, allow_unknown, ctx.callables, &path);
    errors.extend(rename_errors);

    if ctx.config.purge_readonly {
        purge::purge_readonly(&mut result, &fields);
    }

    let purge_unknown = match allow_unknown {
        Some(Value::Map(ruleset)) if ruleset.contains_key(&Value::str("purge_unknown")) => ruleset
            .get(&Value::str("purge_unknown"))
            .and_then(Value::as_bool)
            .unwrap_or(purge_unknown_effective),
        _ => purge_unknown_effective,
    };
    purge::purge_unknown(&mut result, &fields, purge_unknown);

    let default_errors = defaults::apply_defaults(&mut result, &fields, ctx.callables, &path);
    errors.extend(default_errors);

    for field in &fields {
        if let Some(value) = result.shift_remove(&field.new_name) {
            let mut field_path = path.clone();
            field_path.push(field.new_name.clone());
            let normalized = normalize_scalar(value, &field.ruleset, &field_path, ctx, &mut errors);
            result.insert(field.new_name.clone(), normalized);
        }
    }

    (result, errors)
}

/// Apply `coerce` to a single value, then recurse into whichever of
/// `schema`/`items`/`keysrules`/`valuesrules` applies to its shape.
fn normalize_scalar(
    value: Value,
    ruleset: &RuleSet,
    path: &[Value],
    ctx: &NormalizeContext,
    errors: &mut Vec<ValidationError>,
) -> Value {
    let value = coerce::apply_single(value, ruleset, ctx.callables, path, errors);

    let value = if let Some(nested_raw) = ruleset.get("schema") {
        match value {
            Value::Map(m) => {
                if let Ok(resolved) = resolve_schema_value(nested_raw, ctx.schema_registry) {
                    if let Ok(nested_schema) = Schema::from_value(resolved) {
                        let allow_unknown = ruleset.get("allow_unknown").cloned();
                        let purge = ruleset
                            .get("purge_unknown")
                            .and_then(Value::as_bool)
                            .unwrap_or(ctx.config.purge_unknown);
                        let (normalized, nested_errors) =
                            normalize_mapping(m, &nested_schema, &allow_unknown, purge, path.to_vec(), ctx);
                        errors.extend(nested_errors);
                        return Value::Map(normalized);
                    }
                    return Value::Map(m);
                }
                Value::Map(m)
            }
            Value::Seq(items) => {
                if let Ok(item_ruleset) = RuleSet::from_value(nested_raw) {
                    let mut new_items = Vec::with_capacity(items.len());
                    for (i, item) in items.into_iter().enumerate() {
                        let mut item_path = path.to_vec();
                        item_path.push(Value::Int(i as i64));
                        new_items.push(normalize_scalar(item, &item_ruleset, &item_path, ctx, errors));
                    }
                    return Value::Seq(new_items);
                }
                Value::Seq(items)
            }
            other => other,
        }
    } else {
        value
    };

    let value = if let Some(items_rule) = ruleset.get("items") {
        match (items_rule, value) {
            (Value::Seq(item_rulesets), Value::Seq(items)) => {
                let mut new_items = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    match item_rulesets.get(i).and_then(|rs| RuleSet::from_value(rs).ok()) {
                        Some(rs) => {
                            let mut item_path = path.to_vec();
                            item_path.push(Value::Int(i as i64));
                            new_items.push(normalize_scalar(item, &rs, &item_path, ctx, errors));
                        }
                        None => new_items.push(item),
                    }
                }
                Value::Seq(new_items)
            }
            (_, other) => other,
        }
    } else {
        value
    };

    let value = if let Some(keys_rule) = ruleset.get("keysrules") {
        match (RuleSet::from_value(keys_rule), value) {
            (Ok(key_ruleset), Value::Map(m)) => {
                let mut new_map = IndexMap::new();
                for (k, v) in m {
                    let normalized_key = normalize_scalar(k, &key_ruleset, path, ctx, errors);
                    new_map.insert(normalized_key, v);
                }
                Value::Map(new_map)
            }
            (_, other) => other,
        }
    } else {
        value
    };

    if let Some(values_rule) = ruleset.get("valuesrules") {
        if let (Ok(value_ruleset), Value::Map(m)) = (RuleSet::from_value(values_rule), value.clone()) {
            let mut new_map = IndexMap::new();
            for (k, v) in m {
                let mut value_path = path.to_vec();
                value_path.push(k.clone());
                new_map.insert(k, normalize_scalar(v, &value_ruleset, &value_path, ctx, errors));
            }
            return Value::Map(new_map);
        }
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RuleSetRegistry, SchemaRegistry};

    fn ctx<'a>(
        callables: &'a CallableRegistry,
        rules_set_registry: &'a RuleSetRegistry,
        schema_registry: &'a SchemaRegistry,
        purge_unknown: bool,
        purge_readonly: bool,
    ) -> NormalizeContext<'a> {
        NormalizeContext {
            config: NormalizeConfig { purge_unknown, purge_readonly },
            rules_set_registry,
            schema_registry,
            callables,
        }
    }

    fn schema_from(pairs: Vec<(&str, Value)>) -> Schema {
        let mut m = IndexMap::new();
        for (k, v) in pairs {
            m.insert(Value::str(k), v);
        }
        Schema(m)
    }

    fn ruleset_from(pairs: Vec<(&str, Value)>) -> Value {
        let mut m = IndexMap::new();
        for (k, v) in pairs {
            m.insert(Value::str(k), v);
        }
        Value::Map(m)
    }

    #[test]
    fn rename_moves_value_to_new_key() {
        let schema = schema_from(vec![("old", ruleset_from(vec![("rename", Value::str("new"))]))]);
        let mut doc = IndexMap::new();
        doc.insert(Value::str("old"), Value::Int(1));

        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&callables, &rules, &schemas, false, false);
        let (result, errors) = normalize_mapping(doc, &schema, &None, false, Vec::new(), &c);

        assert!(errors.is_empty());
        assert_eq!(result.get(&Value::str("new")), Some(&Value::Int(1)));
        assert!(!result.contains_key(&Value::str("old")));
    }

    #[test]
    fn purge_unknown_drops_unrecognized_fields() {
        let schema = schema_from(vec![("known", ruleset_from(vec![("type", Value::str("integer"))]))]);
        let mut doc = IndexMap::new();
        doc.insert(Value::str("known"), Value::Int(1));
        doc.insert(Value::str("extra"), Value::Int(2));

        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&callables, &rules, &schemas, true, false);
        let (result, _) = normalize_mapping(doc, &schema, &None, true, Vec::new(), &c);

        assert!(result.contains_key(&Value::str("known")));
        assert!(!result.contains_key(&Value::str("extra")));
    }

    #[test]
    fn purge_readonly_removes_readonly_field() {
        let schema = schema_from(vec![("secret", ruleset_from(vec![("readonly", Value::Bool(true))]))]);
        let mut doc = IndexMap::new();
        doc.insert(Value::str("secret"), Value::Int(1));

        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&callables, &rules, &schemas, false, true);
        let (result, _) = normalize_mapping(doc, &schema, &None, false, Vec::new(), &c);

        assert!(!result.contains_key(&Value::str("secret")));
    }

    #[test]
    fn default_fills_missing_field() {
        let schema = schema_from(vec![("count", ruleset_from(vec![("default", Value::Int(0))]))]);
        let doc = IndexMap::new();

        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&callables, &rules, &schemas, false, false);
        let (result, errors) = normalize_mapping(doc, &schema, &None, false, Vec::new(), &c);

        assert!(errors.is_empty());
        assert_eq!(result.get(&Value::str("count")), Some(&Value::Int(0)));
    }

    #[test]
    fn default_does_not_override_explicit_null() {
        let schema = schema_from(vec![(
            "count",
            ruleset_from(vec![("default", Value::Int(0)), ("nullable", Value::Bool(true))]),
        )]);
        let mut doc = IndexMap::new();
        doc.insert(Value::str("count"), Value::Null);

        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&callables, &rules, &schemas, false, false);
        let (result, _) = normalize_mapping(doc, &schema, &None, false, Vec::new(), &c);

        assert_eq!(result.get(&Value::str("count")), Some(&Value::Null));
    }

    #[test]
    fn coerce_transforms_present_value() {
        let schema = schema_from(vec![("age", ruleset_from(vec![("coerce", Value::str("to_int"))]))]);
        let mut doc = IndexMap::new();
        doc.insert(Value::str("age"), Value::str("42"));

        let mut callables = CallableRegistry::new();
        callables.register_coercer("to_int", |v| match v {
            Value::String(s) => s.parse::<i64>().map(Value::Int).unwrap_or_else(|_| v.clone()),
            other => other.clone(),
        });
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&callables, &rules, &schemas, false, false);
        let (result, errors) = normalize_mapping(doc, &schema, &None, false, Vec::new(), &c);

        assert!(errors.is_empty());
        assert_eq!(result.get(&Value::str("age")), Some(&Value::Int(42)));
    }

    #[test]
    fn recurses_into_nested_schema() {
        let inner_schema = ruleset_from(vec![("count", ruleset_from(vec![("default", Value::Int(7))]))]);
        let schema = schema_from(vec![(
            "address",
            ruleset_from(vec![("type", Value::str("dict")), ("schema", inner_schema)]),
        )]);
        let mut doc = IndexMap::new();
        doc.insert(Value::str("address"), Value::Map(IndexMap::new()));

        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&callables, &rules, &schemas, false, false);
        let (result, _) = normalize_mapping(doc, &schema, &None, false, Vec::new(), &c);

        let nested = result.get(&Value::str("address")).unwrap().as_map().unwrap();
        assert_eq!(nested.get(&Value::str("count")), Some(&Value::Int(7)));
    }

    #[test]
    fn does_not_recurse_into_anyof() {
        let schema = schema_from(vec![(
            "value",
            ruleset_from(vec![(
                "anyof",
                Value::Seq(vec![
                    ruleset_from(vec![("type", Value::str("integer"))]),
                    ruleset_from(vec![("type", Value::str("string"))]),
                ]),
            )]),
        )]);
        let mut doc = IndexMap::new();
        doc.insert(Value::str("value"), Value::Int(3));

        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&callables, &rules, &schemas, false, false);
        let (result, errors) = normalize_mapping(doc, &schema, &None, false, Vec::new(), &c);

        assert!(errors.is_empty());
        assert_eq!(result.get(&Value::str("value")), Some(&Value::Int(3)));
    }
}
