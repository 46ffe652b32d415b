//! Schema-of-schemas meta-validation (component E): checking that a
//! `Schema`'s rule-sets are themselves well-formed before they are ever run
//! against a document.
//!
//! Grounded on `TypeRegistry`'s open, registrable predicate table
//! (`types.rs`) — the same "name maps to a predicate, extensions register
//! more" shape, applied here to rule *names* instead of value *types*. This
//! sidesteps feeding the meta-schema back through the validation engine
//! (which would work, since the meta-schema is itself just a `Schema`, but
//! would mean the engine must exist and be stable before meta-validation can
//! be exercised at all — simpler to check constraint shapes directly and
//! keep the two concerns decoupled).

use crate::error::SchemaError;
use crate::schema::{RuleSet, Schema};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

pub type ConstraintShape = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// The rule-name -> "does this constraint look right" table.
#[derive(Clone)]
pub struct MetaSchema {
    shapes: HashMap<String, ConstraintShape>,
}

fn is_bool(v: &Value) -> bool {
    matches!(v, Value::Bool(_))
}

fn is_string(v: &Value) -> bool {
    matches!(v, Value::String(_))
}

fn is_seq(v: &Value) -> bool {
    matches!(v, Value::Seq(_))
}

fn is_map(v: &Value) -> bool {
    matches!(v, Value::Map(_))
}

fn is_seq_of_maps(v: &Value) -> bool {
    matches!(v, Value::Seq(items) if items.iter().all(is_map))
}

fn is_comparable(v: &Value) -> bool {
    matches!(v, Value::Int(_) | Value::Float(_) | Value::Date(_) | Value::DateTime(_))
}

fn is_nonneg_int(v: &Value) -> bool {
    matches!(v, Value::Int(i) if *i >= 0)
}

fn is_callable_ref(v: &Value) -> bool {
    is_string(v) || matches!(v, Value::Seq(items) if items.iter().all(is_string))
}

fn is_type_name(v: &Value) -> bool {
    is_string(v) || matches!(v, Value::Seq(items) if items.iter().all(is_string))
}

impl MetaSchema {
    fn empty() -> Self {
        Self { shapes: HashMap::new() }
    }

    /// The built-in rule catalog.
    pub fn with_builtins() -> Self {
        let mut meta = Self::empty();

        meta.register_rule_constraint("type", is_type_name);
        meta.register_rule_constraint("nullable", is_bool);
        meta.register_rule_constraint("readonly", is_bool);
        meta.register_rule_constraint("required", is_bool);
        meta.register_rule_constraint("empty", is_bool);
        meta.register_rule_constraint("allow_unknown", |v| is_bool(v) || is_map(v));
        meta.register_rule_constraint("require_all", is_bool);
        meta.register_rule_constraint("purge_unknown", is_bool);
        meta.register_rule_constraint("min", is_comparable);
        meta.register_rule_constraint("max", is_comparable);
        meta.register_rule_constraint("minlength", is_nonneg_int);
        meta.register_rule_constraint("maxlength", is_nonneg_int);
        meta.register_rule_constraint("allowed", is_seq);
        meta.register_rule_constraint("forbidden", is_seq);
        meta.register_rule_constraint("regex", |v| matches!(v, Value::String(s) if regex::Regex::new(s).is_ok()));
        meta.register_rule_constraint("contains", |_| true);
        meta.register_rule_constraint("dependencies", |v| is_seq(v) || is_map(v) || is_string(v));
        meta.register_rule_constraint("excludes", |v| is_seq(v) || is_string(v));
        meta.register_rule_constraint("items", is_seq);
        meta.register_rule_constraint("schema", |v| is_map(v) || is_string(v));
        meta.register_rule_constraint("keysrules", is_map);
        meta.register_rule_constraint("valuesrules", is_map);
        meta.register_rule_constraint("allof", is_seq_of_maps);
        meta.register_rule_constraint("anyof", is_seq_of_maps);
        meta.register_rule_constraint("oneof", is_seq_of_maps);
        meta.register_rule_constraint("noneof", is_seq_of_maps);
        meta.register_rule_constraint("check_with", is_callable_ref);
        meta.register_rule_constraint("meta", |_| true);
        meta.register_rule_constraint("rename", is_string);
        meta.register_rule_constraint("rename_handler", is_callable_ref);
        meta.register_rule_constraint("default", |_| true);
        meta.register_rule_constraint("default_setter", is_callable_ref);
        meta.register_rule_constraint("coerce", is_callable_ref);
        meta.register_rule_constraint("purge_readonly", is_bool);

        meta
    }

    /// Register (or override) the constraint shape for a custom rule name.
    pub fn register_rule_constraint(
        &mut self,
        name: impl Into<String>,
        shape: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) {
        self.shapes.insert(name.into(), Arc::new(shape));
    }

    pub fn is_known_rule(&self, name: &str) -> bool {
        self.shapes.contains_key(name)
    }

    /// Check a single rule-set against the meta-schema. Combinator
    /// alternatives, nested `schema` mappings, and `items` rule-sets are
    /// walked recursively so a malformed rule anywhere inside a nested shape
    /// is still caught up front, before any document traversal.
    pub fn validate_ruleset(&self, ruleset: &RuleSet) -> Result<(), SchemaError> {
        for (name, constraint) in ruleset.iter() {
            match self.shapes.get(name) {
                Some(shape) if shape(constraint) => {}
                Some(_) => {
                    return Err(SchemaError::NotMetaValid(format!(
                        "rule `{name}` has a malformed constraint: {constraint}"
                    )))
                }
                None => return Err(SchemaError::NotMetaValid(format!("unknown rule `{name}`"))),
            }

            match name {
                "allof" | "anyof" | "oneof" | "noneof" => {
                    if let Value::Seq(alternatives) = constraint {
                        for alt in alternatives {
                            self.validate_ruleset(&RuleSet::from_value(alt)?)?;
                        }
                    }
                }
                "schema" => {
                    // Ambiguous by shape alone: a nested dict schema and a
                    // per-item rule-set (for `type: list`) are both maps.
                    // Try the dict-schema reading first and fall back to a
                    // flat rule-set if that does not type-check.
                    if let Value::Map(_) = constraint {
                        let as_schema = Schema::from_value(constraint.clone())?;
                        if self.validate_schema(&as_schema).is_err() {
                            self.validate_ruleset(&RuleSet::from_value(constraint)?)?;
                        }
                    }
                }
                "items" => {
                    if let Value::Seq(item_rules) = constraint {
                        for item_rule in item_rules {
                            self.validate_ruleset(&RuleSet::from_value(item_rule)?)?;
                        }
                    }
                }
                "keysrules" | "valuesrules" => {
                    self.validate_ruleset(&RuleSet::from_value(constraint)?)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Check every field's rule-set in a schema.
    pub fn validate_schema(&self, schema: &Schema) -> Result<(), SchemaError> {
        for (_, raw) in schema.fields() {
            let ruleset = RuleSet::from_value(raw)?;
            self.validate_ruleset(&ruleset)?;
        }
        Ok(())
    }
}

/// The process-wide default meta-schema, built once.
pub fn default_meta_schema() -> MetaSchema {
    static META: OnceLock<MetaSchema> = OnceLock::new();
    META.get_or_init(MetaSchema::with_builtins).clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn accepts_well_formed_ruleset() {
        let mut m = IndexMap::new();
        m.insert("type".to_string(), Value::str("string"));
        m.insert("minlength".to_string(), Value::Int(2));
        let ruleset = RuleSet(m);
        assert!(default_meta_schema().validate_ruleset(&ruleset).is_ok());
    }

    #[test]
    fn rejects_unknown_rule_name() {
        let mut m = IndexMap::new();
        m.insert("not_a_rule".to_string(), Value::Int(1));
        let ruleset = RuleSet(m);
        let err = default_meta_schema().validate_ruleset(&ruleset).unwrap_err();
        assert!(matches!(err, SchemaError::NotMetaValid(_)));
    }

    #[test]
    fn rejects_malformed_constraint() {
        let mut m = IndexMap::new();
        m.insert("minlength".to_string(), Value::str("two"));
        let ruleset = RuleSet(m);
        let err = default_meta_schema().validate_ruleset(&ruleset).unwrap_err();
        assert!(matches!(err, SchemaError::NotMetaValid(_)));
    }

    #[test]
    fn extension_rule_can_be_registered() {
        let mut meta = MetaSchema::with_builtins();
        meta.register_rule_constraint("geo_precision", |v| matches!(v, Value::Int(n) if *n >= 0 && *n <= 15));
        let mut m = IndexMap::new();
        m.insert("geo_precision".to_string(), Value::Int(6));
        let ruleset = RuleSet(m);
        assert!(meta.validate_ruleset(&ruleset).is_ok());
    }
}
