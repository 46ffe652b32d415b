//! Schema model (component D): the `Schema`/`RuleSet`/`Constraint` AST,
//! rule aliasing, and the typesaver-combinator expansion.
//!
//! Grounded on `contracts::schemas::{ConfigSchema, FieldRule,
//! ValidationConstraint}`, generalized from a closed, strongly-typed Rust
//! struct per field to a dynamically-shaped rule-set: a `Map(RuleName ->
//! Constraint)` where `Constraint` is itself a `Value`.

use crate::error::SchemaError;
use crate::value::Value;
use indexmap::IndexMap;

/// A schema: a mapping from field name to rule-set (or, before reference
/// expansion, to a `Value::String` naming a registry entry).
#[derive(Debug, Clone)]
pub struct Schema(pub IndexMap<Value, Value>);

/// A rule-set: a mapping from rule name to constraint, for a single field.
#[derive(Debug, Clone)]
pub struct RuleSet(pub IndexMap<String, Value>);

/// Aliases kept for migration. `keyschema`/`propertyschema` both alias
/// `keysrules`; `valueschema` aliases `valuesrules`; `validator` aliases
/// `check_with`.
const RULE_ALIASES: &[(&str, &str)] = &[
    ("keyschema", "keysrules"),
    ("propertyschema", "keysrules"),
    ("valueschema", "valuesrules"),
    ("validator", "check_with"),
];

const COMBINATORS: &[&str] = &["allof", "anyof", "oneof", "noneof"];

impl Schema {
    pub fn from_value(value: Value) -> Result<Self, SchemaError> {
        match value {
            Value::Map(m) => Ok(Schema(m)),
            other => Err(SchemaError::InvalidRule(format!(
                "schema must be a mapping, got {}",
                other.kind_name()
            ))),
        }
    }

    pub fn get(&self, field: &Value) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.0.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Map(self.0)
    }
}

impl RuleSet {
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::Map(m) => {
                let mut out = IndexMap::new();
                for (k, v) in m {
                    let name = k.as_str().ok_or_else(|| {
                        SchemaError::InvalidRule("rule names must be strings".to_string())
                    })?;
                    out.insert(name.to_string(), v.clone());
                }
                Ok(RuleSet(out))
            }
            other => Err(SchemaError::InvalidRule(format!(
                "rule-set must be a mapping, got {}",
                other.kind_name()
            ))),
        }
    }

    pub fn get(&self, rule: &str) -> Option<&Value> {
        self.0.get(rule)
    }

    pub fn has(&self, rule: &str) -> bool {
        self.0.contains_key(rule)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Rewrite deprecated rule names in-place to their canonical form,
    /// emitting a deprecation notice through the ambient tracing stack.
    pub fn normalize_aliases(&mut self) {
        for (old, new) in RULE_ALIASES {
            if let Some(value) = self.0.shift_remove(*old) {
                tracing::warn!(old_rule = *old, new_rule = *new, "rule name is deprecated");
                self.0.insert(new.to_string(), value);
            }
        }
    }

    /// Expand `<combinator>_<rule>: [v1, v2, ...]` into
    /// `<combinator>: [{<rule>: v1}, {<rule>: v2}, ...]` (the "typesaver"
    /// shorthand). Multiple typesaver keys targeting the same combinator
    /// (e.g. `anyof_min` and `anyof_max` on one field) have their
    /// alternatives concatenated rather than one overwriting the other, and
    /// the result is appended to any pre-existing explicit combinator rule
    /// rather than discarding it.
    pub fn expand_typesavers(&mut self) {
        let mut expansions: IndexMap<String, Vec<Value>> = IndexMap::new();
        let mut consumed = Vec::new();

        for (name, constraint) in self.0.iter() {
            for combinator in COMBINATORS {
                let prefix = format!("{combinator}_");
                if let Some(rule_name) = name.strip_prefix(&prefix) {
                    if let Value::Seq(values) = constraint {
                        let alternatives = values.iter().map(|v| {
                            let mut m = IndexMap::new();
                            m.insert(Value::str(rule_name), v.clone());
                            Value::Map(m)
                        });
                        expansions.entry(combinator.to_string()).or_default().extend(alternatives);
                    }
                    consumed.push(name.clone());
                }
            }
        }

        for name in consumed {
            self.0.shift_remove(&name);
        }
        for (combinator, mut alternatives) in expansions {
            if let Some(Value::Seq(existing)) = self.0.get(&combinator) {
                let mut merged = existing.clone();
                merged.append(&mut alternatives);
                alternatives = merged;
            }
            self.0.insert(combinator, Value::Seq(alternatives));
        }
    }

    pub fn into_value(self) -> Value {
        let mut m = IndexMap::new();
        for (k, v) in self.0 {
            m.insert(Value::String(k), v);
        }
        Value::Map(m)
    }
}
