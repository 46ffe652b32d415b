//! Named registries (component D, continued): reusable schemas and
//! rule-sets referenced by string, with lazy, cycle-tolerant resolution.
//!
//! Grounded on `agents/config-validation/src/schema.rs`'s `SchemaInference`
//! registration pattern (a registry of named, boxed behaviors built once at
//! construction) adapted to hold data (`Schema`/`RuleSet`) rather than
//! trait objects, plus a mutation-invalidates-cache generation counter.

use crate::error::SchemaError;
use crate::schema::RuleSet;
use crate::value::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

/// Registry of named, reusable rule-sets (referenced from a field's
/// constraint position as a bare `Value::String`).
#[derive(Clone, Default)]
pub struct RuleSetRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

/// Registry of named, reusable schemas (referenced the same way, but where
/// a full `Schema` mapping is expected, e.g. in a `schema` rule).
#[derive(Clone, Default)]
pub struct SchemaRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<String, Value>,
    /// Bumped on every mutation; meta-validation caches key off this so a
    /// registry update invalidates previously-cached results.
    generation: u64,
}

macro_rules! registry_impl {
    ($ty:ident) => {
        impl $ty {
            pub fn new() -> Self {
                Self::default()
            }

            pub fn register(&self, name: impl Into<String>, value: Value) {
                let mut inner = self.inner.lock().expect("registry lock poisoned");
                inner.entries.insert(name.into(), value);
                inner.generation += 1;
            }

            pub fn remove(&self, name: &str) {
                let mut inner = self.inner.lock().expect("registry lock poisoned");
                if inner.entries.remove(name).is_some() {
                    inner.generation += 1;
                }
            }

            pub fn get(&self, name: &str) -> Option<Value> {
                self.inner.lock().expect("registry lock poisoned").entries.get(name).cloned()
            }

            pub fn generation(&self) -> u64 {
                self.inner.lock().expect("registry lock poisoned").generation
            }
        }
    };
}

registry_impl!(RuleSetRegistry);
registry_impl!(SchemaRegistry);

/// The process-wide default registries — shared by default, but every
/// `Validator` may be built with its own via `Validator::with_schema_registry`
/// / `Validator::with_rules_set_registry`.
pub fn default_rules_set_registry() -> RuleSetRegistry {
    static REGISTRY: OnceLock<RuleSetRegistry> = OnceLock::new();
    REGISTRY.get_or_init(RuleSetRegistry::new).clone()
}

pub fn default_schema_registry() -> SchemaRegistry {
    static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();
    REGISTRY.get_or_init(SchemaRegistry::new).clone()
}

/// Follow a chain of bare-string registry references until a non-string
/// value is reached, substitution is lazy and the chain may be cyclic in
/// the registry graph, so each visited name is tracked and a repeat is
/// reported rather than recursing forever.
fn follow_chain(value: &Value, lookup: impl Fn(&str) -> Option<Value>) -> Result<Value, SchemaError> {
    let mut current = value.clone();
    let mut seen: Vec<String> = Vec::new();
    loop {
        let Value::String(name) = &current else { return Ok(current) };
        if seen.iter().any(|n| n == name) {
            return Err(SchemaError::CyclicReference(name.clone()));
        }
        seen.push(name.clone());
        current = lookup(name).ok_or_else(|| SchemaError::UnresolvedReference(name.clone()))?;
    }
}

/// Resolve `value` as a rule-set, following a chain of registry references
/// if it is a bare string (or a string pointing at another string, and so
/// on).
pub fn resolve_ruleset_ref(value: &Value, registry: &RuleSetRegistry) -> Result<RuleSet, SchemaError> {
    let resolved = follow_chain(value, |name| registry.get(name))?;
    RuleSet::from_value(&resolved)
}

/// Resolve `value` as a schema-or-ruleset reference (used by the `schema`
/// rule, which may point at a registered `Schema` by name, possibly via a
/// chain of registry references).
pub fn resolve_schema_value(value: &Value, registry: &SchemaRegistry) -> Result<Value, SchemaError> {
    follow_chain(value, |name| registry.get(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn registry_generation_bumps_on_mutation() {
        let registry = RuleSetRegistry::new();
        let gen0 = registry.generation();
        registry.register("shared", Value::map());
        assert!(registry.generation() > gen0);
    }

    #[test]
    fn resolve_ruleset_ref_by_name() {
        let registry = RuleSetRegistry::new();
        let mut rs = IndexMap::new();
        rs.insert(Value::str("type"), Value::str("string"));
        registry.register("named", Value::Map(rs));

        let resolved = resolve_ruleset_ref(&Value::str("named"), &registry).unwrap();
        assert_eq!(resolved.get("type"), Some(&Value::str("string")));
    }

    #[test]
    fn unresolved_reference_is_schema_error() {
        let registry = RuleSetRegistry::new();
        let err = resolve_ruleset_ref(&Value::str("missing"), &registry).unwrap_err();
        assert!(matches!(err, SchemaError::UnresolvedReference(_)));
    }

    #[test]
    fn chained_references_are_followed_to_the_end() {
        let registry = RuleSetRegistry::new();
        let mut rs = IndexMap::new();
        rs.insert(Value::str("type"), Value::str("string"));
        registry.register("a", Value::Map(rs));
        registry.register("b", Value::str("a"));
        registry.register("c", Value::str("b"));

        let resolved = resolve_ruleset_ref(&Value::str("c"), &registry).unwrap();
        assert_eq!(resolved.get("type"), Some(&Value::str("string")));
    }

    #[test]
    fn cyclic_reference_is_reported_not_looped_forever() {
        let registry = RuleSetRegistry::new();
        registry.register("a", Value::str("b"));
        registry.register("b", Value::str("a"));

        let err = resolve_ruleset_ref(&Value::str("a"), &registry).unwrap_err();
        assert!(matches!(err, SchemaError::CyclicReference(_)));
    }
}
