//! Type registry (component B): named type predicates and the abstract
//! container algebra (`Mapping`, `Sequence`, `Set`, `Sized`, `Iterable`,
//! `Container`).
//!
//! Grounded on `contracts::schemas::FieldType` (a closed, named enum of
//! concrete types), generalized into an open, registrable table so
//! extensions can register `(name, included_types, excluded_types)`.

use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A type predicate: given a value, does it match this named type.
pub type TypePredicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Maps type names (both concrete and abstract) to predicates.
///
/// Multiple types may be listed for a field; a value matches iff *any*
/// predicate holds.
#[derive(Clone)]
pub struct TypeRegistry {
    predicates: HashMap<String, TypePredicate>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl TypeRegistry {
    /// An empty registry with none of the built-in names.
    pub fn empty() -> Self {
        Self { predicates: HashMap::new() }
    }

    /// The closed core set of concrete + abstract type names.
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();

        reg.register("boolean", |v| matches!(v, Value::Bool(_)));
        reg.register("integer", |v| matches!(v, Value::Int(_)));
        reg.register("float", |v| matches!(v, Value::Float(_) | Value::Int(_)));
        reg.register("number", is_number);
        reg.register("string", |v| matches!(v, Value::String(_)));
        reg.register("bytes", |v| matches!(v, Value::Bytes(_)));
        reg.register("bytesarray", |v| matches!(v, Value::Bytes(_)));
        reg.register("date", |v| matches!(v, Value::Date(_)));
        reg.register("datetime", |v| matches!(v, Value::DateTime(_)));
        reg.register("dict", |v| matches!(v, Value::Map(_)));
        reg.register("list", is_list);
        reg.register("tuple", |v| matches!(v, Value::Tuple(_)));
        reg.register("set", |v| matches!(v, Value::Set(_)));
        reg.register("frozenset", |v| matches!(v, Value::FrozenSet(_)));
        reg.register("complex", |_| false);
        reg.register("type", |_| false);

        reg.register("Mapping", |v| matches!(v, Value::Map(_)));
        reg.register("Sequence", is_list);
        reg.register("Set", |v| matches!(v, Value::Set(_) | Value::FrozenSet(_)));
        reg.register("Sized", Value::is_sized);
        reg.register("Iterable", is_iterable);
        reg.register("Container", is_iterable);

        reg
    }

    /// Register (or override) a named type predicate.
    pub fn register(&mut self, name: impl Into<String>, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) {
        self.predicates.insert(name.into(), Arc::new(predicate));
    }

    /// Extension form taking explicit included/excluded concrete type
    /// names, for a registered alias built out of existing type names.
    pub fn register_alias(
        &mut self,
        name: impl Into<String>,
        included: Vec<String>,
        excluded: Vec<String>,
    ) {
        let registry = self.clone();
        self.register(name, move |v| {
            let included_match = included
                .iter()
                .any(|t| registry.predicates.get(t).is_some_and(|p| p(v)));
            let excluded_match = excluded
                .iter()
                .any(|t| registry.predicates.get(t).is_some_and(|p| p(v)));
            included_match && !excluded_match
        });
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Does `value` match the named type.
    pub fn matches(&self, name: &str, value: &Value) -> Option<bool> {
        self.predicates.get(name).map(|p| p(value))
    }

    /// Does `value` match *any* of the listed type names (the `type` rule
    /// accepts one type name or a sequence of them).
    pub fn matches_any(&self, names: &[String], value: &Value) -> bool {
        names.iter().any(|n| self.matches(n, value).unwrap_or(false))
    }
}

fn is_number(v: &Value) -> bool {
    matches!(v, Value::Int(_) | Value::Float(_))
}

fn is_list(v: &Value) -> bool {
    matches!(v, Value::Seq(_))
}

fn is_iterable(v: &Value) -> bool {
    matches!(
        v,
        Value::Seq(_) | Value::Map(_) | Value::Set(_) | Value::FrozenSet(_) | Value::Tuple(_) | Value::String(_)
    )
}
