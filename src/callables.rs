//! Extension-point callable registry: `coerce`, `default_setter`,
//! `rename_handler`, and `check_with` are opaque "callable refs" supplied
//! by the embedding host. In Rust there is no implicit global
//! function-name lookup, so a schema names a callable by a registered
//! string key; the host registers
//! the actual closure once, the way `agents/config-validation/src/schema.rs`
//! registers `Box<dyn FormatDetector>` instances by building them up front
//! in `add_builtin_detectors` and looking them up by behavior rather than
//! by name reflection.

use crate::value::Value;
use std::collections::HashMap;
use std::sync::Arc;

pub type Coercer = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
pub type DefaultSetter = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
pub type RenameHandler = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
pub type CheckWith = Arc<dyn Fn(&[Value], &Value, &mut dyn FnMut(Vec<Value>, String)) + Send + Sync>;

/// Registry of named extension callables, injected into a `Validator`.
#[derive(Clone, Default)]
pub struct CallableRegistry {
    coercers: HashMap<String, Coercer>,
    default_setters: HashMap<String, DefaultSetter>,
    rename_handlers: HashMap<String, RenameHandler>,
    check_withs: HashMap<String, CheckWith>,
}

impl CallableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_coercer(&mut self, name: impl Into<String>, f: impl Fn(&Value) -> Value + Send + Sync + 'static) {
        self.coercers.insert(name.into(), Arc::new(f));
    }

    pub fn register_default_setter(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) {
        self.default_setters.insert(name.into(), Arc::new(f));
    }

    pub fn register_rename_handler(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&Value) -> Value + Send + Sync + 'static,
    ) {
        self.rename_handlers.insert(name.into(), Arc::new(f));
    }

    pub fn register_check_with(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&[Value], &Value, &mut dyn FnMut(Vec<Value>, String)) + Send + Sync + 'static,
    ) {
        self.check_withs.insert(name.into(), Arc::new(f));
    }

    pub fn coercer(&self, name: &str) -> Option<Coercer> {
        self.coercers.get(name).cloned()
    }

    pub fn default_setter(&self, name: &str) -> Option<DefaultSetter> {
        self.default_setters.get(name).cloned()
    }

    pub fn rename_handler(&self, name: &str) -> Option<RenameHandler> {
        self.rename_handlers.get(name).cloned()
    }

    pub fn check_with(&self, name: &str) -> Option<CheckWith> {
        self.check_withs.get(name).cloned()
    }
}

/// Normalize a `coerce`/`default_setter`/`rename_handler` constraint value
/// (a single name or a chain) into an ordered list of names.
pub fn chain_names(constraint: &Value) -> Vec<String> {
    match constraint {
        Value::String(s) => vec![s.clone()],
        Value::Seq(items) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_names_handles_single_and_chain() {
        assert_eq!(chain_names(&Value::str("int")), vec!["int".to_string()]);
        let chain = Value::Seq(vec![Value::str("strip"), Value::str("int")]);
        assert_eq!(chain_names(&chain), vec!["strip".to_string(), "int".to_string()]);
    }

    #[test]
    fn registered_coercer_roundtrips() {
        let mut registry = CallableRegistry::new();
        registry.register_coercer("int", |v| match v {
            Value::String(s) => s.parse::<i64>().map(Value::Int).unwrap_or_else(|_| v.clone()),
            other => other.clone(),
        });
        let f = registry.coercer("int").unwrap();
        assert_eq!(f(&Value::str("42")), Value::Int(42));
    }
}
