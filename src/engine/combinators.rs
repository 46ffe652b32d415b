//! Logical combinators `allof`/`anyof`/`oneof`/`noneof` (the `0x90` group
//! error class): each alternative is validated as a single-field rule-set
//! applied speculatively to the field's own value, and the alternatives'
//! errors are merged into one group error if the combinator's pass-count
//! condition is not met.

use super::EngineContext;
use crate::error::{ErrorCode, ValidationError};
use crate::schema::RuleSet;
use crate::value::Value;

pub fn evaluate(
    name: &str,
    alternatives: &[Value],
    value: &Value,
    path: &[Value],
    root: &Value,
    ctx: &EngineContext,
) -> Vec<ValidationError> {
    let per_alternative: Vec<Vec<ValidationError>> = alternatives
        .iter()
        .map(|alt| {
            let ruleset = RuleSet::from_value(alt).unwrap_or_else(|_| RuleSet(Default::default()));
            super::validate_field_value(value, &ruleset, path, root, ctx)
        })
        .collect();

    let passed = per_alternative.iter().filter(|errs| errs.is_empty()).count();

    let satisfied = match name {
        "allof" => passed == alternatives.len(),
        "anyof" => passed >= 1,
        "noneof" => passed == 0,
        "oneof" => passed == 1,
        _ => true,
    };
    if satisfied {
        return Vec::new();
    }

    let code = match name {
        "allof" => ErrorCode::ALLOF,
        "anyof" => ErrorCode::ANYOF,
        "noneof" => ErrorCode::NONEOF,
        "oneof" => ErrorCode::ONEOF,
        _ => ErrorCode::GROUP,
    };
    let children: Vec<ValidationError> = per_alternative.into_iter().flatten().collect();
    vec![ValidationError::group(path.to_vec(), path.to_vec(), code, name, children)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callables::CallableRegistry;
    use crate::registry::{RuleSetRegistry, SchemaRegistry};
    use crate::types::TypeRegistry;
    use indexmap::IndexMap;

    fn ctx(type_registry: &TypeRegistry, callables: &CallableRegistry, rules: &RuleSetRegistry, schemas: &SchemaRegistry) -> EngineContext<'_> {
        EngineContext {
            type_registry,
            callables,
            rules_set_registry: rules,
            schema_registry: schemas,
            allow_unknown: false,
            require_all: false,
            ignore_none_values: false,
            update: false,
        }
    }

    fn ruleset_value(pairs: Vec<(&str, Value)>) -> Value {
        let mut m = IndexMap::new();
        for (k, v) in pairs {
            m.insert(Value::str(k), v);
        }
        Value::Map(m)
    }

    #[test]
    fn anyof_passes_when_one_alternative_matches() {
        let types = TypeRegistry::with_builtins();
        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&types, &callables, &rules, &schemas);

        let alts = vec![
            ruleset_value(vec![("type", Value::str("string"))]),
            ruleset_value(vec![("type", Value::str("integer"))]),
        ];
        let errors = evaluate("anyof", &alts, &Value::Int(3), &[], &Value::map(), &c);
        assert!(errors.is_empty());
    }

    #[test]
    fn allof_fails_when_one_alternative_mismatches() {
        let types = TypeRegistry::with_builtins();
        let callables = CallableRegistry::new();
        let rules = RuleSetRegistry::new();
        let schemas = SchemaRegistry::new();
        let c = ctx(&types, &callables, &rules, &schemas);

        let alts = vec![
            ruleset_value(vec![("type", Value::str("integer"))]),
            ruleset_value(vec![("min", Value::Int(10))]),
        ];
        let errors = evaluate("allof", &alts, &Value::Int(3), &[], &Value::map(), &c);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::ALLOF);
    }
}
