//! End-to-end scenarios against the public `Validator` façade.

use cerberus::{CallableRegistry, ErrorCode, Schema, Validator, Value};
use indexmap::IndexMap;

fn ruleset(pairs: Vec<(&str, Value)>) -> Value {
    let mut m = IndexMap::new();
    for (k, v) in pairs {
        m.insert(Value::str(k), v);
    }
    Value::Map(m)
}

fn schema(fields: Vec<(&str, Value)>) -> Schema {
    let mut m = IndexMap::new();
    for (name, rules) in fields {
        m.insert(Value::str(name), rules);
    }
    Schema(m)
}

fn doc(pairs: Vec<(&str, Value)>) -> Value {
    let mut m = IndexMap::new();
    for (k, v) in pairs {
        m.insert(Value::str(k), v);
    }
    Value::Map(m)
}

#[test]
fn scenario_1_simple_string_field_is_valid() {
    let schema = schema(vec![("name", ruleset(vec![("type", Value::str("string"))]))]);
    let mut validator = Validator::new(schema).unwrap();

    let document = doc(vec![("name", Value::str("john doe"))]);
    assert!(validator.validate(document, false).unwrap());
    assert!(validator.errors().is_empty());
}

#[test]
fn scenario_2_type_and_min_violations_are_both_reported() {
    let schema = schema(vec![
        ("name", ruleset(vec![("type", Value::str("string"))])),
        ("age", ruleset(vec![("type", Value::str("integer")), ("min", Value::Int(10))])),
    ]);
    let mut validator = Validator::new(schema).unwrap();

    let document = doc(vec![("name", Value::Int(1337)), ("age", Value::Int(5))]);
    let valid = validator.validate(document, false).unwrap();
    assert!(!valid);

    let tree = validator.document_error_tree();
    let name_errors = &tree.get(&[Value::str("name")]).unwrap().errors;
    assert_eq!(name_errors.len(), 1);
    assert_eq!(name_errors[0].code, ErrorCode::BAD_TYPE);

    let age_errors = &tree.get(&[Value::str("age")]).unwrap().errors;
    assert_eq!(age_errors.len(), 1);
    assert_eq!(age_errors[0].code, ErrorCode::MIN_VALUE);
}

#[test]
fn scenario_3_coerce_string_to_integer() {
    let schema = schema(vec![("amount", ruleset(vec![("type", Value::str("integer")), ("coerce", Value::str("int"))]))]);

    let mut callables = CallableRegistry::new();
    callables.register_coercer("int", |v| match v {
        Value::String(s) => s.parse::<i64>().map(Value::Int).unwrap_or_else(|_| v.clone()),
        other => other.clone(),
    });

    let mut validator = Validator::new(schema).unwrap().with_callables(callables);

    let document = doc(vec![("amount", Value::str("1"))]);
    let normalized = validator.validated(document, false).unwrap().expect("should validate after coercion");
    assert_eq!(normalized.as_map().unwrap().get(&Value::str("amount")), Some(&Value::Int(1)));
}

#[test]
fn scenario_4_missing_field_gets_its_default() {
    let schema = schema(vec![
        ("amount", ruleset(vec![("type", Value::str("integer"))])),
        ("kind", ruleset(vec![("type", Value::str("string")), ("default", Value::str("purchase"))])),
    ]);
    let mut validator = Validator::new(schema).unwrap();

    let document = doc(vec![("amount", Value::Int(1))]);
    let normalized = validator.validated(document, false).unwrap().expect("should validate with default filled in");
    let map = normalized.as_map().unwrap();
    assert_eq!(map.get(&Value::str("amount")), Some(&Value::Int(1)));
    assert_eq!(map.get(&Value::str("kind")), Some(&Value::str("purchase")));
}

#[test]
fn scenario_5_anyof_reports_both_child_failures() {
    let schema = schema(vec![(
        "prop1",
        ruleset(vec![
            ("type", Value::str("number")),
            (
                "anyof",
                Value::Seq(vec![
                    ruleset(vec![("min", Value::Int(0)), ("max", Value::Int(10))]),
                    ruleset(vec![("min", Value::Int(100)), ("max", Value::Int(110))]),
                ]),
            ),
        ]),
    )]);
    let mut validator = Validator::new(schema).unwrap();

    let document = doc(vec![("prop1", Value::Int(55))]);
    assert!(!validator.validate(document, false).unwrap());

    let errors = validator.errors().iter().collect::<Vec<_>>();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code, ErrorCode::ANYOF);
    assert_eq!(errors[0].children().count(), 2);
}

#[test]
fn scenario_6_unmet_dependency_value_is_reported() {
    let schema = schema(vec![
        ("field1", ruleset(vec![("required", Value::Bool(false))])),
        (
            "field2",
            ruleset(vec![
                ("required", Value::Bool(true)),
                (
                    "dependencies",
                    ruleset(vec![("field1", Value::Seq(vec![Value::str("one"), Value::str("two")]))]),
                ),
            ]),
        ),
    ]);
    let mut validator = Validator::new(schema).unwrap();

    let document = doc(vec![("field2", Value::Int(7))]);
    assert!(!validator.validate(document, false).unwrap());

    let tree = validator.document_error_tree();
    let field2_errors = &tree.get(&[Value::str("field2")]).unwrap().errors;
    assert_eq!(field2_errors.len(), 1);
    assert_eq!(field2_errors[0].code, ErrorCode::DEPENDENCIES_FIELD);
}
