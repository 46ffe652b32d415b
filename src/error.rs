//! Error model (component C): structured document errors, error lists and
//! tree projections, and the two exception-class failure types.
//!
//! Grounded on `agents/config-validation/src/error.rs` for the exception
//! shape (`thiserror`, `is_user_error`-style classification) and on
//! `agents/config-validation/src/engine/rules/mod.rs::ValidationFinding`
//! for the accumulated-finding shape, generalized to a full structured
//! error carrying document_path/schema_path/code/rule/constraint/value/info.

use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use thiserror::Error;

/// A 16-bit error code. Bits 6-8 are reserved:
/// `0x60` normalization, `0x80` group (has children), `0x90` combinator.
/// Codes `0x100` and above are reserved for user-defined errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    pub const DOCUMENT_MISSING: ErrorCode = ErrorCode(0x01);
    pub const REQUIRED_FIELD: ErrorCode = ErrorCode(0x02);
    pub const UNKNOWN_FIELD: ErrorCode = ErrorCode(0x03);
    pub const NOT_NULLABLE: ErrorCode = ErrorCode(0x04);
    pub const BAD_TYPE: ErrorCode = ErrorCode(0x05);
    pub const EMPTY_NOT_ALLOWED: ErrorCode = ErrorCode(0x06);
    pub const MIN_VALUE: ErrorCode = ErrorCode(0x07);
    pub const MAX_VALUE: ErrorCode = ErrorCode(0x08);
    pub const MIN_LENGTH: ErrorCode = ErrorCode(0x09);
    pub const MAX_LENGTH: ErrorCode = ErrorCode(0x0A);
    pub const UNALLOWED_VALUE: ErrorCode = ErrorCode(0x0B);
    pub const UNALLOWED_VALUES: ErrorCode = ErrorCode(0x0C);
    pub const FORBIDDEN_VALUE: ErrorCode = ErrorCode(0x0D);
    pub const FORBIDDEN_VALUES: ErrorCode = ErrorCode(0x0E);
    pub const MISSING_MEMBER: ErrorCode = ErrorCode(0x0F);
    pub const REGEX_MISMATCH: ErrorCode = ErrorCode(0x10);
    pub const BAD_ITEMS: ErrorCode = ErrorCode(0x11);
    pub const MAPPING_SCHEMA: ErrorCode = ErrorCode(0x12);
    pub const SEQUENCE_SCHEMA: ErrorCode = ErrorCode(0x13);
    pub const KEYS_SCHEMA: ErrorCode = ErrorCode(0x14);
    pub const VALUES_SCHEMA: ErrorCode = ErrorCode(0x15);
    pub const DEPENDENCIES_FIELD: ErrorCode = ErrorCode(0x16);
    pub const DEPENDENCIES_FIELD_VALUE: ErrorCode = ErrorCode(0x17);
    pub const EXCLUDES_FIELD: ErrorCode = ErrorCode(0x18);
    pub const CUSTOM: ErrorCode = ErrorCode(0x19);
    pub const READONLY_FIELD: ErrorCode = ErrorCode(0x1A);

    /// `0x60` — set on errors raised during normalization.
    pub const RENAME_COLLISION: ErrorCode = ErrorCode(0x60 | 0x01);
    pub const COERCION_FAILED: ErrorCode = ErrorCode(0x60 | 0x02);
    pub const RENAMING_FAILED: ErrorCode = ErrorCode(0x60 | 0x03);
    pub const SETTING_DEFAULT_FAILED: ErrorCode = ErrorCode(0x60 | 0x04);

    /// `0x90` — combinator group errors (allof/anyof/oneof/noneof).
    pub const ALLOF: ErrorCode = ErrorCode(0x90 | 0x01);
    pub const ANYOF: ErrorCode = ErrorCode(0x90 | 0x02);
    pub const NONEOF: ErrorCode = ErrorCode(0x90 | 0x03);
    pub const ONEOF: ErrorCode = ErrorCode(0x90 | 0x04);

    /// `0x80` — generic group error wrapping child-validator errors.
    pub const GROUP: ErrorCode = ErrorCode(0x80);

    pub fn is_group(self) -> bool {
        self.0 & 0x80 != 0
    }

    pub fn is_normalization(self) -> bool {
        self.0 & 0x60 == 0x60 && self.0 & 0x80 == 0
    }

    pub fn is_combinator(self) -> bool {
        self.0 & 0x90 == 0x90
    }
}

/// A single structured validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path of keys/indices from the document root to the offending value.
    pub document_path: Vec<Value>,
    /// Path of keys from the schema root to the rule that failed.
    pub schema_path: Vec<Value>,
    pub code: ErrorCode,
    pub rule: String,
    pub constraint: Option<Value>,
    pub value: Value,
    /// Auxiliary data; for group errors this holds the children.
    pub info: Vec<ErrorInfo>,
}

/// Auxiliary payload carried by an error's `info` tuple: either free text
/// or, for group errors, a nested child error list.
#[derive(Debug, Clone)]
pub enum ErrorInfo {
    Text(String),
    Children(Vec<ValidationError>),
}

impl ValidationError {
    pub fn new(
        document_path: Vec<Value>,
        schema_path: Vec<Value>,
        code: ErrorCode,
        rule: impl Into<String>,
        constraint: Option<Value>,
        value: Value,
    ) -> Self {
        Self {
            document_path,
            schema_path,
            code,
            rule: rule.into(),
            constraint,
            value,
            info: Vec::new(),
        }
    }

    pub fn with_info(mut self, info: ErrorInfo) -> Self {
        self.info.push(info);
        self
    }

    /// Group constructor for \*of-combinators and child-validator wrapping.
    pub fn group(
        document_path: Vec<Value>,
        schema_path: Vec<Value>,
        code: ErrorCode,
        rule: impl Into<String>,
        children: Vec<ValidationError>,
    ) -> Self {
        Self {
            document_path,
            schema_path,
            code,
            rule: rule.into(),
            constraint: None,
            value: Value::Null,
            info: vec![ErrorInfo::Children(children)],
        }
    }

    pub fn children(&self) -> impl Iterator<Item = &ValidationError> {
        self.info.iter().filter_map(|i| match i {
            ErrorInfo::Children(c) => Some(c.iter()),
            _ => None,
        }).flatten()
    }

    fn path_string(path: &[Value]) -> String {
        path.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(".")
    }

    pub fn document_path_string(&self) -> String {
        Self::path_string(&self.document_path)
    }
}

/// The flat, insertion-ordered collection of errors accumulated by one
/// `Validator` invocation.
#[derive(Debug, Clone, Default)]
pub struct ErrorList {
    errors: Vec<ValidationError>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    pub fn into_vec(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Hierarchical projection indexed by document path.
    pub fn document_error_tree(&self) -> ErrorTree {
        let mut tree = ErrorTree::default();
        for err in &self.errors {
            tree.insert(&err.document_path, err.clone());
        }
        tree
    }

    /// Hierarchical projection indexed by schema path.
    pub fn schema_error_tree(&self) -> ErrorTree {
        let mut tree = ErrorTree::default();
        for err in &self.errors {
            tree.insert(&err.schema_path, err.clone());
        }
        tree
    }
}

/// A path-indexed tree of errors, used for both the document and the
/// schema projections.
#[derive(Debug, Clone, Default)]
pub struct ErrorTree {
    pub errors: Vec<ValidationError>,
    pub children: IndexMap<Value, ErrorTree>,
}

impl ErrorTree {
    fn insert(&mut self, path: &[Value], error: ValidationError) {
        match path.split_first() {
            None => self.errors.push(error),
            Some((head, rest)) => {
                self.children.entry(head.clone()).or_default().insert(rest, error);
            }
        }
    }

    pub fn get(&self, path: &[Value]) -> Option<&ErrorTree> {
        match path.split_first() {
            None => Some(self),
            Some((head, rest)) => self.children.get(head).and_then(|c| c.get(rest)),
        }
    }
}

/// Converts a flat error list into an output representation. The default
/// handler produces a nested mapping:
/// `field -> [message, ..., {nested_field -> [...]}]`.
pub trait ErrorHandler {
    fn handle(&self, errors: &ErrorList) -> Value;
}

/// Template table keyed by error code, used by `DefaultErrorHandler` to
/// render human-readable messages.
pub fn default_message_templates() -> HashMap<u16, &'static str> {
    use ErrorCode as C;
    HashMap::from([
        (C::DOCUMENT_MISSING.0, "document is missing"),
        (C::REQUIRED_FIELD.0, "required field"),
        (C::UNKNOWN_FIELD.0, "unknown field"),
        (C::NOT_NULLABLE.0, "null value not allowed"),
        (C::BAD_TYPE.0, "must be of {constraint} type"),
        (C::EMPTY_NOT_ALLOWED.0, "empty values not allowed"),
        (C::MIN_VALUE.0, "min value is {constraint}"),
        (C::MAX_VALUE.0, "max value is {constraint}"),
        (C::MIN_LENGTH.0, "min length is {constraint}"),
        (C::MAX_LENGTH.0, "max length is {constraint}"),
        (C::UNALLOWED_VALUE.0, "unallowed value {value}"),
        (C::UNALLOWED_VALUES.0, "unallowed values {value}"),
        (C::FORBIDDEN_VALUE.0, "unallowed value {value}"),
        (C::FORBIDDEN_VALUES.0, "unallowed values {value}"),
        (C::MISSING_MEMBER.0, "missing members {constraint}"),
        (C::REGEX_MISMATCH.0, "value does not match regex {constraint}"),
        (C::BAD_ITEMS.0, "length of list should be {constraint}, it is {value}"),
        (C::MAPPING_SCHEMA.0, "mapping doesn't validate subschema"),
        (C::SEQUENCE_SCHEMA.0, "one or more sequence-items failed to validate"),
        (C::KEYS_SCHEMA.0, "one or more keys of a mapping failed to validate"),
        (C::VALUES_SCHEMA.0, "one or more values in a mapping failed to validate"),
        (C::DEPENDENCIES_FIELD.0, "field is required"),
        (C::DEPENDENCIES_FIELD_VALUE.0, "field value did not satisfy dependency"),
        (C::EXCLUDES_FIELD.0, "{value} must not be present with {constraint}"),
        (C::CUSTOM.0, "{info}"),
        (C::READONLY_FIELD.0, "field is read-only"),
        (C::RENAME_COLLISION.0, "field rename collides with an existing field"),
        (C::COERCION_FAILED.0, "field was unable to be coerced"),
        (C::RENAMING_FAILED.0, "field was unable to be renamed"),
        (C::SETTING_DEFAULT_FAILED.0, "default value was unable to be set"),
        (C::ALLOF.0, "one or more definitions validate"),
        (C::ANYOF.0, "no definitions validate"),
        (C::NONEOF.0, "one or more definitions validate"),
        (C::ONEOF.0, "more than one rule validate"),
    ])
}

/// The default error handler: renders errors as a nested mapping.
pub struct DefaultErrorHandler {
    templates: HashMap<u16, &'static str>,
}

impl Default for DefaultErrorHandler {
    fn default() -> Self {
        Self { templates: default_message_templates() }
    }
}

impl DefaultErrorHandler {
    fn render(&self, err: &ValidationError) -> String {
        let template = self.templates.get(&err.code.0).copied().unwrap_or("validation error");
        let mut message = template.to_string();
        if let Some(constraint) = &err.constraint {
            message = message.replace("{constraint}", &constraint.to_string());
        }
        message = message.replace("{value}", &err.value.to_string());
        let info_text = err
            .info
            .iter()
            .filter_map(|i| match i {
                ErrorInfo::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("; ");
        message.replace("{info}", &info_text)
    }
}

impl ErrorHandler for DefaultErrorHandler {
    fn handle(&self, errors: &ErrorList) -> Value {
        let tree = errors.document_error_tree();
        self.render_tree(&tree)
    }
}

impl DefaultErrorHandler {
    fn render_tree(&self, tree: &ErrorTree) -> Value {
        let mut out = IndexMap::new();
        for (key, child) in &tree.children {
            let mut entries: Vec<Value> =
                child.errors.iter().map(|e| Value::String(self.render(e))).collect();
            if !child.children.is_empty() {
                entries.push(self.render_tree(child));
            }
            out.insert(key.clone(), Value::Seq(entries));
        }
        Value::Map(out)
    }
}

/// Schema-class failure: the schema itself is malformed. Raised *before*
/// any document traversal.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema failed meta-validation: {0}")]
    NotMetaValid(String),
    #[error("unresolved registry reference: {0}")]
    UnresolvedReference(String),
    #[error("cyclic registry reference: {0}")]
    CyclicReference(String),
    #[error("invalid type name: {0}")]
    InvalidTypeName(String),
    #[error("invalid rule: {0}")]
    InvalidRule(String),
}

/// Document-class failure raised before traversal: a non-mapping top-level
/// document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("top-level document must be a mapping, got {0}")]
    NotAMapping(&'static str),
}
