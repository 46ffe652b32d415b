//! The public driver (component H): `Validator`, the façade that ties the
//! schema model, registries, meta-validation, normalization, and the
//! validation engine into the single entry point callers use.
//!
//! Grounded on `Validator` in `agents/config-validation/src/validation.rs`
//! (a struct wrapping config + a set of rules, exposing
//! `validate_against_schema`) — generalized from a single fixed method into
//! a builder-configured, stateful driver, in the style of
//! `engine::ValidationEngine`'s own builder methods
//! (`with_fail_fast`-equivalent chaining).

use crate::callables::CallableRegistry;
use crate::engine::{self, EngineContext};
use crate::error::{DefaultErrorHandler, DocumentError, ErrorHandler, ErrorList, ErrorTree, SchemaError};
use crate::meta::{default_meta_schema, MetaSchema};
use crate::normalize::{self, NormalizeConfig, NormalizeContext};
use crate::registry::{default_rules_set_registry, default_schema_registry, RuleSetRegistry, SchemaRegistry};
use crate::schema::Schema;
use crate::types::TypeRegistry;
use crate::value::Value;
use std::sync::Arc;

/// A configured validator bound to one schema. Mutable state
/// (`errors`/`document`) is retained across a `validate` call the way the
/// upstream library's validator instance does, so callers can inspect the
/// outcome without threading results through themselves.
pub struct Validator {
    schema: Schema,
    allow_unknown: bool,
    require_all: bool,
    purge_unknown: bool,
    purge_readonly: bool,
    ignore_none_values: bool,
    error_handler: Arc<dyn ErrorHandler + Send + Sync>,
    rules_set_registry: RuleSetRegistry,
    schema_registry: SchemaRegistry,
    type_registry: TypeRegistry,
    callables: CallableRegistry,
    meta_schema: MetaSchema,
    errors: ErrorList,
    document: Option<Value>,
}

impl Validator {
    /// Build a validator for `schema`, meta-validating it immediately: a
    /// malformed schema fails before any document is ever touched.
    pub fn new(schema: Schema) -> Result<Self, SchemaError> {
        let meta_schema = default_meta_schema();
        meta_schema.validate_schema(&schema)?;
        Ok(Self {
            schema,
            allow_unknown: false,
            require_all: false,
            purge_unknown: false,
            purge_readonly: false,
            ignore_none_values: false,
            error_handler: Arc::new(DefaultErrorHandler::default()),
            rules_set_registry: default_rules_set_registry(),
            schema_registry: default_schema_registry(),
            type_registry: TypeRegistry::with_builtins(),
            callables: CallableRegistry::new(),
            meta_schema,
            errors: ErrorList::new(),
            document: None,
        })
    }

    pub fn with_allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }

    pub fn with_require_all(mut self, require: bool) -> Self {
        self.require_all = require;
        self
    }

    pub fn with_purge_unknown(mut self, purge: bool) -> Self {
        self.purge_unknown = purge;
        self
    }

    pub fn with_purge_readonly(mut self, purge: bool) -> Self {
        self.purge_readonly = purge;
        self
    }

    pub fn with_ignore_none_values(mut self, ignore: bool) -> Self {
        self.ignore_none_values = ignore;
        self
    }

    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler + Send + Sync>) -> Self {
        self.error_handler = handler;
        self
    }

    pub fn with_rules_set_registry(mut self, registry: RuleSetRegistry) -> Self {
        self.rules_set_registry = registry;
        self
    }

    pub fn with_schema_registry(mut self, registry: SchemaRegistry) -> Self {
        self.schema_registry = registry;
        self
    }

    pub fn with_type_registry(mut self, registry: TypeRegistry) -> Self {
        self.type_registry = registry;
        self
    }

    pub fn with_callables(mut self, callables: CallableRegistry) -> Self {
        self.callables = callables;
        self
    }

    pub fn with_rule_constraint(mut self, name: impl Into<String>, shape: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Self {
        self.meta_schema.register_rule_constraint(name, shape);
        self
    }

    fn engine_context(&self, update: bool) -> EngineContext<'_> {
        EngineContext {
            type_registry: &self.type_registry,
            callables: &self.callables,
            rules_set_registry: &self.rules_set_registry,
            schema_registry: &self.schema_registry,
            allow_unknown: self.allow_unknown,
            require_all: self.require_all,
            ignore_none_values: self.ignore_none_values,
            update,
        }
    }

    fn normalize_context(&self) -> NormalizeContext<'_> {
        NormalizeContext {
            config: NormalizeConfig { purge_unknown: self.purge_unknown, purge_readonly: self.purge_readonly },
            rules_set_registry: &self.rules_set_registry,
            schema_registry: &self.schema_registry,
            callables: &self.callables,
        }
    }

    /// Validate `document` as given, with no normalization. Returns whether
    /// it is valid; call `errors()` for the detail. `update` suppresses
    /// `required` errors for fields missing from `document`, for
    /// partial (PATCH-style) updates against a schema written for a full
    /// document.
    #[tracing::instrument(skip(self, document))]
    pub fn validate(&mut self, document: Value, update: bool) -> Result<bool, DocumentError> {
        let Value::Map(_) = &document else {
            return Err(DocumentError::NotAMapping(document.kind_name()));
        };
        let ctx = self.engine_context(update);
        let errors = engine::validate_document(&document, &self.schema, &ctx);
        tracing::debug!(error_count = errors.len(), "document validated");
        self.errors = ErrorList::new();
        self.errors.extend(errors);
        self.document = Some(document);
        Ok(self.errors.is_empty())
    }

    /// Run the normalization pipeline only; does not validate and does not
    /// update `errors()`/`document()`.
    pub fn normalized(&self, document: Value) -> (Value, ErrorList) {
        let ctx = self.normalize_context();
        normalize::normalize_document(document, &self.schema, &ctx)
    }

    /// Normalize, then validate. Returns the normalized document when it is
    /// valid, `None` otherwise (normalization errors and validation errors
    /// are both folded into `errors()`). See [`Validator::validate`] for
    /// `update`.
    pub fn validated(&mut self, document: Value, update: bool) -> Result<Option<Value>, DocumentError> {
        let (normalized, normalize_errors) = self.normalized(document);
        let Value::Map(_) = &normalized else {
            return Err(DocumentError::NotAMapping(normalized.kind_name()));
        };
        let ctx = self.engine_context(update);
        let validation_errors = engine::validate_document(&normalized, &self.schema, &ctx);

        self.errors = normalize_errors;
        self.errors.extend(validation_errors);
        self.document = Some(normalized.clone());

        if self.errors.is_empty() {
            Ok(Some(normalized))
        } else {
            Ok(None)
        }
    }

    pub fn errors(&self) -> &ErrorList {
        &self.errors
    }

    pub fn document(&self) -> Option<&Value> {
        self.document.as_ref()
    }

    pub fn document_error_tree(&self) -> ErrorTree {
        self.errors.document_error_tree()
    }

    pub fn schema_error_tree(&self) -> ErrorTree {
        self.errors.schema_error_tree()
    }

    /// Render `errors()` through the configured `ErrorHandler`.
    pub fn rendered_errors(&self) -> Value {
        self.error_handler.handle(&self.errors)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}
