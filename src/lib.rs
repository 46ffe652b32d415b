//! A schema-driven validation and normalization engine for tree-shaped
//! documents: a single schema walks a document and a normalization pass in
//! lock-step, accumulating structured errors instead of raising on the
//! first mismatch.
//!
//! The pieces: [`value`] is the tagged-union document/constraint
//! representation; [`types`] is the registry of named type predicates;
//! [`schema`] is the `Schema`/`RuleSet` model plus alias and typesaver
//! expansion; [`registry`] holds named, reusable schemas and rule-sets;
//! [`meta`] meta-validates a schema before it is ever run against a
//! document; [`normalize`] is the rename/purge/default/coerce pipeline;
//! [`engine`] is the recursive validation interpreter; [`validator`] is the
//! public façade tying all of the above together.

pub mod callables;
pub mod engine;
pub mod error;
pub mod meta;
pub mod normalize;
pub mod registry;
pub mod schema;
pub mod types;
pub mod validator;
pub mod value;

pub use callables::CallableRegistry;
pub use error::{DefaultErrorHandler, DocumentError, ErrorCode, ErrorHandler, ErrorList, ErrorTree, SchemaError, ValidationError};
pub use meta::MetaSchema;
pub use registry::{RuleSetRegistry, SchemaRegistry};
pub use schema::{RuleSet, Schema};
pub use types::TypeRegistry;
pub use validator::Validator;
pub use value::Value;
