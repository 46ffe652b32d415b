//! The tagged-union document/constraint representation (component A).
//!
//! Grounded on `contracts::ConfigValueRef`
//! (`agents/config-validation/contracts/mod.rs`), generalized from a
//! config-specific value enum to the full tree-shaped value a general
//! document/schema/constraint model needs: sequences, sets, tuples, dates,
//! and an opaque escape hatch for user-defined types.

use chrono::{DateTime, NaiveDate, Utc};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// A hashable, tree-shaped value: a document, a schema, or a constraint are
/// all instances of this type.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Bytes(Vec<u8>),
    String(String),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Seq(Vec<Value>),
    Map(IndexMap<Value, Value>),
    Set(Vec<Value>),
    FrozenSet(Vec<Value>),
    Tuple(Vec<Value>),
    /// Escape hatch for host-registered extension types. The core never
    /// inspects `payload`; it only ever compares `type_id` and moves the
    /// value around.
    Opaque {
        type_id: String,
        payload: Arc<dyn std::any::Any + Send + Sync>,
    },
}

impl Value {
    /// Field-name convenience constructor.
    pub fn str(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// An empty map, the usual shape of a `Schema` or a `RuleSet`.
    pub fn map() -> Self {
        Value::Map(IndexMap::new())
    }

    pub fn as_map(&self) -> Option<&IndexMap<Value, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut IndexMap<Value, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(s) => Some(s),
            Value::Tuple(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value is a member of one of the "sized" / iterable
    /// abstract types that the `empty` rule governs.
    pub fn is_sized(&self) -> bool {
        matches!(
            self,
            Value::String(_)
                | Value::Bytes(_)
                | Value::Seq(_)
                | Value::Map(_)
                | Value::Set(_)
                | Value::FrozenSet(_)
                | Value::Tuple(_)
        )
    }

    /// Length for sized values; `None` for scalars.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            Value::Seq(s) | Value::Set(s) | Value::FrozenSet(s) | Value::Tuple(s) => Some(s.len()),
            Value::Map(m) => Some(m.len()),
            _ => None,
        }
    }

    pub fn is_empty_sized(&self) -> bool {
        self.len() == Some(0)
    }

    /// Iterate the elements of a sequence/set/tuple/map's values, for rules
    /// (`allowed`, `forbidden`, `contains`) that apply element-wise to
    /// iterables.
    pub fn iter_elements(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        match self {
            Value::Seq(s) | Value::Set(s) | Value::FrozenSet(s) | Value::Tuple(s) => {
                Box::new(s.iter())
            }
            Value::Map(m) => Box::new(m.values()),
            Value::String(_) => Box::new(std::iter::empty()),
            other => Box::new(std::iter::once(other)),
        }
    }

    /// Whether this `Value` variant is usable as a map/set key. Floats,
    /// nested maps, and sets have no well-defined `Eq`/`Hash` in Rust, so
    /// this is a hard boundary rather than "any hashable value".
    pub fn is_hashable_key(&self) -> bool {
        match self {
            Value::Null | Value::Bool(_) | Value::Int(_) | Value::Bytes(_) | Value::String(_) => {
                true
            }
            Value::Date(_) | Value::DateTime(_) => true,
            Value::Seq(items) | Value::Tuple(items) => items.iter().all(Value::is_hashable_key),
            _ => false,
        }
    }

    /// A short, user-facing name for this value's runtime shape, used in
    /// error messages ("expected string, got integer").
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Seq(_) => "list",
            Value::Map(_) => "dict",
            Value::Set(_) => "set",
            Value::FrozenSet(_) => "frozenset",
            Value::Tuple(_) => "tuple",
            Value::Opaque { .. } => "opaque",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) | (Value::FrozenSet(a), Value::FrozenSet(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.contains(x))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
            }
            (Value::Opaque { type_id: a, .. }, Value::Opaque { type_id: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bytes(b) => b.hash(state),
            Value::String(s) => s.hash(state),
            Value::Date(d) => d.hash(state),
            Value::DateTime(d) => d.hash(state),
            Value::Seq(s) | Value::Tuple(s) => s.hash(state),
            Value::Set(_) | Value::FrozenSet(_) | Value::Map(_) => {
                // Not reachable for well-formed keys; see `is_hashable_key`.
            }
            Value::Opaque { type_id, .. } => type_id.hash(state),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bytes(b) => write!(f, "bytes[{}]", b.len()),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::DateTime(d) => write!(f, "{d}"),
            Value::Seq(s) => f.debug_list().entries(s).finish(),
            Value::Map(m) => f.debug_map().entries(m.iter()).finish(),
            Value::Set(s) | Value::FrozenSet(s) => f.debug_set().entries(s).finish(),
            Value::Tuple(t) => f.debug_tuple("").field(t).finish(),
            Value::Opaque { type_id, .. } => write!(f, "<opaque {type_id}>"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            other => write!(f, "{other:?}"),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(a) => Value::Seq(a.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(o) => Value::Map(
                o.into_iter()
                    .map(|(k, v)| (Value::String(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
