//! Runtime value representation

pub mod error;

pub use error::{ValueError, ValueResult};

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Nesting limit when rendering values, keeps cyclic object graphs printable
const DISPLAY_DEPTH: usize = 3;

/// Runtime value types
#[derive(Clone, Default)]
pub enum Value {
    /// Null value
    #[default]
    Null,

    /// Boolean value
    Boolean(bool),

    /// Integer value
    Integer(i64),

    /// Floating point value
    Float(f64),

    /// String value
    String(String),

    /// List of values
    List(Vec<Value>),

    /// Ordered map with string keys
    Map(IndexMap<String, Value>),

    /// Live reference to a mutable object
    Object(ObjectRef),
}

/// A named bag of fields with a type name
#[derive(Debug, Clone, Default)]
pub struct Object {
    /// Type name used in diagnostics
    pub type_name: String,
    /// Field values, in declaration order
    pub fields: IndexMap<String, Value>,
}

/// Shared handle to an [`Object`].
///
/// Cloning the handle never copies the object: every clone observes the
/// same state, so an "old" value holding an `ObjectRef` sees later mutation.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Object>>);

impl ObjectRef {
    /// Create an empty object of the given type
    pub fn new(type_name: impl Into<String>) -> Self {
        Self(Arc::new(RwLock::new(Object {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        })))
    }

    /// Create an object from an existing field map
    pub fn from_fields(type_name: impl Into<String>, fields: IndexMap<String, Value>) -> Self {
        Self(Arc::new(RwLock::new(Object {
            type_name: type_name.into(),
            fields,
        })))
    }

    /// Add a field (builder pattern)
    pub fn with_field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Read a field
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.read().fields.get(name).cloned()
    }

    /// Write a field, inserting it when absent
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.write().fields.insert(name.into(), value.into());
    }

    /// Whether the object has a field with this name
    pub fn has_field(&self, name: &str) -> bool {
        self.0.read().fields.contains_key(name)
    }

    /// The object's type name
    pub fn type_name(&self) -> String {
        self.0.read().type_name.clone()
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> Vec<String> {
        self.0.read().fields.keys().cloned().collect()
    }

    /// Copy of the current state. Field values are cloned shallowly.
    pub fn snapshot(&self) -> Object {
        self.0.read().clone()
    }

    /// Whether two handles point at the same object
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.read();
        f.debug_struct("ObjectRef")
            .field("type_name", &inner.type_name)
            .field("fields", &inner.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Value {
    /// Type checking predicates
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Type conversion helpers
    pub fn as_boolean(&self) -> ValueResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => Err(ValueError::TypeError {
                expected: "boolean",
                actual: self.type_name(),
            }),
        }
    }

    pub fn as_integer(&self) -> ValueResult<i64> {
        match self {
            Value::Integer(n) => Ok(*n),
            _ => Err(ValueError::TypeError {
                expected: "integer",
                actual: self.type_name(),
            }),
        }
    }

    pub fn as_number(&self) -> ValueResult<f64> {
        match self {
            Value::Integer(n) => Ok(*n as f64),
            Value::Float(f) => Ok(*f),
            _ => Err(ValueError::TypeError {
                expected: "number",
                actual: self.type_name(),
            }),
        }
    }

    pub fn as_string(&self) -> ValueResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(ValueError::TypeError {
                expected: "string",
                actual: self.type_name(),
            }),
        }
    }

    pub fn as_list(&self) -> ValueResult<&[Value]> {
        match self {
            Value::List(items) => Ok(items),
            _ => Err(ValueError::TypeError {
                expected: "list",
                actual: self.type_name(),
            }),
        }
    }

    pub fn as_object(&self) -> ValueResult<&ObjectRef> {
        match self {
            Value::Object(obj) => Ok(obj),
            _ => Err(ValueError::TypeError {
                expected: "object",
                actual: self.type_name(),
            }),
        }
    }

    /// Get type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Read a named property from an object or map.
    ///
    /// Lists expose `length`; everything else has no properties.
    pub fn property(&self, name: &str) -> ValueResult<Value> {
        let missing = |owner: String| ValueError::KeyNotFound {
            key: name.to_string(),
            owner,
        };
        match self {
            Value::Object(obj) => obj.get(name).ok_or_else(|| missing(obj.type_name())),
            Value::Map(map) => map.get(name).cloned().ok_or_else(|| missing("map".to_string())),
            Value::List(items) if name == "length" => Ok(Value::Integer(items.len() as i64)),
            Value::Null => Err(ValueError::InvalidOperation(format!(
                "cannot read property '{}' of null",
                name
            ))),
            other => Err(missing(other.type_name().to_string())),
        }
    }

    /// Index into a list (integer) or map/object (string key)
    pub fn index(&self, key: &Value) -> ValueResult<Value> {
        match (self, key) {
            (Value::List(items), Value::Integer(i)) => {
                let length = items.len();
                usize::try_from(*i)
                    .ok()
                    .and_then(|idx| items.get(idx))
                    .cloned()
                    .ok_or(ValueError::IndexOutOfBounds { index: *i, length })
            }
            (Value::String(s), Value::Integer(i)) => {
                let length = s.chars().count();
                usize::try_from(*i)
                    .ok()
                    .and_then(|idx| s.chars().nth(idx))
                    .map(|c| Value::String(c.to_string()))
                    .ok_or(ValueError::IndexOutOfBounds { index: *i, length })
            }
            (Value::Map(_) | Value::Object(_), Value::String(name)) => self.property(name),
            (target, key) => Err(ValueError::InvalidOperation(format!(
                "cannot index {} with {}",
                target.type_name(),
                key.type_name()
            ))),
        }
    }

    /// Equality used by contract expressions: numbers compare across
    /// integer/float, objects compare by identity, the rest structurally.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                (*a as f64) == *b
            }
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map(|w| v.loose_eq(w)).unwrap_or(false))
            }
            _ => self == other,
        }
    }

    /// Convert from a JSON document
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to a JSON document. Objects become JSON objects of their
    /// current field values; nesting below the display depth is elided.
    pub fn to_json(&self) -> serde_json::Value {
        self.to_json_depth(0)
    }

    fn to_json_depth(&self, depth: usize) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(
                items.iter().map(|v| v.to_json_depth(depth + 1)).collect(),
            ),
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_depth(depth + 1)))
                    .collect(),
            ),
            Value::Object(obj) if depth >= DISPLAY_DEPTH => {
                serde_json::Value::String(format!("{}{{..}}", obj.type_name()))
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.snapshot()
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json_depth(depth + 1)))
                    .collect(),
            ),
        }
    }

    fn fmt_depth(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    item.fmt_depth(f, depth + 1)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: ", k)?;
                    v.fmt_depth(f, depth + 1)?;
                }
                write!(f, "}}")
            }
            Value::Object(obj) => {
                let snapshot = obj.snapshot();
                if depth >= DISPLAY_DEPTH {
                    return write!(f, "{}{{..}}", snapshot.type_name);
                }
                write!(f, "{}{{", snapshot.type_name)?;
                for (i, (k, v)) in snapshot.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}=", k)?;
                    v.fmt_depth(f, depth + 1)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::Integer(i) => write!(f, "Integer({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Object(obj) => f.debug_tuple("Object").field(obj).finish(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_depth(f, 0)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
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

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
