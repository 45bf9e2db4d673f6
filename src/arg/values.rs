use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::module::ModuleClass;

/// The type an option's values are converted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueKind {
    Bool,
    Int,
    Str,
    Path,
    /// A module reference that must extend one of the listed classes.
    Module(Vec<ModuleClass>),
}

impl ValueKind {
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueKind::Bool, Value::Bool(_))
            | (ValueKind::Int, Value::Int(_))
            | (ValueKind::Str, Value::Str(_))
            | (ValueKind::Path, Value::Path(_)) => true,
            (ValueKind::Module(bases), Value::Module(class)) => {
                bases.iter().any(|base| class.is_subclass_of(base))
            }
            _ => false,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Int => write!(f, "int"),
            ValueKind::Str => write!(f, "str"),
            ValueKind::Path => write!(f, "path"),
            ValueKind::Module(bases) => {
                write!(f, "module(")?;
                fmt_seq(f, bases)?;
                write!(f, ")")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    Path(PathBuf),
    Module(ModuleClass),
    List(Vec<Value>),
}

fn fmt_seq<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    let mut first = true;
    for item in items {
        if !first {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
        first = false;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(x) => write!(f, "{x}"),
            Value::Int(x) => write!(f, "{x}"),
            Value::Str(x) => write!(f, "\"{x}\""),
            Value::Path(x) => write!(f, "{}", x.display()),
            Value::Module(x) => write!(f, "{x}"),
            Value::List(xs) => {
                write!(f, "[")?;
                fmt_seq(f, xs)?;
                write!(f, "]")
            }
        }
    }
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Value::Path(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_module(&self) -> Option<&ModuleClass> {
        match self {
            Value::Module(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_list(&self) -> &[Value] {
        match self {
            Value::List(xs) => xs,
            _ => &[],
        }
    }

    /// Convert a JSON scalar into a value of `kind`. Module kinds are not
    /// expressible as JSON defaults.
    pub fn from_json(kind: &ValueKind, json: &serde_json::Value) -> Option<Value> {
        match (kind, json) {
            (_, serde_json::Value::Null) => Some(Value::None),
            (ValueKind::Bool, serde_json::Value::Bool(b)) => Some(Value::Bool(*b)),
            (ValueKind::Int, serde_json::Value::Number(n)) => n.as_i64().map(Value::Int),
            (ValueKind::Str, serde_json::Value::String(s)) => Some(Value::Str(s.clone())),
            (ValueKind::Path, serde_json::Value::String(s)) => Some(Value::Path(PathBuf::from(s))),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<PathBuf> for Value {
    fn from(value: PathBuf) -> Self {
        Value::Path(value)
    }
}

impl From<ModuleClass> for Value {
    fn from(value: ModuleClass) -> Self {
        Value::Module(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::None => serializer.serialize_none(),
            Value::Bool(x) => serializer.serialize_bool(*x),
            Value::Int(x) => serializer.serialize_i64(*x),
            Value::Str(x) => serializer.serialize_str(x),
            Value::Path(x) => serializer.serialize_str(&x.to_string_lossy()),
            Value::Module(x) => serializer.serialize_str(&x.qualified_name()),
            Value::List(xs) => {
                let mut seq = serializer.serialize_seq(Some(xs.len()))?;
                for x in xs {
                    seq.serialize_element(x)?;
                }
                seq.end()
            }
        }
    }
}

/// Parsed option values keyed by destination name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Namespace {
    values: BTreeMap<String, Value>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dest: &str) -> Option<&Value> {
        self.values.get(dest)
    }

    pub fn set(&mut self, dest: impl Into<String>, value: Value) {
        self.values.insert(dest.into(), value);
    }

    pub fn contains(&self, dest: &str) -> bool {
        self.values.contains_key(dest)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn int(&self, dest: &str) -> Option<i64> {
        self.get(dest).and_then(Value::as_int)
    }

    pub fn str(&self, dest: &str) -> Option<&str> {
        self.get(dest).and_then(Value::as_str)
    }

    /// `true` only for a stored `Bool(true)`.
    pub fn flag(&self, dest: &str) -> bool {
        self.get(dest).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn path(&self, dest: &str) -> Option<&Path> {
        self.get(dest).and_then(Value::as_path)
    }

    pub fn module(&self, dest: &str) -> Option<&ModuleClass> {
        self.get(dest).and_then(Value::as_module)
    }

    pub fn list(&self, dest: &str) -> &[Value] {
        self.get(dest).map(Value::as_list).unwrap_or(&[])
    }

    /// Module classes stored under an append-style module option.
    pub fn modules(&self, dest: &str) -> Vec<ModuleClass> {
        self.list(dest)
            .iter()
            .filter_map(Value::as_module)
            .cloned()
            .collect()
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (k, v) in &self.values {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
