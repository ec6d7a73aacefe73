//! Generic key/value representation and the typed stand-in it converts to.
//!
//! `Value` is what the schema runtime hands over: blocks keyed by external
//! names, single nested blocks as lists of zero or one element. `TypedValue`
//! mirrors a typed model value (keyed by declared names, pointers explicit)
//! so the conversion rules can be exercised without the model itself.
use std::collections::BTreeMap;

use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::manifest::{ScalarKind, TypeId};

pub type Block = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    String(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Scalar(Scalar),
    List(Vec<Value>),
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Scalar(Scalar),
    Pointer(Option<Box<TypedValue>>),
    Struct(TypedStruct),
    List(Vec<TypedValue>),
    Map(BTreeMap<String, TypedValue>),
}

/// A typed structure value. A declared field missing from `fields` holds its zero value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedStruct {
    pub type_id: TypeId,
    pub fields: IndexMap<String, TypedValue>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Scalar {
    pub fn zero(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::String => Scalar::String(String::new()),
            ScalarKind::Int => Scalar::Int(0),
            ScalarKind::Bool => Scalar::Bool(false),
            ScalarKind::Float => Scalar::Float(OrderedFloat(0.0)),
        }
    }

    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::String(_) => ScalarKind::String,
        }
    }
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::String(s.into()))
    }
    pub fn int(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }
    pub fn bool(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
    pub fn float(f: f64) -> Self {
        Value::Scalar(Scalar::Float(OrderedFloat(f)))
    }

    /// Convert from JSON; numbers without a fraction become `Int`.
    pub fn from_json(json: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(json)
    }

    pub fn as_block(&self) -> Option<&Block> {
        match self {
            Value::Block(b) => Some(b),
            _ => None,
        }
    }

    /// Short description of the variant, for error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Scalar(Scalar::Bool(_)) => "a bool",
            Value::Scalar(Scalar::Int(_)) => "an int",
            Value::Scalar(Scalar::Float(_)) => "a float",
            Value::Scalar(Scalar::String(_)) => "a string",
            Value::List(_) => "a list",
            Value::Block(_) => "a block",
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl TypedValue {
    pub fn string(s: impl Into<String>) -> Self {
        TypedValue::Scalar(Scalar::String(s.into()))
    }
    pub fn int(i: i64) -> Self {
        TypedValue::Scalar(Scalar::Int(i))
    }
    pub fn some(v: TypedValue) -> Self {
        TypedValue::Pointer(Some(Box::new(v)))
    }
    pub fn none() -> Self {
        TypedValue::Pointer(None)
    }
}

impl TypedStruct {
    pub fn new(type_id: impl Into<TypeId>) -> Self {
        Self { type_id: type_id.into(), fields: IndexMap::new() }
    }
    pub fn with(mut self, declared: &str, value: TypedValue) -> Self {
        self.fields.insert(declared.to_string(), value);
        self
    }
    pub fn get(&self, declared: &str) -> Option<&TypedValue> {
        self.fields.get(declared)
    }
}
