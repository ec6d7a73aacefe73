//! Expand/flatten helpers called by generated conversion code and by the
//! in-crate interpreter, so both follow exactly the same rules.
//!
//! "No value" is an absent key, an explicit `Null`, or an empty list; all
//! three expand the same way.
use ordered_float::OrderedFloat;
use thiserror::Error;

use crate::manifest::ScalarKind;
use crate::value::{Block, Scalar, Value};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    #[error("expand {type_name} failure, input is {found} instead of a block")]
    NilInput { type_name: String, found: &'static str },

    /// A single nested block arrived as a list with more than one element.
    #[error("field `{field}` holds {count} blocks but accepts at most one")]
    TooManyBlocks { field: String, count: usize },

    #[error("field `{field}`: expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: &'static str,
    },
}

pub trait FromScalar: Sized {
    const KIND: ScalarKind;
    fn from_scalar(s: Scalar) -> Option<Self>;
}

pub trait IntoScalar {
    fn into_scalar(self) -> Scalar;
}

// ------------------------------ Scalars ---------------------------------- //

impl FromScalar for String {
    const KIND: ScalarKind = ScalarKind::String;
    fn from_scalar(s: Scalar) -> Option<Self> {
        match s {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromScalar for i64 {
    const KIND: ScalarKind = ScalarKind::Int;
    fn from_scalar(s: Scalar) -> Option<Self> {
        match s {
            Scalar::Int(i) => Some(i),
            _ => None,
        }
    }
}

impl FromScalar for bool {
    const KIND: ScalarKind = ScalarKind::Bool;
    fn from_scalar(s: Scalar) -> Option<Self> {
        match s {
            Scalar::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FromScalar for f64 {
    const KIND: ScalarKind = ScalarKind::Float;
    fn from_scalar(s: Scalar) -> Option<Self> {
        match s {
            Scalar::Float(f) => Some(f.0),
            _ => None,
        }
    }
}

impl IntoScalar for String {
    fn into_scalar(self) -> Scalar {
        Scalar::String(self)
    }
}

impl IntoScalar for &str {
    fn into_scalar(self) -> Scalar {
        Scalar::String(self.to_string())
    }
}

impl IntoScalar for i64 {
    fn into_scalar(self) -> Scalar {
        Scalar::Int(self)
    }
}

impl IntoScalar for bool {
    fn into_scalar(self) -> Scalar {
        Scalar::Bool(self)
    }
}

impl IntoScalar for f64 {
    fn into_scalar(self) -> Scalar {
        Scalar::Float(OrderedFloat(self))
    }
}

impl IntoScalar for Scalar {
    fn into_scalar(self) -> Scalar {
        self
    }
}

fn present(v: Option<&Value>) -> Option<&Value> {
    match v {
        None | Some(Value::Null) => None,
        Some(Value::List(items)) if items.is_empty() => None,
        Some(v) => Some(v),
    }
}

fn mismatch(field: &str, expected: impl Into<String>, found: &Value) -> ExpandError {
    ExpandError::TypeMismatch {
        field: field.to_string(),
        expected: expected.into(),
        found: found.describe(),
    }
}

/// Read a scalar of `kind`; `None` when there is no value. Ints widen to floats.
pub fn read_scalar(field: &str, kind: ScalarKind, v: Option<&Value>) -> Result<Option<Scalar>, ExpandError> {
    let Some(v) = present(v) else {
        return Ok(None);
    };
    match v {
        Value::Scalar(Scalar::Int(i)) if kind == ScalarKind::Float => Ok(Some(Scalar::Float(OrderedFloat(*i as f64)))),
        Value::Scalar(s) if s.kind() == kind => Ok(Some(s.clone())),
        other => Err(mismatch(field, kind.to_string(), other)),
    }
}

/// A scalar list element or map value; those cannot be absent.
pub fn read_scalar_element(field: &str, kind: ScalarKind, v: &Value) -> Result<Scalar, ExpandError> {
    match v {
        Value::Null => Err(mismatch(field, format!("{kind} element"), v)),
        _ => read_scalar(field, kind, Some(v))?.ok_or_else(|| mismatch(field, format!("{kind} element"), v)),
    }
}

pub fn expand_scalar<T: FromScalar + Default>(field: &str, v: Option<&Value>) -> Result<T, ExpandError> {
    Ok(expand_optional_scalar(field, v)?.unwrap_or_default())
}

pub fn expand_optional_scalar<T: FromScalar>(field: &str, v: Option<&Value>) -> Result<Option<T>, ExpandError> {
    Ok(read_scalar(field, T::KIND, v)?.and_then(T::from_scalar))
}

pub fn scalar_element<T: FromScalar>(field: &str, v: &Value) -> Result<T, ExpandError> {
    let s = read_scalar_element(field, T::KIND, v)?;
    T::from_scalar(s).ok_or_else(|| mismatch(field, T::KIND.to_string(), v))
}

// ------------------------------ Blocks ----------------------------------- //

pub fn expect_block<'v>(type_name: &str, v: &'v Value) -> Result<&'v Block, ExpandError> {
    match v {
        Value::Block(b) => Ok(b),
        other => Err(ExpandError::NilInput {
            type_name: type_name.to_string(),
            found: other.describe(),
        }),
    }
}

/// A single nested block, encoded as a list of zero or one element.
pub fn expand_block<T>(
    field: &str,
    v: Option<&Value>,
    expand: impl FnOnce(&Value) -> Result<T, ExpandError>,
) -> Result<Option<T>, ExpandError> {
    let Some(v) = present(v) else {
        return Ok(None);
    };
    match v {
        Value::List(items) => match items.as_slice() {
            [Value::Null] => Ok(None),
            [one] => expand(one).map(Some),
            _ => Err(ExpandError::TooManyBlocks {
                field: field.to_string(),
                count: items.len(),
            }),
        },
        other => Err(mismatch(field, "a list of at most one block", other)),
    }
}

pub fn expand_list<T>(
    field: &str,
    v: Option<&Value>,
    expand: impl FnMut(&Value) -> Result<T, ExpandError>,
) -> Result<Vec<T>, ExpandError> {
    let Some(v) = present(v) else {
        return Ok(Vec::new());
    };
    match v {
        Value::List(items) => items.iter().map(expand).collect(),
        other => Err(mismatch(field, "a list", other)),
    }
}

pub fn expand_map<T, C>(
    field: &str,
    v: Option<&Value>,
    mut expand: impl FnMut(&Value) -> Result<T, ExpandError>,
) -> Result<C, ExpandError>
where
    C: FromIterator<(String, T)> + Default,
{
    let Some(v) = present(v) else {
        return Ok(C::default());
    };
    match v {
        Value::Block(entries) => entries.iter().map(|(k, item)| Ok((k.clone(), expand(item)?))).collect(),
        other => Err(mismatch(field, "a map", other)),
    }
}

// ------------------------------ Flatten ---------------------------------- //

pub fn flatten_scalar<T: IntoScalar>(v: T) -> Value {
    Value::Scalar(v.into_scalar())
}

pub fn flatten_optional_scalar<T: IntoScalar>(v: Option<T>) -> Value {
    v.map_or(Value::Null, flatten_scalar)
}

pub fn flatten_block<T>(v: &T, flatten: impl FnOnce(&T) -> Value) -> Value {
    Value::List(vec![flatten(v)])
}

pub fn flatten_optional_block<T>(v: Option<&T>, flatten: impl FnOnce(&T) -> Value) -> Value {
    Value::List(v.map(flatten).into_iter().collect())
}

pub fn flatten_list<T>(items: &[T], flatten: impl FnMut(&T) -> Value) -> Value {
    Value::List(items.iter().map(flatten).collect())
}

pub fn flatten_map<'a, T: 'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a T)>,
    mut flatten: impl FnMut(&T) -> Value,
) -> Value {
    Value::Block(entries.into_iter().map(|(k, v)| (k.clone(), flatten(v))).collect())
}
