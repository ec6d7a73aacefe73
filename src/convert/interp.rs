//! Applies derived conversion rules to values directly.
//!
//! Generated code and this interpreter share the helpers in
//! [`super::runtime`], so checking a rule here checks what is emitted.
use std::collections::BTreeMap;

use thiserror::Error;

use super::runtime::{self, ExpandError};
use super::{ConvElement, ExpandRule, FieldConversion, FlattenRule, ResolvedConversion};
use crate::manifest::{ScalarType, TypeId};
use crate::value::{Block, Scalar, TypedStruct, TypedValue, Value};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlattenError {
    #[error("field `{field}` does not hold {expected}")]
    ShapeMismatch { field: String, expected: &'static str },

    #[error("expected a `{expected}` value, found `{found}`")]
    WrongType { expected: TypeId, found: TypeId },

    #[error("`{type_id}` has no field `{field}`")]
    UnknownField { type_id: TypeId, field: String },
}

impl ResolvedConversion {
    /// Generic map → typed structure. Every non-excluded field is set.
    pub fn expand(&self, input: &Value) -> Result<TypedStruct, ExpandError> {
        let block = runtime::expect_block(self.type_id.as_str(), input)?;
        let mut out = TypedStruct::new(self.type_id.clone());
        for field in &self.fields {
            let value = expand_rule(&field.external_name, &field.expand, block.get(&field.external_name))?;
            out.fields.insert(field.declared_name.clone(), value);
        }
        Ok(out)
    }

    /// Typed structure → generic map, keyed by external names.
    pub fn flatten(&self, input: &TypedStruct) -> Result<Value, FlattenError> {
        if input.type_id != self.type_id {
            return Err(FlattenError::WrongType { expected: self.type_id.clone(), found: input.type_id.clone() });
        }
        if let Some(stray) = input
            .fields
            .keys()
            .find(|k| self.field(k.as_str()).is_none() && !self.omitted.contains(*k))
        {
            return Err(FlattenError::UnknownField { type_id: self.type_id.clone(), field: stray.clone() });
        }

        let mut out = Block::default();
        for field in &self.fields {
            let value = match input.get(&field.declared_name) {
                Some(v) => flatten_rule(&field.external_name, &field.flatten, v)?,
                None => flatten_rule(&field.external_name, &field.flatten, &field.zero())?,
            };
            out.insert(field.external_name.clone(), value);
        }
        Ok(Value::Block(out))
    }

    /// The value expand yields for an empty map.
    pub fn zero(&self) -> TypedStruct {
        let mut out = TypedStruct::new(self.type_id.clone());
        for field in &self.fields {
            out.fields.insert(field.declared_name.clone(), field.zero());
        }
        out
    }
}

impl FieldConversion {
    pub fn zero(&self) -> TypedValue {
        zero_of(&self.expand)
    }
}

fn zero_of(rule: &ExpandRule) -> TypedValue {
    match rule {
        ExpandRule::ScalarOrZero(t) => TypedValue::Scalar(Scalar::zero(t.kind)),
        ExpandRule::ScalarOrNone(_) | ExpandRule::SingleBlockOrNone(_) => TypedValue::Pointer(None),
        ExpandRule::SingleBlockOrZero(c) => TypedValue::Struct(c.zero()),
        ExpandRule::EachElement(_) => TypedValue::List(Vec::new()),
        ExpandRule::EachValue(_) => TypedValue::Map(BTreeMap::new()),
        ExpandRule::NotAccepted(inner) => zero_of(inner),
    }
}

fn expand_rule(field: &str, rule: &ExpandRule, v: Option<&Value>) -> Result<TypedValue, ExpandError> {
    Ok(match rule {
        ExpandRule::ScalarOrZero(t) => {
            TypedValue::Scalar(runtime::read_scalar(field, t.kind, v)?.unwrap_or_else(|| Scalar::zero(t.kind)))
        }
        ExpandRule::ScalarOrNone(t) => {
            TypedValue::Pointer(runtime::read_scalar(field, t.kind, v)?.map(|s| Box::new(TypedValue::Scalar(s))))
        }
        ExpandRule::SingleBlockOrZero(c) => {
            TypedValue::Struct(runtime::expand_block(field, v, |b| c.expand(b))?.unwrap_or_else(|| c.zero()))
        }
        ExpandRule::SingleBlockOrNone(c) => {
            let nested = runtime::expand_block(field, v, |b| c.expand(b))?;
            TypedValue::Pointer(nested.map(|s| Box::new(TypedValue::Struct(s))))
        }
        ExpandRule::EachElement(e) => {
            TypedValue::List(runtime::expand_list(field, v, |x| expand_element(field, e, x))?)
        }
        ExpandRule::EachValue(e) => TypedValue::Map(runtime::expand_map(field, v, |x| expand_element(field, e, x))?),
        ExpandRule::NotAccepted(inner) => zero_of(inner),
    })
}

fn expand_element(field: &str, e: &ConvElement, v: &Value) -> Result<TypedValue, ExpandError> {
    match e {
        ConvElement::Scalar(t) => Ok(TypedValue::Scalar(runtime::read_scalar_element(field, t.kind, v)?)),
        ConvElement::Block(c) => Ok(TypedValue::Struct(c.expand(v)?)),
    }
}

fn mismatch(field: &str, expected: &'static str) -> FlattenError {
    FlattenError::ShapeMismatch { field: field.to_string(), expected }
}

fn flatten_scalar(field: &str, t: &ScalarType, s: &Scalar) -> Result<Value, FlattenError> {
    if s.kind() != t.kind {
        return Err(mismatch(field, "a scalar of the declared kind"));
    }
    Ok(runtime::flatten_scalar(s.clone()))
}

fn flatten_rule(field: &str, rule: &FlattenRule, v: &TypedValue) -> Result<Value, FlattenError> {
    match (rule, v) {
        (FlattenRule::Scalar(t), TypedValue::Scalar(s)) => flatten_scalar(field, t, s),
        (FlattenRule::DerefScalar(_), TypedValue::Pointer(None)) => Ok(Value::Null),
        (FlattenRule::DerefScalar(t), TypedValue::Pointer(Some(inner))) => match inner.as_ref() {
            TypedValue::Scalar(s) => flatten_scalar(field, t, s),
            _ => Err(mismatch(field, "a pointer to a scalar")),
        },
        (FlattenRule::SingleBlock(c), TypedValue::Struct(s)) => Ok(Value::List(vec![c.flatten(s)?])),
        (FlattenRule::OptionalBlock(_), TypedValue::Pointer(None)) => Ok(Value::List(Vec::new())),
        (FlattenRule::OptionalBlock(c), TypedValue::Pointer(Some(inner))) => match inner.as_ref() {
            TypedValue::Struct(s) => Ok(Value::List(vec![c.flatten(s)?])),
            _ => Err(mismatch(field, "a pointer to a structure")),
        },
        (FlattenRule::EachElement(e), TypedValue::List(items)) => items
            .iter()
            .map(|item| flatten_element(field, e, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        (FlattenRule::EachValue(e), TypedValue::Map(entries)) => entries
            .iter()
            .map(|(k, item)| Ok((k.clone(), flatten_element(field, e, item)?)))
            .collect::<Result<Block, _>>()
            .map(Value::Block),
        (FlattenRule::Scalar(_), _) => Err(mismatch(field, "a scalar")),
        (FlattenRule::DerefScalar(_), _) | (FlattenRule::OptionalBlock(_), _) => Err(mismatch(field, "a pointer")),
        (FlattenRule::SingleBlock(_), _) => Err(mismatch(field, "a structure")),
        (FlattenRule::EachElement(_), _) => Err(mismatch(field, "a list")),
        (FlattenRule::EachValue(_), _) => Err(mismatch(field, "a map")),
    }
}

fn flatten_element(field: &str, e: &ConvElement, v: &TypedValue) -> Result<Value, FlattenError> {
    match (e, v) {
        (ConvElement::Scalar(t), TypedValue::Scalar(s)) => flatten_scalar(field, t, s),
        (ConvElement::Block(c), TypedValue::Struct(s)) => c.flatten(s),
        (ConvElement::Scalar(_), _) => Err(mismatch(field, "scalar elements")),
        (ConvElement::Block(_), _) => Err(mismatch(field, "structure elements")),
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
