//! Conversion derivation: per field, how to expand (generic map → typed
//! structure) and how to flatten (typed structure → generic map).
//!
//! Rules are derived once per `TypeNode` and shared by `Arc`, mirroring the
//! walker. They are consumed by the Rust emitter and by the interpreter in
//! [`interp`], which applies them to [`crate::value::TypedValue`]s.
pub mod interp;
pub mod runtime;

use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{CompileError, Result};
use crate::manifest::{ScalarType, TypeId};
use crate::walker::{Element, FieldNode, FieldShape, TypeNode};

pub use interp::FlattenError;
pub use runtime::ExpandError;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConversion {
    pub type_id: TypeId,
    pub fields: Vec<FieldConversion>,
    /// Declared fields no rule touches (excluded by directive).
    pub omitted: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldConversion {
    pub declared_name: String,
    pub external_name: String,
    pub expand: ExpandRule,
    pub flatten: FlattenRule,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConvElement {
    Scalar(ScalarType),
    Block(Arc<ResolvedConversion>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExpandRule {
    /// Read the key; no value gives the zero value.
    ScalarOrZero(ScalarType),
    /// Read the key; no value gives an absent pointer.
    ScalarOrNone(ScalarType),
    /// Zero-or-one element list; empty gives the nested zero value.
    SingleBlockOrZero(Arc<ResolvedConversion>),
    /// Zero-or-one element list; empty gives an absent pointer.
    SingleBlockOrNone(Arc<ResolvedConversion>),
    EachElement(ConvElement),
    EachValue(ConvElement),
    /// Computed-only: never read, always the zero value of the wrapped rule.
    NotAccepted(Box<ExpandRule>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlattenRule {
    Scalar(ScalarType),
    /// Absent pointer is written as `Null`.
    DerefScalar(ScalarType),
    /// Written as a one-element list.
    SingleBlock(Arc<ResolvedConversion>),
    /// Absent pointer is written as an empty list.
    OptionalBlock(Arc<ResolvedConversion>),
    EachElement(ConvElement),
    EachValue(ConvElement),
}

/// Derives and caches one `ResolvedConversion` per type identity.
#[derive(Debug, Default)]
pub struct ConversionDeriver {
    cache: IndexMap<TypeId, Arc<ResolvedConversion>>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl ConversionDeriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn derive(&mut self, node: &TypeNode) -> Result<Arc<ResolvedConversion>> {
        if let Some(done) = self.cache.get(&node.id) {
            return Ok(Arc::clone(done));
        }
        let mut fields = Vec::with_capacity(node.fields.len());
        for field in &node.fields {
            fields.push(self.derive_field(node, field)?);
        }
        let conversion = Arc::new(ResolvedConversion {
            type_id: node.id.clone(),
            fields,
            omitted: node.excluded.clone(),
        });
        self.cache.insert(node.id.clone(), Arc::clone(&conversion));
        Ok(conversion)
    }

    /// Every conversion derived so far, children before parents.
    pub fn into_conversions(self) -> Vec<Arc<ResolvedConversion>> {
        self.cache.into_values().collect()
    }

    fn derive_field(&mut self, node: &TypeNode, field: &FieldNode) -> Result<FieldConversion> {
        let path = format!("{}.{}", node.id, field.declared_name);
        check_invariants(&path, field)?;

        let (expand, flatten) = match &field.shape {
            FieldShape::Scalar(t) => (ExpandRule::ScalarOrZero(t.clone()), FlattenRule::Scalar(t.clone())),
            FieldShape::Pointer(t) => (ExpandRule::ScalarOrNone(t.clone()), FlattenRule::DerefScalar(t.clone())),
            FieldShape::Struct(nested) => {
                let c = self.derive(nested)?;
                (ExpandRule::SingleBlockOrZero(Arc::clone(&c)), FlattenRule::SingleBlock(c))
            }
            FieldShape::PointerStruct(nested) => {
                let c = self.derive(nested)?;
                (ExpandRule::SingleBlockOrNone(Arc::clone(&c)), FlattenRule::OptionalBlock(c))
            }
            FieldShape::List(e) => {
                let e = self.element(e)?;
                (ExpandRule::EachElement(e.clone()), FlattenRule::EachElement(e))
            }
            FieldShape::Map(e) => {
                let e = self.element(e)?;
                (ExpandRule::EachValue(e.clone()), FlattenRule::EachValue(e))
            }
        };
        let expand = if field.effects.computed_only {
            ExpandRule::NotAccepted(Box::new(expand))
        } else {
            expand
        };

        Ok(FieldConversion {
            declared_name: field.declared_name.clone(),
            external_name: field.external_name.clone(),
            expand,
            flatten,
        })
    }

    fn element(&mut self, e: &Element) -> Result<ConvElement> {
        Ok(match e {
            Element::Scalar(t) => ConvElement::Scalar(t.clone()),
            Element::Struct(nested) => ConvElement::Block(self.derive(nested)?),
        })
    }
}

/// Shape/directive combinations whose round trip cannot hold.
fn check_invariants(path: &str, field: &FieldNode) -> Result<()> {
    if field.effects.nullable && !field.shape.is_pointer() {
        let zero = match field.shape {
            FieldShape::List(_) | FieldShape::Map(_) => "an empty collection",
            _ => "the zero value",
        };
        return Err(CompileError::invariant(
            path,
            format!("nullable field has a non-pointer shape, an explicit null would flatten back as {zero}"),
        ));
    }
    if field.effects.computed_only {
        if let Some(nested) = field.shape.nested() {
            if let Some(req) = nested.fields.iter().find(|f| f.effects.required) {
                return Err(CompileError::invariant(
                    path,
                    format!(
                        "computed-only block nests required field `{}` of `{}`, expand could never supply it",
                        req.declared_name, nested.id
                    ),
                ));
            }
        }
    }
    Ok(())
}

impl ExpandRule {
    pub fn reads_input(&self) -> bool {
        !matches!(self, ExpandRule::NotAccepted(_))
    }
}

impl ResolvedConversion {
    pub fn field(&self, declared: &str) -> Option<&FieldConversion> {
        self.fields.iter().find(|f| f.declared_name == declared)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{DirectiveTable, computed_only, nullable, required};
    use crate::manifest::{Manifest, Shape, TypeDef};
    use crate::walker::Walker;

    fn node(m: &Manifest, entries: Vec<(&str, Vec<crate::directive::Directive>)>, root: &str) -> Result<Arc<TypeNode>> {
        let tables: IndexMap<TypeId, DirectiveTable> = entries
            .into_iter()
            .map(|(id, d)| {
                let id = TypeId::from(id);
                let t = DirectiveTable::resolve(m.get(&id).unwrap(), &d).unwrap();
                (id, t)
            })
            .collect();
        Walker::new(m, &tables).walk(&root.into())
    }

    fn manifest() -> Manifest {
        Manifest::from_types([
            TypeDef::new("kops", "HTTPProxy")
                .field("Host", Shape::string())
                .field("Port", Shape::pointer(Shape::int())),
            TypeDef::new("kops", "Spec")
                .field("Egress", Shape::structure("kops.HTTPProxy"))
                .field("Status", Shape::pointer(Shape::structure("kops.HTTPProxy")))
                .field("Revision", Shape::int())
                .field("Anonymous", Shape::bool())
                .field("Zones", Shape::list(Shape::string()))
                .field("Labels", Shape::map(Shape::string())),
        ])
        .unwrap()
    }

    #[test]
    fn rules_follow_shapes() {
        let m = manifest();
        let n = node(&m, vec![("kops.Spec", vec![computed_only(["Revision"])])], "kops.Spec").unwrap();
        let c = ConversionDeriver::new().derive(&n).unwrap();
        assert!(matches!(c.field("Egress").unwrap().expand, ExpandRule::SingleBlockOrZero(_)));
        assert!(matches!(c.field("Status").unwrap().flatten, FlattenRule::OptionalBlock(_)));
        let rev = c.field("Revision").unwrap();
        assert!(!rev.expand.reads_input());
        assert!(matches!(rev.flatten, FlattenRule::Scalar(_)));
    }

    #[test]
    fn shared_children_share_conversions() {
        let m = manifest();
        let n = node(&m, vec![], "kops.Spec").unwrap();
        let c = ConversionDeriver::new().derive(&n).unwrap();
        let (ExpandRule::SingleBlockOrZero(a), ExpandRule::SingleBlockOrNone(b)) =
            (&c.fields[0].expand, &c.fields[1].expand)
        else {
            panic!("unexpected rules");
        };
        assert!(Arc::ptr_eq(a, b));
    }

    #[test]
    fn nullable_needs_a_pointer_shape() {
        let m = manifest();
        let n = node(&m, vec![("kops.Spec", vec![nullable(["Anonymous"])])], "kops.Spec").unwrap();
        let err = ConversionDeriver::new().derive(&n).unwrap_err();
        assert!(matches!(err, CompileError::ConversionInvariant { ref path, .. } if path == "kops.Spec.Anonymous"));
    }

    #[test]
    fn nullable_collections_are_rejected() {
        let m = manifest();
        for field in ["Zones", "Labels"] {
            let n = node(&m, vec![("kops.Spec", vec![nullable([field])])], "kops.Spec").unwrap();
            let err = ConversionDeriver::new().derive(&n).unwrap_err();
            let expected = format!("kops.Spec.{field}");
            assert!(matches!(err, CompileError::ConversionInvariant { ref path, .. } if *path == expected), "{err:?}");
        }
        let n = node(&m, vec![("kops.HTTPProxy", vec![nullable(["Port"])])], "kops.HTTPProxy").unwrap();
        assert!(ConversionDeriver::new().derive(&n).is_ok());
    }

    #[test]
    fn computed_only_block_cannot_nest_required_fields() {
        let m = manifest();
        let n = node(
            &m,
            vec![("kops.Spec", vec![computed_only(["Egress"])]), ("kops.HTTPProxy", vec![required(["Host"])])],
            "kops.Spec",
        )
        .unwrap();
        let err = ConversionDeriver::new().derive(&n).unwrap_err();
        assert!(matches!(err, CompileError::ConversionInvariant { .. }));
    }
}
