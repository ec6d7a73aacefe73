//! Schema derivation: one element per resolved field, nested blocks embed
//! the nested type's own schema.
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::manifest::{ScalarKind, ScalarType, TypeId};
use crate::value::Scalar;
use crate::walker::{Element, FieldNode, FieldShape, TypeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Optionality {
    Required,
    Optional,
    /// Set by the provider only; never written by the user.
    Computed,
    /// Optional, and computed when left unset.
    OptionalComputed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ElementKind {
    Scalar {
        kind: ScalarKind,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        one_of: Vec<String>,
    },
    List {
        elem: ScalarKind,
    },
    Map {
        elem: ScalarKind,
    },
    /// A single nested block, encoded as a list of at most `max_items`.
    Block {
        max_items: u32,
        schema: Arc<ResolvedSchema>,
    },
    BlockList {
        schema: Arc<ResolvedSchema>,
    },
    BlockMap {
        schema: Arc<ResolvedSchema>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaElement {
    pub name: String,
    #[serde(flatten)]
    pub kind: ElementKind,
    pub optionality: Optionality,
    #[serde(skip_serializing_if = "is_false")]
    pub nullable: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Scalar>,
    /// Minimum type-model revision carrying this field.
    #[serde(skip_serializing_if = "is_zero")]
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedSchema {
    pub type_id: TypeId,
    pub version: u32,
    pub elements: Vec<SchemaElement>,
}

/// Derives schemas for one group; `read_only` is the data-source flavor.
#[derive(Debug, Default)]
pub struct SchemaDeriver {
    read_only: bool,
    cache: IndexMap<TypeId, Arc<ResolvedSchema>>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaDeriver {
    pub fn new(read_only: bool) -> Self {
        Self { read_only, cache: IndexMap::new() }
    }

    /// Schema of a root type; `None` when the type opts out of its own schema.
    pub fn derive_root(&mut self, node: &TypeNode) -> Option<Arc<ResolvedSchema>> {
        (!node.no_schema).then(|| self.derive(node))
    }

    /// Schema of any type, root or nested.
    pub fn derive(&mut self, node: &TypeNode) -> Arc<ResolvedSchema> {
        if let Some(done) = self.cache.get(&node.id) {
            return Arc::clone(done);
        }
        let elements = node.fields.iter().map(|f| self.element(f)).collect();
        let schema = Arc::new(ResolvedSchema { type_id: node.id.clone(), version: node.version, elements });
        self.cache.insert(node.id.clone(), Arc::clone(&schema));
        schema
    }

    fn element(&mut self, field: &FieldNode) -> SchemaElement {
        let optionality = self.optionality(field);
        let pointer = field.shape.is_pointer();
        let nullable = optionality == Optionality::Optional && (field.effects.nullable || pointer);
        let kind = match &field.shape {
            FieldShape::Scalar(t) | FieldShape::Pointer(t) => scalar_kind(t),
            FieldShape::Struct(n) | FieldShape::PointerStruct(n) => {
                ElementKind::Block { max_items: 1, schema: self.derive(n) }
            }
            FieldShape::List(Element::Scalar(t)) => ElementKind::List { elem: t.kind },
            FieldShape::Map(Element::Scalar(t)) => ElementKind::Map { elem: t.kind },
            FieldShape::List(Element::Struct(n)) => ElementKind::BlockList { schema: self.derive(n) },
            FieldShape::Map(Element::Struct(n)) => ElementKind::BlockMap { schema: self.derive(n) },
        };
        let default = match &field.shape {
            FieldShape::Scalar(t) if optionality == Optionality::Optional && !nullable => Some(Scalar::zero(t.kind)),
            _ => None,
        };

        SchemaElement {
            name: field.external_name.clone(),
            kind,
            optionality,
            nullable,
            sensitive: field.effects.sensitive,
            force_new: field.effects.force_new,
            default,
            version: field.version,
            description: field.description.clone(),
        }
    }

    fn optionality(&self, field: &FieldNode) -> Optionality {
        let e = &field.effects;
        if e.computed_only {
            Optionality::Computed
        } else if e.required {
            Optionality::Required
        } else if self.read_only {
            Optionality::Computed
        } else if e.computed {
            Optionality::OptionalComputed
        } else {
            Optionality::Optional
        }
    }
}

fn scalar_kind(t: &ScalarType) -> ElementKind {
    ElementKind::Scalar { kind: t.kind, one_of: t.values.clone() }
}

impl ElementKind {
    /// Short label used by the docs, e.g. `string`, `list(string)`, `block`.
    pub fn label(&self) -> String {
        match self {
            ElementKind::Scalar { kind, .. } => kind.to_string(),
            ElementKind::List { elem } => format!("list({elem})"),
            ElementKind::Map { elem } => format!("map({elem})"),
            ElementKind::Block { .. } => "block".to_string(),
            ElementKind::BlockList { .. } => "list(block)".to_string(),
            ElementKind::BlockMap { .. } => "map(block)".to_string(),
        }
    }

    pub fn nested(&self) -> Option<&Arc<ResolvedSchema>> {
        match self {
            ElementKind::Block { schema, .. }
            | ElementKind::BlockList { schema }
            | ElementKind::BlockMap { schema } => Some(schema),
            _ => None,
        }
    }
}

impl ResolvedSchema {
    pub fn element(&self, name: &str) -> Option<&SchemaElement> {
        self.elements.iter().find(|e| e.name == name)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
