//! Type graph walk: manifest types + directive tables → resolved `TypeNode`s.
//!
//! One `TypeNode` is built per distinct type identity and shared through
//! `Arc` by every parent that nests it. Directive lookups are keyed by type
//! identity, so two parents must see the very same node.
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::directive::{DirectiveTable, DocWrapper, FieldEffects};
use crate::error::{CompileError, ConfigurationIssue, Result};
use crate::manifest::{Manifest, ScalarType, Shape, TypeDef, TypeId};
use crate::naming;

#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    pub id: TypeId,
    pub description: Option<String>,
    /// Minimum type-model revision (the type's schema version).
    pub version: u32,
    pub no_schema: bool,
    pub doc: Option<DocWrapper>,
    /// Whether the type carries its own directive table in this run.
    pub registered: bool,
    /// Declaration order, excluded fields removed.
    pub fields: Vec<FieldNode>,
    /// Declared names of the excluded fields.
    pub excluded: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    pub declared_name: String,
    pub external_name: String,
    pub shape: FieldShape,
    pub effects: FieldEffects,
    pub version: u32,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    Scalar(ScalarType),
    Pointer(ScalarType),
    Struct(Arc<TypeNode>),
    PointerStruct(Arc<TypeNode>),
    List(Element),
    Map(Element),
}

/// Element of a list or map.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Scalar(ScalarType),
    Struct(Arc<TypeNode>),
}

/// Every node built in a run, children before parents.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    nodes: IndexMap<TypeId, Arc<TypeNode>>,
}

pub struct Walker<'a> {
    manifest: &'a Manifest,
    tables: &'a IndexMap<TypeId, DirectiveTable>,
    nodes: IndexMap<TypeId, Arc<TypeNode>>,
    stack: Vec<TypeId>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl FieldShape {
    /// The nested type, for block-shaped fields.
    pub fn nested(&self) -> Option<&Arc<TypeNode>> {
        match self {
            FieldShape::Struct(n) | FieldShape::PointerStruct(n) => Some(n),
            FieldShape::List(Element::Struct(n)) | FieldShape::Map(Element::Struct(n)) => Some(n),
            _ => None,
        }
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, FieldShape::Pointer(_) | FieldShape::PointerStruct(_))
    }
}

impl TypeNode {
    pub fn field(&self, declared: &str) -> Option<&FieldNode> {
        self.fields.iter().find(|f| f.declared_name == declared)
    }
}

impl TypeGraph {
    pub fn get(&self, id: &TypeId) -> Option<&Arc<TypeNode>> {
        self.nodes.get(id)
    }
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<TypeNode>> {
        self.nodes.values()
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<'a> Walker<'a> {
    pub fn new(manifest: &'a Manifest, tables: &'a IndexMap<TypeId, DirectiveTable>) -> Self {
        Self {
            manifest,
            tables,
            nodes: IndexMap::new(),
            stack: Vec::new(),
        }
    }

    /// Build (or reuse) the node for `id` and everything it nests.
    pub fn walk(&mut self, id: &TypeId) -> Result<Arc<TypeNode>> {
        if let Some(node) = self.nodes.get(id) {
            return Ok(Arc::clone(node));
        }
        if let Some(pos) = self.stack.iter().position(|t| t == id) {
            let cycle = self.stack[pos..]
                .iter()
                .chain(std::iter::once(id))
                .map(TypeId::as_str)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(CompileError::unsupported(id.as_str(), format!("type nests itself ({cycle})")));
        }

        let manifest = self.manifest;
        let tables = self.tables;
        let def = manifest
            .get(id)
            .ok_or_else(|| CompileError::unsupported(id.as_str(), "type has no definition in the manifest"))?;
        let registered = tables.contains_key(id);
        let table = tables
            .get(id)
            .map(Cow::Borrowed)
            .unwrap_or_else(|| Cow::Owned(DirectiveTable::default()));

        self.stack.push(id.clone());
        let built = self.build(def, &table, registered);
        self.stack.pop();

        let node = Arc::new(built?);
        debug!(type_id = %id, fields = node.fields.len(), registered, "walked type");
        self.nodes.insert(id.clone(), Arc::clone(&node));
        Ok(node)
    }

    pub fn into_graph(self) -> TypeGraph {
        TypeGraph { nodes: self.nodes }
    }

    fn build(&mut self, def: &TypeDef, table: &DirectiveTable, registered: bool) -> Result<TypeNode> {
        let id = def.id();
        let mut fields = Vec::with_capacity(def.fields.len());
        let mut taken: HashMap<String, String> = HashMap::new();
        let mut excluded = Vec::new();

        for field in &def.fields {
            let effects = table.field(&field.name).cloned().unwrap_or_default();
            if effects.excluded {
                excluded.push(field.name.clone());
                continue;
            }

            let external_name = naming::external_name(effects.rename.as_deref().unwrap_or(&field.name));
            if !naming::is_valid_external_name(&external_name) {
                return Err(CompileError::config(
                    &id,
                    ConfigurationIssue::InvalidExternalName { name: external_name, field: field.name.clone() },
                ));
            }
            if let Some(first) = taken.insert(external_name.clone(), field.name.clone()) {
                return Err(CompileError::config(
                    &id,
                    ConfigurationIssue::DuplicateExternalName {
                        name: external_name,
                        first,
                        second: field.name.clone(),
                    },
                ));
            }

            let path = format!("{id}.{}", field.name);
            let shape = self.classify(&path, &field.shape)?;
            let version = [Some(table.version), field.since, effects.version]
                .into_iter()
                .flatten()
                .max()
                .unwrap_or(0);

            fields.push(FieldNode {
                declared_name: field.name.clone(),
                external_name,
                shape,
                effects,
                version,
                description: field.doc.clone(),
            });
        }

        Ok(TypeNode {
            id,
            description: def.doc.clone(),
            version: table.version,
            no_schema: table.no_schema,
            doc: table.doc.clone(),
            registered,
            fields,
            excluded,
        })
    }

    fn classify(&mut self, path: &str, shape: &Shape) -> Result<FieldShape> {
        Ok(match shape {
            Shape::Scalar(s) => FieldShape::Scalar(s.clone()),
            Shape::Struct(id) => FieldShape::Struct(self.walk(id)?),
            Shape::Pointer(inner) => match inner.as_ref() {
                Shape::Scalar(s) => FieldShape::Pointer(s.clone()),
                Shape::Struct(id) => FieldShape::PointerStruct(self.walk(id)?),
                Shape::Pointer(_) => return Err(CompileError::unsupported(path, "pointer to pointer")),
                Shape::List(_) | Shape::Map(_) => {
                    return Err(CompileError::unsupported(path, "pointer to a collection"));
                }
            },
            Shape::List(inner) => FieldShape::List(self.element(path, inner)?),
            Shape::Map(inner) => FieldShape::Map(self.element(path, inner)?),
        })
    }

    fn element(&mut self, path: &str, shape: &Shape) -> Result<Element> {
        match shape {
            Shape::Scalar(s) => Ok(Element::Scalar(s.clone())),
            Shape::Struct(id) => Ok(Element::Struct(self.walk(id)?)),
            Shape::Pointer(_) => Err(CompileError::unsupported(path, "collection of pointers")),
            Shape::List(_) | Shape::Map(_) => Err(CompileError::unsupported(path, "nested collection")),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
