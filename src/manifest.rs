//! Language-neutral description of the type model being compiled.
//!
//! The manifest is produced once by an extraction step outside this crate
//! and enumerates every structure type with its fields and their shapes.
//! Nothing here looks at live types; the compiler works purely on this data.
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Qualified type identity, `<package>.<name>` (e.g. `kops.HTTPProxy`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeId(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    String,
    Int,
    Bool,
    Float,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarType {
    pub kind: ScalarKind,
    /// Named scalar type in the model (typed string / enum), e.g. `kops.CloudProviderID`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Permitted literals when the alias is an enum.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    Scalar(ScalarType),
    Pointer(Box<Shape>),
    Struct(TypeId),
    List(Box<Shape>),
    /// String-keyed map.
    Map(Box<Shape>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub shape: Shape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Type-model revision that introduced the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Deserialize)]
struct ManifestDocument {
    types: Vec<TypeDef>,
}

/// All known types, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    types: IndexMap<TypeId, TypeDef>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl TypeId {
    pub fn new(package: &str, name: &str) -> Self {
        Self(format!("{package}.{name}"))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    pub fn package(&self) -> &str {
        self.0.rsplit_once('.').map(|(p, _)| p).unwrap_or("")
    }
    pub fn name(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, n)| n).unwrap_or(&self.0)
    }
}

impl From<&str> for TypeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ScalarKind::String => "string",
            ScalarKind::Int => "int",
            ScalarKind::Bool => "bool",
            ScalarKind::Float => "float",
        })
    }
}

impl ScalarType {
    pub fn plain(kind: ScalarKind) -> Self {
        Self { kind, alias: None, values: Vec::new() }
    }
}

impl Shape {
    pub fn string() -> Self {
        Self::Scalar(ScalarType::plain(ScalarKind::String))
    }
    pub fn int() -> Self {
        Self::Scalar(ScalarType::plain(ScalarKind::Int))
    }
    pub fn bool() -> Self {
        Self::Scalar(ScalarType::plain(ScalarKind::Bool))
    }
    pub fn float() -> Self {
        Self::Scalar(ScalarType::plain(ScalarKind::Float))
    }
    pub fn pointer(inner: Shape) -> Self {
        Self::Pointer(Box::new(inner))
    }
    pub fn structure(id: &str) -> Self {
        Self::Struct(TypeId::from(id))
    }
    pub fn list(inner: Shape) -> Self {
        Self::List(Box::new(inner))
    }
    pub fn map(inner: Shape) -> Self {
        Self::Map(Box::new(inner))
    }

    /// Every struct type this shape refers to, outermost first.
    fn struct_refs<'a>(&'a self, out: &mut Vec<&'a TypeId>) {
        match self {
            Shape::Scalar(_) => {}
            Shape::Struct(id) => out.push(id),
            Shape::Pointer(inner) | Shape::List(inner) | Shape::Map(inner) => inner.struct_refs(out),
        }
    }
}

impl TypeDef {
    pub fn new(package: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            package: package.to_string(),
            doc: None,
            fields: Vec::new(),
        }
    }
    pub fn field(mut self, name: &str, shape: Shape) -> Self {
        self.fields.push(FieldDef {
            name: name.to_string(),
            shape,
            doc: None,
            since: None,
        });
        self
    }
    pub fn id(&self) -> TypeId {
        TypeId::new(&self.package, &self.name)
    }
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl Manifest {
    pub fn from_types<I>(types: I) -> Result<Self>
    where
        I: IntoIterator<Item = TypeDef>,
    {
        let mut out = Self::default();
        for def in types {
            out.insert(def)?;
        }
        Ok(out)
    }

    /// Parse one manifest document (`{"types": [...]}`).
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let doc = crate::path_de::from_value_with_path::<ManifestDocument>(value)
            .map_err(CompileError::Manifest)?;
        Self::from_types(doc.types)
    }

    /// Append the types of `other`; a type defined in both is an error.
    pub fn merge(&mut self, other: Manifest) -> Result<()> {
        for (_, def) in other.types {
            self.insert(def)?;
        }
        Ok(())
    }

    fn insert(&mut self, def: TypeDef) -> Result<()> {
        let id = def.id();
        if self.types.contains_key(&id) {
            return Err(CompileError::Manifest(format!("type `{id}` is defined more than once")));
        }
        let mut seen = std::collections::HashSet::new();
        for field in &def.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(CompileError::Manifest(format!(
                    "type `{id}` declares field `{}` more than once",
                    field.name
                )));
            }
        }
        self.types.insert(id, def);
        Ok(())
    }

    pub fn get(&self, id: &TypeId) -> Option<&TypeDef> {
        self.types.get(id)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Every `struct` reference must name a type the manifest defines.
    pub fn validate_references(&self) -> Result<()> {
        for def in self.types.values() {
            for field in &def.fields {
                let mut refs = Vec::new();
                field.shape.struct_refs(&mut refs);
                if let Some(missing) = refs.into_iter().find(|id| !self.types.contains_key(*id)) {
                    return Err(CompileError::unsupported(
                        format!("{}.{}", def.id(), field.name),
                        format!("type `{missing}` has no definition in the manifest"),
                    ));
                }
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
