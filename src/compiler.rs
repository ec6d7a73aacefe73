//! One compilation run: plan + manifest → derived artifacts per group.
//!
//! Per group: resolve every directive table (nothing is walked until all of
//! them validate), walk the registered roots, then project the shared type
//! graph into conversions, schemas and doc pages.
use std::path::PathBuf;
use std::sync::Arc;

use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::convert::{ConversionDeriver, ResolvedConversion};
use crate::directive::DirectiveTable;
use crate::docs::{self, DocPage};
use crate::error::{CompileError, ConfigurationIssue, Result};
use crate::manifest::{Manifest, TypeId};
use crate::plan::{GroupPlan, Plan};
use crate::schema::{ResolvedSchema, SchemaDeriver};
use crate::walker::{TypeGraph, TypeNode, Walker};

pub struct Compiler {
    manifest: Manifest,
}

/// A registered root with everything derived from it.
#[derive(Debug, Clone)]
pub struct CompiledType {
    pub node: Arc<TypeNode>,
    /// `None` for `no_schema` roots.
    pub schema: Option<Arc<ResolvedSchema>>,
    pub conversion: Arc<ResolvedConversion>,
    pub doc: Option<DocPage>,
}

#[derive(Debug, Clone)]
pub struct CompiledGroup {
    pub name: String,
    pub read_only: bool,
    pub docs: Option<PathBuf>,
    pub roots: Vec<CompiledType>,
    /// Every type reached in the group, nested ones included, children first.
    pub conversions: Vec<Arc<ResolvedConversion>>,
    pub graph: TypeGraph,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Compiler {
    pub fn new(manifest: Manifest) -> Result<Self> {
        manifest.validate_references()?;
        Ok(Self { manifest })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Compile every group. Groups share no state and run in parallel; any
    /// failing group fails the run.
    pub fn compile(&self, plan: &Plan) -> Result<Vec<CompiledGroup>> {
        plan.groups.par_iter().map(|g| self.compile_group(g)).collect()
    }

    pub fn compile_group(&self, group: &GroupPlan) -> Result<CompiledGroup> {
        let tables = self.resolve_tables(group)?;

        let mut walker = Walker::new(&self.manifest, &tables);
        let mut nodes = Vec::with_capacity(tables.len());
        for id in tables.keys() {
            nodes.push(walker.walk(id)?);
        }
        let graph = walker.into_graph();
        for node in graph.nodes().filter(|n| !n.registered) {
            warn!(
                group = %group.name,
                type_id = %node.id,
                "type reached only through nesting, compiled without directives"
            );
        }

        let mut conversions = ConversionDeriver::new();
        for node in graph.nodes() {
            conversions.derive(node)?;
        }

        let mut schemas = SchemaDeriver::new(group.read_only);
        let mut roots = Vec::with_capacity(nodes.len());
        for node in nodes {
            let schema = schemas.derive_root(&node);
            let doc = node.doc.as_ref().map(|wrapper| docs::derive_page(&schemas.derive(&node), wrapper));
            roots.push(CompiledType { conversion: conversions.derive(&node)?, node, schema, doc });
        }

        info!(
            group = %group.name,
            roots = roots.len(),
            types = graph.len(),
            "compiled group"
        );
        Ok(CompiledGroup {
            name: group.name.clone(),
            read_only: group.read_only,
            docs: group.docs.clone(),
            roots,
            conversions: conversions.into_conversions(),
            graph,
        })
    }

    fn resolve_tables(&self, group: &GroupPlan) -> Result<IndexMap<TypeId, DirectiveTable>> {
        let mut tables = IndexMap::with_capacity(group.types.len());
        for entry in &group.types {
            if tables.contains_key(&entry.type_id) {
                return Err(CompileError::config(
                    &entry.type_id,
                    ConfigurationIssue::DuplicateRegistration { group: group.name.clone() },
                ));
            }
            let def = self.manifest.get(&entry.type_id).ok_or_else(|| {
                CompileError::config(&entry.type_id, ConfigurationIssue::UnknownType { group: group.name.clone() })
            })?;
            tables.insert(entry.type_id.clone(), DirectiveTable::resolve(def, &entry.directives)?);
        }
        Ok(tables)
    }
}

impl CompiledGroup {
    pub fn root(&self, id: &TypeId) -> Option<&CompiledType> {
        self.roots.iter().find(|r| r.node.id == *id)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
