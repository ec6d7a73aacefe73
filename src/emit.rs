//! Serializers of compiled groups into files.
//!
//! Rendering is pure: it produces [`Artifact`]s and never touches the file
//! system. Independent types render in parallel.
pub mod markdown;
pub mod rust;
pub mod schema;

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;

use crate::compiler::CompiledGroup;
use crate::naming;
use crate::plan::Settings;

/// Marker placed at the top of every generated file.
pub const GENERATED_MARKER: &str = "generated by schemac, do not edit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub out_dir: PathBuf,
    pub docs_root: PathBuf,
    pub settings: Settings,
}

impl OutputLayout {
    /// Docs default to `<out_dir>/docs`.
    pub fn new(out_dir: impl Into<PathBuf>, docs_root: Option<PathBuf>, settings: Settings) -> Self {
        let out_dir = out_dir.into();
        let docs_root = docs_root.unwrap_or_else(|| out_dir.join("docs"));
        Self { out_dir, docs_root, settings }
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.out_dir.join("schemas")
    }

    pub fn structures_dir(&self, group: &str) -> PathBuf {
        self.out_dir.join("structures").join(naming::snake(group))
    }

    pub fn docs_dir(&self, group: &CompiledGroup) -> PathBuf {
        match &group.docs {
            Some(dir) => self.docs_root.join(dir),
            None => self.docs_root.join(naming::snake(&group.name)),
        }
    }

    pub fn render_group(&self, group: &CompiledGroup) -> Result<Vec<Artifact>, serde_json::Error> {
        let group_snake = naming::snake(&group.name);

        let schemas = group
            .roots
            .par_iter()
            .filter_map(|root| root.schema.as_ref())
            .map(|s| {
                let path = self
                    .schema_dir()
                    .join(naming::package_module(&s.type_id))
                    .join(format!("{group_snake}_{}.generated.json", naming::snake(s.type_id.name())));
                schema::render(&group.name, s).map(|contents| Artifact { path, contents })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let structures_dir = self.structures_dir(&group.name);
        let mut structures: Vec<Artifact> = group
            .conversions
            .par_iter()
            .map(|c| Artifact {
                path: structures_dir.join(format!("{}.rs", rust::module_name(c))),
                contents: rust::render_conversion(c),
            })
            .collect();
        structures.push(Artifact {
            path: structures_dir.join("mod.rs"),
            contents: rust::render_module(&group.conversions, &self.settings),
        });

        let docs_dir = self.docs_dir(group);
        let docs: Vec<Artifact> = group
            .roots
            .par_iter()
            .filter_map(|root| root.doc.as_ref())
            .map(|page| Artifact {
                path: docs_dir.join(format!("{}.md", naming::snake(page.type_id.name()))),
                contents: markdown::render(page, group.read_only),
            })
            .collect();

        debug!(
            group = %group.name,
            schemas = schemas.len(),
            structures = structures.len(),
            docs = docs.len(),
            "rendered group"
        );
        Ok(schemas.into_iter().chain(structures).chain(docs).collect())
    }
}

impl Artifact {
    /// Path relative to `base`, for display.
    pub fn display_path(&self, base: &Path) -> String {
        self.path.strip_prefix(base).unwrap_or(&self.path).display().to_string()
    }
}
