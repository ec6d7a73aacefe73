//! CLI: manifest + plan → (compile | check | schema)
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use crate::compiler::{CompiledGroup, Compiler};
use crate::emit::{Artifact, OutputLayout};
use crate::manifest::{Manifest, TypeId};
use crate::plan::Plan;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile typed config structures plus directives into schemas, conversion routines and docs
#[derive(Parser, Debug)]
#[command(name = "schemac")]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// compile every group (or one) and write the artifacts
    Compile(CompileOut),
    /// compile only and print a per-group summary
    Check(CheckOut),
    /// print one derived schema as JSON
    Schema(SchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select the manifest inside each document (e.g. /data/manifest)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each manifest document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more manifest files (JSON or YAML). May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    manifest: Vec<String>,

    /// compilation plan (JSON or YAML)
    #[arg(long, short)]
    plan: PathBuf,
}

#[derive(clap::Parser, Debug)]
struct CompileOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory for schemas and conversion code
    #[arg(short, long)]
    out: PathBuf,

    /// root of the doc pages (defaults to <out>/docs)
    #[arg(long)]
    docs_root: Option<PathBuf>,

    /// only this group
    #[arg(long)]
    group: Option<String>,

    /// list the files instead of writing them
    #[arg(long)]
    no_op: bool,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// only this group
    #[arg(long)]
    group: Option<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// qualified type identity, e.g. kops.Cluster
    #[arg(long = "type")]
    type_id: String,

    /// group the type is registered in
    #[arg(long)]
    group: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_manifest(&self) -> Result<Manifest> {
        let source_paths = resolve_file_path_patterns(&self.manifest)
            .map_err(|e| anyhow!("failed to resolve manifest paths: {e}"))?;
        let mut manifest = Manifest::default();
        for source_path in source_paths {
            for document in self.load_documents(&source_path)? {
                let part = Manifest::from_value(document)
                    .with_context(|| format!("invalid manifest {}", source_path.display()))?;
                manifest.merge(part)?;
            }
        }
        info!(types = manifest.len(), "loaded manifest");
        Ok(manifest)
    }

    /// Parse one file, then narrow it by JSON Pointer and jq, in that order.
    fn load_documents(&self, source_path: &Path) -> Result<Vec<serde_json::Value>> {
        let source_path_str = source_path.to_string_lossy().to_string();
        let source = std::fs::read_to_string(source_path)
            .with_context(|| format!("failed to read source file {source_path_str}"))?;
        let value = crate::path_de::from_path_str_with_path::<serde_json::Value>(source_path, &source)
            .map_err(|e| anyhow!("failed to parse source file ({source_path_str}): {e}"))?;
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(pointer) => value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {source_path_str}"))?,
        };
        match self.jq_expr.as_deref() {
            None => Ok(vec![value]),
            Some(jq_expr) => crate::jq_exec::filter_document(jq_expr, &value)
                .with_context(|| format!("failed to apply jq expression to source file ({source_path_str})")),
        }
    }

    fn load_plan(&self) -> Result<Plan> {
        let source = std::fs::read_to_string(&self.plan)
            .with_context(|| format!("failed to read plan {}", self.plan.display()))?;
        Ok(Plan::from_path_str(&self.plan, &source)?)
    }

    fn compile(&self, group: Option<&str>) -> Result<(Plan, Vec<CompiledGroup>)> {
        let manifest = self.load_manifest()?;
        let mut plan = self.load_plan()?;
        if let Some(name) = group {
            if plan.group(name).is_none() {
                bail!("plan has no group `{name}`");
            }
            plan.groups.retain(|g| g.name == name);
        }
        let compiled = Compiler::new(manifest)?.compile(&plan)?;
        Ok((plan, compiled))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Compile(target) => {
                let (plan, groups) = target.input_settings.compile(target.group.as_deref())?;
                let layout = OutputLayout::new(&target.out, target.docs_root.clone(), plan.settings);
                for group in &groups {
                    let artifacts = layout
                        .render_group(group)
                        .with_context(|| format!("failed to render group {}", group.name))?;
                    if target.no_op {
                        for artifact in &artifacts {
                            println!("{}", artifact.path.display());
                        }
                        continue;
                    }
                    write_artifacts(&artifacts)?;
                    eprintln!(
                        "{} {} ({} files)",
                        "wrote".green().bold(),
                        group.name,
                        artifacts.len()
                    );
                }
                Ok(())
            }
            Command::Check(target) => {
                let (_, groups) = target.input_settings.compile(target.group.as_deref())?;
                for group in &groups {
                    let schemas = group.roots.iter().filter(|r| r.schema.is_some()).count();
                    let docs = group.roots.iter().filter(|r| r.doc.is_some()).count();
                    println!(
                        "{} {}: {} roots, {} types, {} schemas, {} doc pages",
                        "ok".green().bold(),
                        group.name,
                        group.roots.len(),
                        group.graph.len(),
                        schemas,
                        docs
                    );
                }
                Ok(())
            }
            Command::Schema(target) => {
                let (_, groups) = target.input_settings.compile(Some(target.group.as_str()))?;
                let type_id = TypeId::from(target.type_id.as_str());
                let schema = groups
                    .iter()
                    .find_map(|g| g.root(&type_id))
                    .ok_or_else(|| anyhow!("`{type_id}` is not registered in group `{}`", target.group))?
                    .schema
                    .as_ref()
                    .ok_or_else(|| anyhow!("`{type_id}` is marked no_schema"))?;
                print!("{}", crate::emit::schema::render(&target.group, schema)?);
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_artifacts(artifacts: &[Artifact]) -> Result<()> {
    for artifact in artifacts {
        if let Some(parent) = artifact.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(&artifact.path, &artifact.contents)
            .with_context(|| format!("failed to write {}", artifact.path.display()))?;
    }
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'['))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                return Err(format!("glob pattern matched no files: {pattern}").into());
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
