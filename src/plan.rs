//! Compilation plan: which types each group compiles, with which directives.
//!
//! The plan is pure data. It is read from YAML or JSON, or built in code with
//! the directive constructors.
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;

use crate::directive::{self, Directive};
use crate::error::{CompileError, Result};
use crate::manifest::TypeId;
use crate::path_de;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub groups: Vec<GroupPlan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Rust path of the model packages in the consuming crate.
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Rust path of this crate in the consuming crate.
    #[serde(default = "default_runtime_path")]
    pub runtime_path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupPlan {
    pub name: String,
    /// Directory for this group's doc pages, relative to the docs root.
    #[serde(default)]
    pub docs: Option<PathBuf>,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub types: Vec<TypeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "TypeDirectives")]
pub struct TypeEntry {
    pub type_id: TypeId,
    pub directives: Vec<Directive>,
}

/// On-disk form of one registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeDirectives {
    #[serde(rename = "type")]
    type_id: TypeId,
    #[serde(default)]
    required: Vec<String>,
    #[serde(default)]
    computed: Vec<String>,
    #[serde(default)]
    computed_only: Vec<String>,
    #[serde(default)]
    sensitive: Vec<String>,
    #[serde(default)]
    force_new: Vec<String>,
    #[serde(default)]
    nullable: Vec<String>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    rename: IndexMap<String, String>,
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    field_versions: IndexMap<String, u32>,
    #[serde(default)]
    no_schema: bool,
    #[serde(default)]
    doc: Option<DocText>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct DocText {
    #[serde(default)]
    header: String,
    #[serde(default)]
    footer: String,
}

fn default_model_path() -> String {
    "crate::model".to_string()
}

fn default_runtime_path() -> String {
    "schemac".to_string()
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Default for Settings {
    fn default() -> Self {
        Self { model_path: default_model_path(), runtime_path: default_runtime_path() }
    }
}

impl From<TypeDirectives> for TypeEntry {
    fn from(t: TypeDirectives) -> Self {
        let lists = [
            (t.required, Directive::Required as fn(Vec<String>) -> Directive),
            (t.computed, Directive::Computed),
            (t.computed_only, Directive::ComputedOnly),
            (t.sensitive, Directive::Sensitive),
            (t.force_new, Directive::ForceNew),
            (t.nullable, Directive::Nullable),
            (t.exclude, Directive::Exclude),
        ];
        let mut directives: Vec<Directive> = lists
            .into_iter()
            .filter(|(names, _)| !names.is_empty())
            .map(|(names, build)| build(names))
            .collect();
        directives.extend(t.rename.iter().map(|(from, to)| directive::rename(from, to)));
        directives.extend(t.version.map(directive::version));
        directives.extend(t.field_versions.into_iter().map(|(name, v)| directive::field_version(v, [name])));
        if t.no_schema {
            directives.push(directive::no_schema());
        }
        if let Some(doc) = t.doc {
            directives.push(directive::doc(&doc.header, &doc.footer));
        }
        TypeEntry { type_id: t.type_id, directives }
    }
}

impl Plan {
    pub fn new(settings: Settings) -> Self {
        Self { settings, groups: Vec::new() }
    }

    pub fn with_group(mut self, group: GroupPlan) -> Self {
        self.groups.push(group);
        self
    }

    /// Parse plan text; the format follows the file extension.
    pub fn from_path_str(path: &Path, src: &str) -> Result<Self> {
        path_de::from_path_str_with_path(path, src).map_err(|e| CompileError::Plan(format!("{}: {e}", path.display())))
    }

    pub fn from_yaml_str(src: &str) -> Result<Self> {
        path_de::from_yaml_str_with_path(src).map_err(CompileError::Plan)
    }

    pub fn group(&self, name: &str) -> Option<&GroupPlan> {
        self.groups.iter().find(|g| g.name == name)
    }
}

impl GroupPlan {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), docs: None, read_only: false, types: Vec::new() }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn docs(mut self, dir: impl Into<PathBuf>) -> Self {
        self.docs = Some(dir.into());
        self
    }

    pub fn register(mut self, type_id: &str, directives: Vec<Directive>) -> Self {
        self.types.push(TypeEntry { type_id: TypeId::from(type_id), directives });
        self
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{doc, field_version, rename, required, sensitive, version};

    const PLAN: &str = r##"
settings:
  model_path: kops::api
groups:
  - name: Resource
    docs: resources
    types:
      - type: kops.Cluster
        required: [Name, AdminSshKey]
        sensitive: [AdminSshKey]
        rename: {Subnets: Subnet}
        version: 1
        field_versions: {Labels: 2}
        doc: {header: "# Cluster", footer: ""}
  - name: DataSource
    read_only: true
    types:
      - type: kops.Cluster
"##;

    #[test]
    fn yaml_plan_becomes_directives() {
        let plan = Plan::from_yaml_str(PLAN).unwrap();
        assert_eq!(plan.settings.model_path, "kops::api");
        assert_eq!(plan.settings.runtime_path, "schemac");

        let resource = plan.group("Resource").unwrap();
        assert_eq!(resource.docs.as_deref(), Some(Path::new("resources")));
        assert_eq!(
            resource.types[0].directives,
            vec![
                required(["Name", "AdminSshKey"]),
                sensitive(["AdminSshKey"]),
                rename("Subnets", "Subnet"),
                version(1),
                field_version(2, ["Labels"]),
                doc("# Cluster", ""),
            ]
        );
        let data = plan.group("DataSource").unwrap();
        assert!(data.read_only);
        assert!(data.types[0].directives.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected_with_a_path() {
        let err = Plan::from_yaml_str("groups:\n  - name: R\n    types:\n      - type: a.B\n        requird: [X]\n").unwrap_err();
        let CompileError::Plan(msg) = err else {
            panic!("expected a plan error");
        };
        assert!(msg.contains("groups[0].types[0]"), "{msg}");
    }

    #[test]
    fn builder_matches_parsed_plan() {
        let built = GroupPlan::new("DataSource").read_only().register("kops.Cluster", vec![]);
        let parsed = Plan::from_yaml_str(PLAN).unwrap();
        let data = parsed.group("DataSource").unwrap();
        assert_eq!(built.types, data.types);
        assert_eq!(built.read_only, data.read_only);
    }
}
