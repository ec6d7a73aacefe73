//! Directive vocabulary and its resolution into a per-type table.
//!
//! Directives are collected into a table first and validated as a whole, so
//! the outcome (and the error reported) never depends on declaration order.
use std::collections::BTreeSet;

use indexmap::IndexMap;

use crate::error::{CompileError, ConfigurationIssue, Result};
use crate::manifest::TypeDef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Required(Vec<String>),
    Computed(Vec<String>),
    ComputedOnly(Vec<String>),
    Sensitive(Vec<String>),
    ForceNew(Vec<String>),
    Nullable(Vec<String>),
    Rename { from: String, to: String },
    Exclude(Vec<String>),
    /// Minimum type-model revision of the whole type.
    Version(u32),
    /// Minimum type-model revision of individual fields.
    FieldVersion { version: u32, names: Vec<String> },
    NoSchema,
    Doc { header: String, footer: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocWrapper {
    pub header: String,
    pub footer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldEffects {
    pub required: bool,
    pub computed: bool,
    pub computed_only: bool,
    pub sensitive: bool,
    pub force_new: bool,
    pub nullable: bool,
    pub excluded: bool,
    pub rename: Option<String>,
    pub version: Option<u32>,
}

/// Validated directives of one type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveTable {
    pub version: u32,
    pub no_schema: bool,
    pub doc: Option<DocWrapper>,
    fields: IndexMap<String, FieldEffects>,
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

fn names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(Into::into).collect()
}

pub fn required<I: IntoIterator<Item = S>, S: Into<String>>(n: I) -> Directive {
    Directive::Required(names(n))
}
pub fn computed<I: IntoIterator<Item = S>, S: Into<String>>(n: I) -> Directive {
    Directive::Computed(names(n))
}
pub fn computed_only<I: IntoIterator<Item = S>, S: Into<String>>(n: I) -> Directive {
    Directive::ComputedOnly(names(n))
}
pub fn sensitive<I: IntoIterator<Item = S>, S: Into<String>>(n: I) -> Directive {
    Directive::Sensitive(names(n))
}
pub fn force_new<I: IntoIterator<Item = S>, S: Into<String>>(n: I) -> Directive {
    Directive::ForceNew(names(n))
}
pub fn nullable<I: IntoIterator<Item = S>, S: Into<String>>(n: I) -> Directive {
    Directive::Nullable(names(n))
}
pub fn exclude<I: IntoIterator<Item = S>, S: Into<String>>(n: I) -> Directive {
    Directive::Exclude(names(n))
}

pub fn rename(from: &str, to: &str) -> Directive {
    Directive::Rename { from: from.to_string(), to: to.to_string() }
}
pub fn version(v: u32) -> Directive {
    Directive::Version(v)
}
pub fn field_version<I: IntoIterator<Item = S>, S: Into<String>>(v: u32, n: I) -> Directive {
    Directive::FieldVersion { version: v, names: names(n) }
}
pub fn no_schema() -> Directive {
    Directive::NoSchema
}
pub fn doc(header: &str, footer: &str) -> Directive {
    Directive::Doc { header: header.to_string(), footer: footer.to_string() }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl Directive {
    pub fn label(&self) -> &'static str {
        match self {
            Directive::Required(_) => "required",
            Directive::Computed(_) => "computed",
            Directive::ComputedOnly(_) => "computed_only",
            Directive::Sensitive(_) => "sensitive",
            Directive::ForceNew(_) => "force_new",
            Directive::Nullable(_) => "nullable",
            Directive::Rename { .. } => "rename",
            Directive::Exclude(_) => "exclude",
            Directive::Version(_) => "version",
            Directive::FieldVersion { .. } => "field_version",
            Directive::NoSchema => "no_schema",
            Directive::Doc { .. } => "doc",
        }
    }

    fn field_names(&self) -> Vec<&str> {
        match self {
            Directive::Required(n)
            | Directive::Computed(n)
            | Directive::ComputedOnly(n)
            | Directive::Sensitive(n)
            | Directive::ForceNew(n)
            | Directive::Nullable(n)
            | Directive::Exclude(n)
            | Directive::FieldVersion { names: n, .. } => n.iter().map(String::as_str).collect(),
            Directive::Rename { from, .. } => vec![from.as_str()],
            Directive::Version(_) | Directive::NoSchema | Directive::Doc { .. } => Vec::new(),
        }
    }
}

impl FieldEffects {
    /// Names of the effects that are set, in a fixed order.
    pub fn labels(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.required {
            out.push("required");
        }
        if self.computed {
            out.push("computed");
        }
        if self.computed_only {
            out.push("computed_only");
        }
        if self.sensitive {
            out.push("sensitive");
        }
        if self.force_new {
            out.push("force_new");
        }
        if self.nullable {
            out.push("nullable");
        }
        if self.excluded {
            out.push("exclude");
        }
        if self.rename.is_some() {
            out.push("rename");
        }
        if self.version.is_some() {
            out.push("field_version");
        }
        out
    }

    fn conflict(&self) -> Option<(&'static str, &'static str)> {
        if self.excluded {
            return self.labels().into_iter().find(|l| *l != "exclude").map(|other| ("exclude", other));
        }
        let pairs = [
            (self.required, self.computed_only, "required", "computed_only"),
            (self.required, self.computed, "required", "computed"),
            (self.computed, self.computed_only, "computed", "computed_only"),
            (self.required, self.nullable, "required", "nullable"),
            (self.force_new, self.computed_only, "force_new", "computed_only"),
        ];
        pairs.into_iter().find(|(a, b, _, _)| *a && *b).map(|(_, _, x, y)| (x, y))
    }
}

impl DirectiveTable {
    /// Validate `directives` against the real field list of `def`.
    pub fn resolve(def: &TypeDef, directives: &[Directive]) -> Result<Self> {
        let type_id = def.id();
        let mut table = Self::default();
        let mut unknown = BTreeSet::new();
        let mut version: Option<u32> = None;

        for directive in directives {
            for name in directive.field_names() {
                if def.get_field(name).is_none() {
                    unknown.insert((name.to_string(), directive.label()));
                }
            }
        }
        if let Some((field, directive)) = unknown.into_iter().next() {
            return Err(CompileError::config(&type_id, ConfigurationIssue::UnknownField { field, directive }));
        }

        for directive in directives {
            match directive {
                Directive::Required(n) => table.set(n, |e| e.required = true),
                Directive::Computed(n) => table.set(n, |e| e.computed = true),
                Directive::ComputedOnly(n) => table.set(n, |e| e.computed_only = true),
                Directive::Sensitive(n) => table.set(n, |e| e.sensitive = true),
                Directive::ForceNew(n) => table.set(n, |e| e.force_new = true),
                Directive::Nullable(n) => table.set(n, |e| e.nullable = true),
                Directive::Exclude(n) => table.set(n, |e| e.excluded = true),
                Directive::Rename { from, to } => {
                    let entry = table.fields.entry(from.clone()).or_default();
                    merge_value(&type_id, "rename", &mut entry.rename, to.clone())?;
                }
                Directive::FieldVersion { version: v, names } => {
                    for name in names {
                        let entry = table.fields.entry(name.clone()).or_default();
                        merge_value(&type_id, "field_version", &mut entry.version, *v)?;
                    }
                }
                Directive::Version(v) => merge_value(&type_id, "version", &mut version, *v)?,
                Directive::NoSchema => table.no_schema = true,
                Directive::Doc { header, footer } => {
                    let wrapper = DocWrapper { header: header.clone(), footer: footer.clone() };
                    match &table.doc {
                        Some(existing) if *existing != wrapper => {
                            let describe = |w: &DocWrapper| format!("header {:?}, footer {:?}", w.header, w.footer);
                            let mut pair = [describe(existing), describe(&wrapper)];
                            pair.sort();
                            let [first, second] = pair;
                            return Err(CompileError::config(
                                &type_id,
                                ConfigurationIssue::ConflictingValues { directive: "doc", first, second },
                            ));
                        }
                        _ => table.doc = Some(wrapper),
                    }
                }
            }
        }
        table.version = version.unwrap_or(0);

        if table.no_schema && !table.fields.is_empty() {
            let directives: BTreeSet<&'static str> =
                table.fields.values().flat_map(FieldEffects::labels).collect();
            return Err(CompileError::config(
                &type_id,
                ConfigurationIssue::NoSchemaWithFieldDirectives { directives: directives.into_iter().collect() },
            ));
        }

        // declaration order, so the first reported conflict is stable
        for field in &def.fields {
            if let Some((first, second)) = table.fields.get(&field.name).and_then(FieldEffects::conflict) {
                return Err(CompileError::config(
                    &type_id,
                    ConfigurationIssue::Conflict { field: field.name.clone(), first, second },
                ));
            }
        }

        Ok(table)
    }

    fn set(&mut self, names: &[String], apply: impl Fn(&mut FieldEffects)) {
        for name in names {
            apply(self.fields.entry(name.clone()).or_default());
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldEffects> {
        self.fields.get(name)
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.fields.get(name).is_some_and(|e| e.excluded)
    }
}

fn merge_value<T>(
    type_id: &crate::manifest::TypeId,
    directive: &'static str,
    slot: &mut Option<T>,
    value: T,
) -> Result<()>
where
    T: PartialEq + PartialOrd + std::fmt::Display,
{
    match slot {
        Some(existing) if *existing != value => {
            let (first, second) = if *existing < value {
                (existing.to_string(), value.to_string())
            } else {
                (value.to_string(), existing.to_string())
            };
            Err(CompileError::config(type_id, ConfigurationIssue::ConflictingValues { directive, first, second }))
        }
        _ => {
            *slot = Some(value);
            Ok(())
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
