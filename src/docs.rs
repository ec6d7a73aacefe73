//! Doc records: a direct projection of the resolved schema, one record per
//! element, one section per reachable nested schema.
use std::collections::HashSet;
use std::sync::Arc;

use crate::directive::DocWrapper;
use crate::manifest::TypeId;
use crate::schema::{Optionality, ResolvedSchema};

#[derive(Debug, Clone, PartialEq)]
pub struct DocRecord {
    pub name: String,
    pub optionality: Optionality,
    pub sensitive: bool,
    pub force_new: bool,
    /// e.g. `string`, `list(block)`.
    pub kind: String,
    pub description: Option<String>,
    /// Type documented by the section this record links to.
    pub nested: Option<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocSection {
    pub type_id: TypeId,
    pub records: Vec<DocRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocPage {
    pub type_id: TypeId,
    pub header: String,
    pub footer: String,
    pub root: DocSection,
    /// Depth first, each nested type once.
    pub nested: Vec<DocSection>,
}

fn section(schema: &ResolvedSchema) -> DocSection {
    let records = schema
        .elements
        .iter()
        .map(|e| DocRecord {
            name: e.name.clone(),
            optionality: e.optionality,
            sensitive: e.sensitive,
            force_new: e.force_new,
            kind: e.kind.label(),
            description: e.description.clone(),
            nested: e.kind.nested().map(|n| n.type_id.clone()),
        })
        .collect();
    DocSection { type_id: schema.type_id.clone(), records }
}

fn collect_nested(schema: &ResolvedSchema, seen: &mut HashSet<TypeId>, out: &mut Vec<DocSection>) {
    for nested in schema.elements.iter().filter_map(|e| e.kind.nested()) {
        if seen.insert(nested.type_id.clone()) {
            out.push(section(nested));
            collect_nested(nested, seen, out);
        }
    }
}

/// Build the page for a root schema wrapped by `wrapper`.
pub fn derive_page(schema: &Arc<ResolvedSchema>, wrapper: &DocWrapper) -> DocPage {
    let mut seen = HashSet::from([schema.type_id.clone()]);
    let mut nested = Vec::new();
    collect_nested(schema, &mut seen, &mut nested);
    DocPage {
        type_id: schema.type_id.clone(),
        header: wrapper.header.clone(),
        footer: wrapper.footer.clone(),
        root: section(schema),
        nested,
    }
}

impl DocRecord {
    /// `Required`, `Optional` or `Computed`, with the modifiers that apply.
    pub fn class_label(&self) -> String {
        let mut label = match self.optionality {
            Optionality::Required => "Required",
            Optionality::Optional => "Optional",
            Optionality::Computed => "Computed",
            Optionality::OptionalComputed => "Optional, Computed",
        }
        .to_string();
        if self.force_new {
            label.push_str(", ForceNew");
        }
        if self.sensitive {
            label.push_str(", Sensitive");
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{DirectiveTable, computed, exclude, required, sensitive};
    use crate::manifest::{Manifest, Shape, TypeDef};
    use crate::schema::SchemaDeriver;
    use crate::walker::Walker;
    use indexmap::IndexMap;

    fn page() -> DocPage {
        let m = Manifest::from_types([
            TypeDef::new("kops", "Addr").field("Host", Shape::string()),
            TypeDef::new("kops", "Proxy")
                .field("Target", Shape::structure("kops.Addr"))
                .field("Fallback", Shape::structure("kops.Addr")),
            TypeDef::new("kops", "Cluster")
                .field("Name", Shape::string())
                .field("Token", Shape::string())
                .field("Internal", Shape::string())
                .field("Channel", Shape::string())
                .field("Proxy", Shape::pointer(Shape::structure("kops.Proxy")))
                .field("Mirrors", Shape::list(Shape::structure("kops.Addr"))),
        ])
        .unwrap();
        let def = m.get(&"kops.Cluster".into()).unwrap();
        let table = DirectiveTable::resolve(
            def,
            &[required(["Name"]), sensitive(["Token"]), exclude(["Internal"]), computed(["Channel"])],
        )
        .unwrap();
        let tables = IndexMap::from([(def.id(), table)]);
        let node = Walker::new(&m, &tables).walk(&def.id()).unwrap();
        let schema = SchemaDeriver::new(false).derive(&node);
        derive_page(&schema, &DocWrapper { header: "# cluster".into(), footer: "end".into() })
    }

    #[test]
    fn records_project_schema_elements() {
        let p = page();
        let names: Vec<_> = p.root.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["name", "token", "channel", "proxy", "mirrors"]);
        assert_eq!(p.root.records[0].class_label(), "Required");
        assert_eq!(p.root.records[1].class_label(), "Optional, Sensitive");
        assert_eq!(p.root.records[2].class_label(), "Optional, Computed");
        assert_eq!(p.root.records[4].kind, "list(block)");
    }

    #[test]
    fn nested_sections_appear_once() {
        let p = page();
        let ids: Vec<_> = p.nested.iter().map(|s| s.type_id.as_str()).collect();
        assert_eq!(ids, ["kops.Proxy", "kops.Addr"]);
        assert_eq!(p.root.records[3].nested, Some(TypeId::from("kops.Proxy")));
    }
}
