use std::fmt::Write;

use super::GENERATED_MARKER;
use crate::docs::{DocPage, DocRecord, DocSection};
use crate::manifest::TypeId;

fn anchor(id: &TypeId) -> String {
    format!("nested-{}", crate::naming::type_stem(id).replace('_', "-"))
}

fn record_line(out: &mut String, r: &DocRecord) {
    let _ = write!(out, "- `{}` - ({}) `{}`.", r.name, r.class_label(), r.kind);
    if let Some(d) = r.description.as_deref().filter(|d| !d.is_empty()) {
        let _ = write!(out, " {d}");
    }
    if let Some(nested) = &r.nested {
        let _ = write!(out, " See [`{}`](#{}) below.", nested.name(), anchor(nested));
    }
    out.push('\n');
}

fn section(out: &mut String, s: &DocSection) {
    for r in &s.records {
        record_line(out, r);
    }
}

/// Markdown page: header, argument reference, nested blocks, footer.
pub fn render(page: &DocPage, read_only: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<!-- {GENERATED_MARKER} -->");
    if !page.header.is_empty() {
        let _ = writeln!(out, "{}", page.header.trim_end());
    }
    out.push('\n');

    let title = if read_only { "Attribute Reference" } else { "Argument Reference" };
    let _ = writeln!(out, "## {title}\n");
    section(&mut out, &page.root);

    if !page.nested.is_empty() {
        let _ = writeln!(out, "\n## Nested Blocks");
    }
    for nested in &page.nested {
        let _ = writeln!(out, "\n### {}\n", nested.type_id.name());
        let _ = writeln!(out, "<a id=\"{}\"></a>\n", anchor(&nested.type_id));
        section(&mut out, nested);
    }

    if !page.footer.is_empty() {
        let _ = writeln!(out, "\n{}", page.footer.trim_end());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Optionality;

    fn record(name: &str, optionality: Optionality) -> DocRecord {
        DocRecord {
            name: name.into(),
            optionality,
            sensitive: false,
            force_new: false,
            kind: "string".into(),
            description: None,
            nested: None,
        }
    }

    #[test]
    fn renders_sections_in_order() {
        let mut token = record("token", Optionality::Optional);
        token.sensitive = true;
        let mut proxy = record("proxy", Optionality::Optional);
        proxy.kind = "block".into();
        proxy.nested = Some(TypeId::from("kops.HTTPProxy"));
        let page = DocPage {
            type_id: TypeId::from("kops.Cluster"),
            header: "# kops_cluster".into(),
            footer: "## Import".into(),
            root: DocSection {
                type_id: TypeId::from("kops.Cluster"),
                records: vec![record("name", Optionality::Required), token, proxy],
            },
            nested: vec![DocSection {
                type_id: TypeId::from("kops.HTTPProxy"),
                records: vec![record("host", Optionality::Required)],
            }],
        };
        let md = render(&page, false);
        assert!(md.starts_with("<!-- generated by schemac, do not edit -->\n# kops_cluster\n"));
        assert!(md.contains("- `name` - (Required) `string`.\n"));
        assert!(md.contains("- `token` - (Optional, Sensitive) `string`.\n"));
        assert!(md.contains("See [`HTTPProxy`](#nested-kops-http-proxy) below."));
        let order: Vec<_> = ["## Argument Reference", "### HTTPProxy", "- `host`", "## Import"]
            .iter()
            .map(|s| md.find(s).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(render(&page, true).contains("## Attribute Reference"));
    }
}
