//! Rust source for the expand/flatten routines of one group.
//!
//! Generated code expects, for each type `<package>.<Name>`, a struct
//! `model::<package>::<Name>` implementing `Default`, with one snake-case
//! field per declared field:
//!
//! - scalars as `String`/`i64`/`bool`/`f64`, pointers as `Option<_>`,
//! - nested structures by value, pointer structures as `Option<_>`,
//! - lists as `Vec<_>`, maps as any `String`-keyed map collection.
//!
//! Aliased scalars (typed strings) must convert from and into their base type.
use std::fmt::Write;
use std::sync::Arc;

use super::GENERATED_MARKER;
use crate::convert::{ConvElement, ExpandRule, FlattenRule, ResolvedConversion};
use crate::manifest::{ScalarKind, ScalarType, TypeId};
use crate::naming;
use crate::plan::Settings;

pub fn module_name(c: &ResolvedConversion) -> String {
    naming::type_stem(&c.type_id)
}

fn expand_fn(id: &TypeId) -> String {
    format!("expand_{}", naming::type_stem(id))
}

fn flatten_fn(id: &TypeId) -> String {
    format!("flatten_{}", naming::type_stem(id))
}

fn model_type(id: &TypeId) -> String {
    format!("model::{}::{}", naming::package_module(id), id.name())
}

fn rust_type(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::String => "String",
        ScalarKind::Int => "i64",
        ScalarKind::Bool => "bool",
        ScalarKind::Float => "f64",
    }
}

/// `{base}` converted into the model's alias type, when there is one.
fn into_alias(t: &ScalarType, base: String, optional: bool) -> String {
    match (&t.alias, optional) {
        (None, _) => base,
        (Some(_), false) => format!("{base}.into()"),
        (Some(_), true) => format!("{base}.map(Into::into)"),
    }
}

/// Owned base-type scalar read from the place `access`.
fn from_alias(t: &ScalarType, access: &str, optional: bool) -> String {
    let base = rust_type(t.kind);
    match (&t.alias, optional) {
        (None, _) if t.kind == ScalarKind::String => format!("{access}.clone()"),
        (None, _) => access.to_string(),
        (Some(_), false) => format!("{base}::from({access}.clone())"),
        (Some(_), true) => format!("{access}.clone().map({base}::from)"),
    }
}

fn expand_element(field: &str, e: &ConvElement) -> String {
    match e {
        ConvElement::Scalar(t) => {
            let read = format!("runtime::scalar_element::<{}>({field:?}, v)", rust_type(t.kind));
            match t.alias {
                None => format!("|v| {read}"),
                Some(_) => format!("|v| {read}.map(Into::into)"),
            }
        }
        ConvElement::Block(c) => expand_fn(&c.type_id),
    }
}

fn flatten_element(e: &ConvElement) -> String {
    match e {
        ConvElement::Scalar(t) => {
            let access = if t.alias.is_none() && t.kind != ScalarKind::String { "*v" } else { "v" };
            format!("|v| runtime::flatten_scalar({})", from_alias(t, access, false))
        }
        ConvElement::Block(c) => flatten_fn(&c.type_id),
    }
}

fn expand_expr(field: &str, rule: &ExpandRule) -> String {
    let get = format!("block.get({field:?})");
    match rule {
        ExpandRule::ScalarOrZero(t) => {
            into_alias(t, format!("runtime::expand_scalar::<{}>({field:?}, {get})?", rust_type(t.kind)), false)
        }
        ExpandRule::ScalarOrNone(t) => {
            into_alias(t, format!("runtime::expand_optional_scalar::<{}>({field:?}, {get})?", rust_type(t.kind)), true)
        }
        ExpandRule::SingleBlockOrZero(c) => {
            format!("runtime::expand_block({field:?}, {get}, {})?.unwrap_or_default()", expand_fn(&c.type_id))
        }
        ExpandRule::SingleBlockOrNone(c) => {
            format!("runtime::expand_block({field:?}, {get}, {})?", expand_fn(&c.type_id))
        }
        ExpandRule::EachElement(e) => format!("runtime::expand_list({field:?}, {get}, {})?", expand_element(field, e)),
        ExpandRule::EachValue(e) => format!("runtime::expand_map({field:?}, {get}, {})?", expand_element(field, e)),
        ExpandRule::NotAccepted(_) => "Default::default()".to_string(),
    }
}

fn flatten_expr(access: &str, rule: &FlattenRule) -> String {
    match rule {
        FlattenRule::Scalar(t) => format!("runtime::flatten_scalar({})", from_alias(t, access, false)),
        FlattenRule::DerefScalar(t) => format!("runtime::flatten_optional_scalar({})", from_alias(t, access, true)),
        FlattenRule::SingleBlock(c) => format!("runtime::flatten_block(&{access}, {})", flatten_fn(&c.type_id)),
        FlattenRule::OptionalBlock(c) => {
            format!("runtime::flatten_optional_block({access}.as_ref(), {})", flatten_fn(&c.type_id))
        }
        FlattenRule::EachElement(e) => format!("runtime::flatten_list(&{access}, {})", flatten_element(e)),
        FlattenRule::EachValue(e) => format!("runtime::flatten_map(&{access}, {})", flatten_element(e)),
    }
}

/// The expand/flatten pair of one type.
pub fn render_conversion(c: &ResolvedConversion) -> String {
    let model = model_type(&c.type_id);
    let mut out = String::new();
    let _ = writeln!(out, "// {GENERATED_MARKER}");
    let _ = writeln!(out, "use super::*;");
    let _ = writeln!(out);

    let _ = writeln!(out, "pub fn {}(input: &Value) -> Result<{model}, ExpandError> {{", expand_fn(&c.type_id));
    let _ = writeln!(out, "    let block = runtime::expect_block({:?}, input)?;", c.type_id.as_str());
    if c.fields.is_empty() {
        let _ = writeln!(out, "    let _ = block;");
    }
    let _ = writeln!(out, "    Ok({model} {{");
    for f in &c.fields {
        let ident = naming::rust_ident(&f.declared_name);
        let _ = writeln!(out, "        {ident}: {},", expand_expr(&f.external_name, &f.expand));
    }
    if !c.omitted.is_empty() {
        let _ = writeln!(out, "        ..Default::default()");
    }
    let _ = writeln!(out, "    }})");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);

    let (param, binding) = if c.fields.is_empty() { ("_input", "block") } else { ("input", "mut block") };
    let _ = writeln!(out, "pub fn {}({param}: &{model}) -> Value {{", flatten_fn(&c.type_id));
    let _ = writeln!(out, "    let {binding} = Block::new();");
    for f in &c.fields {
        let access = format!("input.{}", naming::rust_ident(&f.declared_name));
        let value = flatten_expr(&access, &f.flatten);
        let _ = writeln!(out, "    block.insert({:?}.to_string(), {value});", f.external_name);
    }
    let _ = writeln!(out, "    Value::Block(block)");
    let _ = writeln!(out, "}}");
    render_round_trip_test(&mut out, c);
    out
}

/// Test module checking that the zero value survives flatten then expand.
fn render_round_trip_test(out: &mut String, c: &ResolvedConversion) {
    let _ = writeln!(out);
    let _ = writeln!(out, "#[cfg(test)]");
    let _ = writeln!(out, "mod tests {{");
    let _ = writeln!(out, "    use super::*;");
    let _ = writeln!(out);
    let _ = writeln!(out, "    #[test]");
    let _ = writeln!(out, "    fn zero_value_round_trips() {{");
    let _ = writeln!(out, "        let zero = {}::default();", model_type(&c.type_id));
    let _ = writeln!(out, "        let flat = {}(&zero);", flatten_fn(&c.type_id));
    let _ = writeln!(out, "        let back = {}(&flat).unwrap();", expand_fn(&c.type_id));
    let _ = writeln!(out, "        assert_eq!({}(&back), flat);", flatten_fn(&c.type_id));
    let _ = writeln!(out, "    }}");
    let _ = writeln!(out, "}}");
}

/// `mod.rs` of a group: shared imports, one submodule per type.
pub fn render_module(conversions: &[Arc<ResolvedConversion>], settings: &Settings) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// {GENERATED_MARKER}");
    let _ = writeln!(out, "#![allow(unused_imports)]");
    let _ = writeln!(out);
    let _ = writeln!(out, "use {}::convert::runtime::{{self, ExpandError}};", settings.runtime_path);
    let _ = writeln!(out, "use {}::value::{{Block, Value}};", settings.runtime_path);
    let _ = writeln!(out, "use {} as model;", settings.model_path);
    let _ = writeln!(out);
    for c in conversions {
        let _ = writeln!(out, "mod {};", module_name(c));
    }
    let _ = writeln!(out);
    for c in conversions {
        let _ = writeln!(out, "pub use {}::*;", module_name(c));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::ConversionDeriver;
    use crate::directive::{DirectiveTable, computed_only, exclude};
    use crate::manifest::{Manifest, Shape, TypeDef};
    use crate::walker::Walker;
    use indexmap::IndexMap;

    fn conversions() -> Vec<Arc<ResolvedConversion>> {
        let mut phase = ScalarType::plain(ScalarKind::String);
        phase.alias = Some("Phase".into());
        let m = Manifest::from_types([
            TypeDef::new("kops", "HTTPProxy")
                .field("Host", Shape::string())
                .field("Port", Shape::pointer(Shape::int())),
            TypeDef::new("kops", "Cluster")
                .field("Type", Shape::string())
                .field("Phase", Shape::Scalar(phase))
                .field("Egress", Shape::pointer(Shape::structure("kops.HTTPProxy")))
                .field("Proxies", Shape::list(Shape::structure("kops.HTTPProxy")))
                .field("Labels", Shape::map(Shape::string()))
                .field("Revision", Shape::int())
                .field("Secret", Shape::string()),
        ])
        .unwrap();
        let def = m.get(&"kops.Cluster".into()).unwrap();
        let table = DirectiveTable::resolve(def, &[computed_only(["Revision"]), exclude(["Secret"])]).unwrap();
        let tables = IndexMap::from([(def.id(), table)]);
        let mut walker = Walker::new(&m, &tables);
        walker.walk(&def.id()).unwrap();
        let mut deriver = ConversionDeriver::new();
        for node in walker.into_graph().nodes() {
            deriver.derive(node).unwrap();
        }
        deriver.into_conversions()
    }

    #[test]
    fn scalar_pointer_round_trips_through_option() {
        let src = render_conversion(&conversions()[0]);
        assert!(src.contains("pub fn expand_kops_http_proxy(input: &Value) -> Result<model::kops::HTTPProxy, ExpandError> {"));
        assert!(src.contains(r#"port: runtime::expand_optional_scalar::<i64>("port", block.get("port"))?,"#));
        assert!(src.contains(r#"block.insert("port".to_string(), runtime::flatten_optional_scalar(input.port));"#));
        assert!(src.contains(r#"block.insert("host".to_string(), runtime::flatten_scalar(input.host.clone()));"#));
        assert!(!src.contains("Default::default()"));
    }

    #[test]
    fn cluster_covers_every_rule() {
        let src = render_conversion(&conversions()[1]);
        assert!(src.contains(r#"r#type: runtime::expand_scalar::<String>("type", block.get("type"))?,"#));
        assert!(src.contains(r#"phase: runtime::expand_scalar::<String>("phase", block.get("phase"))?.into(),"#));
        assert!(src.contains(r#"runtime::flatten_scalar(String::from(input.phase.clone()))"#));
        assert!(src.contains(r#"egress: runtime::expand_block("egress", block.get("egress"), expand_kops_http_proxy)?,"#));
        assert!(src.contains(r#"runtime::flatten_optional_block(input.egress.as_ref(), flatten_kops_http_proxy)"#));
        assert!(src.contains(r#"proxies: runtime::expand_list("proxies", block.get("proxies"), expand_kops_http_proxy)?,"#));
        assert!(src.contains(r#"runtime::flatten_map(&input.labels, |v| runtime::flatten_scalar(v.clone()))"#));
        assert!(src.contains("revision: Default::default(),"));
        assert!(src.contains(r#"block.insert("revision".to_string(), runtime::flatten_scalar(input.revision));"#));
        assert!(src.contains("..Default::default()"));
        assert!(!src.contains("secret"));
    }

    #[test]
    fn every_type_carries_a_round_trip_test() {
        let src = render_conversion(&conversions()[0]);
        assert!(src.contains("#[cfg(test)]\nmod tests {\n    use super::*;\n"));
        assert!(src.contains("let zero = model::kops::HTTPProxy::default();"));
        assert!(src.contains("let back = expand_kops_http_proxy(&flat).unwrap();"));
        assert!(src.contains("assert_eq!(flatten_kops_http_proxy(&back), flat);"));
    }

    #[test]
    fn fieldless_type_binds_an_immutable_block() {
        let c = ResolvedConversion { type_id: "kops.Marker".into(), fields: vec![], omitted: vec![] };
        let src = render_conversion(&c);
        assert!(src.contains("pub fn flatten_kops_marker(_input: &model::kops::Marker) -> Value {"));
        assert!(src.contains("    let block = Block::new();\n    Value::Block(block)\n"));
        assert!(!src.contains("let mut block"));
    }

    #[test]
    fn module_declares_every_type() {
        let src = render_module(&conversions(), &Settings::default());
        assert!(src.contains("use schemac::convert::runtime::{self, ExpandError};"));
        assert!(src.contains("use crate::model as model;"));
        assert!(src.contains("mod kops_http_proxy;\nmod kops_cluster;\n"));
        assert!(src.contains("pub use kops_cluster::*;"));
    }
}
