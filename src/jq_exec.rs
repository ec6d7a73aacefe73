//! jq pre-filtering of manifest documents.
use anyhow::{anyhow, Context, Result};
use jaq_core::{compile::Undefined, load, Compiler, Ctx, RcIter};
use jaq_json::Val;
use serde_json::Value;

/// Run `filter_src` over `input`; every output becomes one document.
pub fn filter_document(filter_src: &str, input: &Value) -> Result<Vec<Value>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader
        .load(&arena, program)
        .map_err(format_parse_errors)?;

    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(format_undefined_errors)?;

    let inputs = RcIter::new(core::iter::empty());
    let mut it = filter.run((Ctx::new([], &inputs), Val::from(input.clone())));

    let mut out = Vec::new();
    while let Some(item) = it.next() {
        let v = item.map_err(|e| anyhow!("jq `{filter_src}` failed: {e:?}"))?;
        // Val renders as JSON text
        let doc = serde_json::from_str::<Value>(&v.to_string())
            .with_context(|| format!("jq `{filter_src}` produced invalid JSON"))?;
        out.push(doc);
    }
    Ok(out)
}

fn format_parse_errors(
    errs: Vec<(load::File<&str, ()>, load::Error<&str>)>,
) -> anyhow::Error {
    let mut s = String::new();
    for (file, err) in errs {
        s.push_str(&format!("parse error: {err:?} in `{}`\n", file.code));
    }
    anyhow!(s)
}

fn format_undefined_errors(
    errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>,
) -> anyhow::Error {
    let mut s = String::new();
    for (file, list) in errs {
        for (name, undef) in list {
            s.push_str(&format!("undefined `{name}`: {undef:?} in `{}`\n", file.code));
        }
    }
    anyhow!(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn narrows_a_manifest_to_one_package() {
        let doc = json!({"types": [
            {"package": "kops", "name": "A", "fields": []},
            {"package": "other", "name": "B", "fields": []}
        ]});
        let out = filter_document(r#"{types: [.types[] | select(.package == "kops")]}"#, &doc).unwrap();
        assert_eq!(out, vec![json!({"types": [{"package": "kops", "name": "A", "fields": []}]})]);
    }

    #[test]
    fn each_output_is_a_document() {
        let out = filter_document(".[]", &json!([{"a": 1}, {"b": 2}])).unwrap();
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn undefined_functions_are_reported() {
        assert!(filter_document("nosuchfn", &json!({})).is_err());
    }
}
