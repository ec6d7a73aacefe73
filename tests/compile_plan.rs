use std::path::Path;

use clap::Parser;
use schemac::cli::CommandLineInterface;
use schemac::emit::OutputLayout;
use schemac::value::{TypedStruct, TypedValue, Value};
use schemac::{CompileError, Compiler, ConfigurationIssue, Manifest, Plan};
use serde_json::json;

fn manifest() -> serde_json::Value {
    json!({
        "types": [
            {
                "package": "kops",
                "name": "HTTPProxy",
                "fields": [
                    {"name": "Host", "shape": {"scalar": {"kind": "string"}}},
                    {"name": "Port", "shape": {"pointer": {"scalar": {"kind": "int"}}}}
                ]
            },
            {
                "package": "kops",
                "name": "EgressProxySpec",
                "fields": [
                    {"name": "HTTPProxy", "shape": {"struct": "kops.HTTPProxy"}},
                    {"name": "ProxyExcludes", "shape": {"scalar": {"kind": "string"}}}
                ]
            },
            {
                "package": "resources",
                "name": "Cluster",
                "doc": "A kOps cluster.",
                "fields": [
                    {"name": "Name", "shape": {"scalar": {"kind": "string"}}, "doc": "Cluster name."},
                    {"name": "AdminSshKey", "shape": {"scalar": {"kind": "string"}}},
                    {"name": "Egress", "shape": {"pointer": {"struct": "kops.EgressProxySpec"}}},
                    {"name": "Zones", "shape": {"list": {"scalar": {"kind": "string"}}}},
                    {"name": "Revision", "shape": {"scalar": {"kind": "int"}}, "since": 2},
                    {"name": "Internal", "shape": {"scalar": {"kind": "bool"}}}
                ]
            }
        ]
    })
}

const PLAN: &str = r###"
settings:
  model_path: kops_model
groups:
  - name: Resource
    docs: resources
    types:
      - type: resources.Cluster
        required: [Name, AdminSshKey]
        sensitive: [AdminSshKey]
        force_new: [Name]
        computed_only: [Revision]
        exclude: [Internal]
        doc:
          header: "# kops_cluster"
          footer: "## Import"
      - type: kops.HTTPProxy
        required: [Host]
        no_schema: false
  - name: DataSource
    read_only: true
    types:
      - type: resources.Cluster
        required: [Name]
"###;

fn compiler() -> Compiler {
    Compiler::new(Manifest::from_value(manifest()).unwrap()).unwrap()
}

#[test]
fn compiles_and_renders_every_group() {
    let plan = Plan::from_yaml_str(PLAN).unwrap();
    let groups = compiler().compile(&plan).unwrap();
    assert_eq!(groups.len(), 2);

    let out = tempfile::tempdir().unwrap();
    let layout = OutputLayout::new(out.path(), None, plan.settings.clone());
    let artifacts = layout.render_group(&groups[0]).unwrap();
    let paths: Vec<_> = artifacts.iter().map(|a| a.display_path(out.path())).collect();
    for expected in [
        "schemas/resources/resource_cluster.generated.json",
        "schemas/kops/resource_http_proxy.generated.json",
        "structures/resource/kops_egress_proxy_spec.rs",
        "structures/resource/mod.rs",
        "docs/resources/cluster.md",
    ] {
        assert!(paths.iter().any(|p| p == expected), "missing {expected} in {paths:?}");
    }

    let module = artifacts.iter().find(|a| a.path.ends_with("mod.rs")).unwrap();
    assert!(module.contents.contains("use kops_model as model;"));

    let doc = artifacts.iter().find(|a| a.path.ends_with("cluster.md")).unwrap();
    assert!(doc.contents.contains("- `admin_ssh_key` - (Required, Sensitive) `string`."));
    assert!(!doc.contents.contains("internal"));
}

#[test]
fn data_source_group_is_computed() {
    let plan = Plan::from_yaml_str(PLAN).unwrap();
    let groups = compiler().compile(&plan).unwrap();
    let cluster = groups[1].root(&"resources.Cluster".into()).unwrap();
    let schema = serde_json::to_value(cluster.schema.as_deref().unwrap()).unwrap();
    let classes: Vec<_> = schema["elements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["name"].as_str().unwrap().to_string(), e["optionality"].as_str().unwrap().to_string()))
        .collect();
    assert_eq!(classes[0], ("name".to_string(), "required".to_string()));
    assert!(classes[1..].iter().all(|(_, c)| c == "computed"));
    assert_eq!(schema["elements"][4]["version"], 2);
}

#[test]
fn cluster_conversion_round_trips() {
    let plan = Plan::from_yaml_str(PLAN).unwrap();
    let groups = compiler().compile(&plan).unwrap();
    let conversion = &groups[0].root(&"resources.Cluster".into()).unwrap().conversion;

    let input = Value::from_json(json!({
        "name": "dev",
        "admin_ssh_key": "ssh-rsa AAA",
        "egress": [{"http_proxy": [{"host": "proxy.local", "port": 3128}], "proxy_excludes": "10.0.0.0/8"}],
        "zones": ["a", "b"]
    }))
    .unwrap();
    let typed = conversion.expand(&input).unwrap();
    assert_eq!(typed.get("Revision"), Some(&TypedValue::int(0)));

    let flat = conversion.flatten(&typed).unwrap();
    let block = flat.as_block().unwrap();
    for (key, value) in input.as_block().unwrap() {
        assert_eq!(&block[key], value, "{key}");
    }
    assert_eq!(block["revision"], Value::int(0));
    assert!(!block.contains_key("internal"));

    let again: TypedStruct = conversion.expand(&flat).unwrap();
    assert_eq!(again, typed);
}

#[test]
fn conflicting_directives_fail_the_whole_run() {
    let bad = PLAN.replace("computed_only: [Revision]", "computed_only: [Revision, Name]");
    let plan = Plan::from_yaml_str(&bad).unwrap();
    let err = compiler().compile(&plan).unwrap_err();
    assert_eq!(
        err,
        CompileError::Configuration {
            type_id: "resources.Cluster".into(),
            issue: ConfigurationIssue::Conflict { field: "Name".into(), first: "required", second: "computed_only" },
        }
    );
}

#[test]
fn cli_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let manifest_path = dir.path().join("manifest.json");
    let plan_path = dir.path().join("plan.yaml");
    std::fs::write(&manifest_path, serde_json::to_string(&manifest()).unwrap()).unwrap();
    std::fs::write(&plan_path, PLAN).unwrap();
    let out = dir.path().join("gen");

    let cli = CommandLineInterface::try_parse_from([
        "schemac",
        "compile",
        "--manifest",
        manifest_path.to_str().unwrap(),
        "--plan",
        plan_path.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--group",
        "Resource",
    ])
    .unwrap();
    cli.run().unwrap();

    let schema = std::fs::read_to_string(out.join("schemas/resources/resource_cluster.generated.json")).unwrap();
    let schema: serde_json::Value = serde_json::from_str(&schema).unwrap();
    assert_eq!(schema["type_id"], "resources.Cluster");
    assert!(Path::new(&out.join("structures/resource/kops_http_proxy.rs")).exists());
    assert!(!out.join("structures/data_source").exists());
}
