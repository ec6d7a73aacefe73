// generated by schemac, do not edit
use super::*;

pub fn expand_kops_cluster(input: &Value) -> Result<model::kops::Cluster, ExpandError> {
    let block = runtime::expect_block("kops.Cluster", input)?;
    Ok(model::kops::Cluster {
        name: runtime::expand_scalar::<String>("name", block.get("name"))?,
        ratio: runtime::expand_scalar::<f64>("ratio", block.get("ratio"))?,
        enabled: runtime::expand_scalar::<bool>("enabled", block.get("enabled"))?,
        phase: runtime::expand_scalar::<String>("phase", block.get("phase"))?.into(),
        egress: runtime::expand_block("egress", block.get("egress"), expand_kops_http_proxy)?,
        proxy: runtime::expand_block("proxy", block.get("proxy"), expand_kops_http_proxy)?.unwrap_or_default(),
        zones: runtime::expand_list("zones", block.get("zones"), |v| runtime::scalar_element::<String>("zones", v))?,
        labels: runtime::expand_map("labels", block.get("labels"), |v| runtime::scalar_element::<String>("labels", v))?,
        revision: Default::default(),
        ..Default::default()
    })
}

pub fn flatten_kops_cluster(input: &model::kops::Cluster) -> Value {
    let mut block = Block::new();
    block.insert("name".to_string(), runtime::flatten_scalar(input.name.clone()));
    block.insert("ratio".to_string(), runtime::flatten_scalar(input.ratio));
    block.insert("enabled".to_string(), runtime::flatten_scalar(input.enabled));
    block.insert("phase".to_string(), runtime::flatten_scalar(String::from(input.phase.clone())));
    block.insert("egress".to_string(), runtime::flatten_optional_block(input.egress.as_ref(), flatten_kops_http_proxy));
    block.insert("proxy".to_string(), runtime::flatten_block(&input.proxy, flatten_kops_http_proxy));
    block.insert("zones".to_string(), runtime::flatten_list(&input.zones, |v| runtime::flatten_scalar(v.clone())));
    block.insert("labels".to_string(), runtime::flatten_map(&input.labels, |v| runtime::flatten_scalar(v.clone())));
    block.insert("revision".to_string(), runtime::flatten_scalar(input.revision));
    Value::Block(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_value_round_trips() {
        let zero = model::kops::Cluster::default();
        let flat = flatten_kops_cluster(&zero);
        let back = expand_kops_cluster(&flat).unwrap();
        assert_eq!(flatten_kops_cluster(&back), flat);
    }
}
