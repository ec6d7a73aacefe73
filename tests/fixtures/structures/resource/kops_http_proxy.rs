// generated by schemac, do not edit
use super::*;

pub fn expand_kops_http_proxy(input: &Value) -> Result<model::kops::HTTPProxy, ExpandError> {
    let block = runtime::expect_block("kops.HTTPProxy", input)?;
    Ok(model::kops::HTTPProxy {
        host: runtime::expand_scalar::<String>("host", block.get("host"))?,
        port: runtime::expand_optional_scalar::<i64>("port", block.get("port"))?,
    })
}

pub fn flatten_kops_http_proxy(input: &model::kops::HTTPProxy) -> Value {
    let mut block = Block::new();
    block.insert("host".to_string(), runtime::flatten_scalar(input.host.clone()));
    block.insert("port".to_string(), runtime::flatten_optional_scalar(input.port));
    Value::Block(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_value_round_trips() {
        let zero = model::kops::HTTPProxy::default();
        let flat = flatten_kops_http_proxy(&zero);
        let back = expand_kops_http_proxy(&flat).unwrap();
        assert_eq!(flatten_kops_http_proxy(&back), flat);
    }
}
