use serde::de::DeserializeOwned;

/// Deserialize JSON text with field-path context in error messages.
pub fn from_json_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = &mut serde_json::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at path {path} → {}", err.into_inner()))
        }
    }
}

/// Deserialize YAML text with field-path context in error messages.
pub fn from_yaml_str_with_path<T: DeserializeOwned>(src: &str) -> Result<T, String> {
    let de = serde_yaml::Deserializer::from_str(src);
    match serde_path_to_error::deserialize::<_, T>(de) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at path {path} → {}", err.into_inner()))
        }
    }
}

/// Deserialize an already-parsed document, e.g. one narrowed by a JSON pointer or jq.
pub fn from_value_with_path<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, String> {
    match serde_path_to_error::deserialize::<_, T>(value) {
        Ok(v) => Ok(v),
        Err(err) => {
            let path = err.path().to_string();
            Err(format!("at path {path} → {}", err.into_inner()))
        }
    }
}

/// Pick the text format from the file extension; anything that isn't YAML is JSON.
pub fn from_path_str_with_path<T: DeserializeOwned>(path: &std::path::Path, src: &str) -> Result<T, String> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => from_yaml_str_with_path(src),
        _ => from_json_str_with_path(src),
    }
}
