use serde::Serialize;

use super::GENERATED_MARKER;
use crate::schema::ResolvedSchema;

#[derive(Serialize)]
struct SchemaFile<'a> {
    #[serde(rename = "$comment")]
    comment: &'static str,
    group: &'a str,
    #[serde(flatten)]
    schema: &'a ResolvedSchema,
}

/// Pretty JSON of one root schema, nested blocks inline.
pub fn render(group: &str, schema: &ResolvedSchema) -> Result<String, serde_json::Error> {
    let file = SchemaFile { comment: GENERATED_MARKER, group, schema };
    let mut out = serde_json::to_string_pretty(&file)?;
    out.push('\n');
    Ok(out)
}
