//! Name conversions shared by the walker and the emitters.
use heck::ToSnakeCase;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::manifest::TypeId;

static EXTERNAL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex"));

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern", "false", "fn",
    "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "abstract", "become",
    "box", "do", "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Declared identifier → lowercase, word-boundary-delimited form.
///
/// `HTTPProxy` → `http_proxy`, `DNSServers` → `dns_servers`, `MaxRetries` → `max_retries`.
pub fn external_name(declared: &str) -> String {
    declared.to_snake_case()
}

pub fn is_valid_external_name(name: &str) -> bool {
    EXTERNAL_NAME.is_match(name)
}

/// Snake-case identifier usable in generated Rust (keywords become raw identifiers).
pub fn rust_ident(declared: &str) -> String {
    let snake = declared.to_snake_case();
    match snake.as_str() {
        // not allowed as raw identifiers
        "self" | "super" | "crate" => format!("{snake}_"),
        kw if RUST_KEYWORDS.contains(&kw) => format!("r#{snake}"),
        _ => snake,
    }
}

/// Package of `id` as a Rust module name: `k8s.io/api` → `k8s_io_api`.
pub fn package_module(id: &TypeId) -> String {
    id.package().replace(['.', '/', '-'], "_").to_snake_case()
}

/// `kops.HTTPProxy` → `kops_http_proxy`, the stem of generated function names.
pub fn type_stem(id: &TypeId) -> String {
    format!("{}_{}", package_module(id), id.name().to_snake_case())
}

pub fn snake(s: &str) -> String {
    s.to_snake_case()
}
