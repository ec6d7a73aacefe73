//! Type-graph schema compiler: typed config structures plus directives in,
//! schema descriptions, expand/flatten conversion routines and doc pages out.
pub mod cli;
pub mod compiler;
pub mod convert;
pub mod directive;
pub mod docs;
pub mod emit;
pub mod error;
pub mod jq_exec;
pub mod manifest;
pub mod naming;
pub mod path_de;
pub mod plan;
pub mod schema;
pub mod value;
pub mod walker;

pub use compiler::{CompiledGroup, CompiledType, Compiler};
pub use error::{CompileError, ConfigurationIssue, Result};
pub use manifest::{Manifest, TypeId};
pub use plan::{GroupPlan, Plan};
