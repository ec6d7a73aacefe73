//! Error taxonomy of a compilation run.
//!
//! Every variant is fatal: the run stops at the first error and nothing is
//! written. Expansion failures of the generated conversion routines live in
//! [`crate::convert::ExpandError`]; those happen at use time, not at compile time.
use thiserror::Error;

use crate::manifest::TypeId;

pub type Result<T, E = CompileError> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// A directive set is inconsistent with itself or with the type it targets.
    #[error("configuration error in `{type_id}`: {issue}")]
    Configuration {
        type_id: TypeId,
        issue: ConfigurationIssue,
    },

    /// A field shape has no schema/conversion mapping.
    #[error("unsupported shape at `{path}`: {reason}")]
    UnsupportedShape { path: String, reason: String },

    /// A shape/directive combination would break the expand/flatten round trip.
    #[error("conversion invariant violated at `{path}`: {reason}")]
    ConversionInvariant { path: String, reason: String },

    /// The type model manifest itself is malformed.
    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("plan error: {0}")]
    Plan(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationIssue {
    #[error("directive `{directive}` names field `{field}` which does not exist")]
    UnknownField { field: String, directive: &'static str },

    #[error("field `{field}` cannot be both `{first}` and `{second}`")]
    Conflict {
        field: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("`no_schema` cannot be combined with field directives ({})", .directives.join(", "))]
    NoSchemaWithFieldDirectives { directives: Vec<&'static str> },

    #[error("conflicting values for `{directive}`: {first} vs {second}")]
    ConflictingValues {
        directive: &'static str,
        first: String,
        second: String,
    },

    #[error("external name `{name}` is produced by both `{first}` and `{second}`")]
    DuplicateExternalName {
        name: String,
        first: String,
        second: String,
    },

    #[error("external name `{name}` (from field `{field}`) is not a valid attribute name")]
    InvalidExternalName { name: String, field: String },

    #[error("type is registered more than once in group `{group}`")]
    DuplicateRegistration { group: String },

    #[error("type is registered in group `{group}` but missing from the manifest")]
    UnknownType { group: String },
}

impl CompileError {
    pub(crate) fn config(type_id: &TypeId, issue: ConfigurationIssue) -> Self {
        Self::Configuration {
            type_id: type_id.clone(),
            issue,
        }
    }

    pub(crate) fn unsupported(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedShape {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invariant(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConversionInvariant {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
