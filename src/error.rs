//! Error types for declaration inference.
use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Only objects and non-empty arrays of objects can be turned into declarations.
    #[error("only (object) and (array of object) roots are supported, found {found}")]
    InvalidRootShape { found: &'static str },

    #[error("input nests deeper than the configured limit of {limit} levels")]
    DepthLimitExceeded { limit: usize },

    /// Raised only under `ReferencePolicy::Error`.
    #[error("field `{field}` references `{target}`, but no declaration with that name exists")]
    UnresolvableExplicitReference { field: String, target: String },
}

/// Human-readable name of a JSON value's kind, used in error messages.
pub(crate) fn kind_name(value: &serde_json::Value) -> &'static str {
    use serde_json::Value;
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(xs) if xs.is_empty() => "empty array",
        Value::Array(_) => "array containing non-objects",
        Value::Object(_) => "object",
    }
}
