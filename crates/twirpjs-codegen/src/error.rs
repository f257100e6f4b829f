//! Generation errors.
//!
//! Every variant is fatal: a run either produces a complete artifact or
//! nothing at all.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// A field or method references a qualified type name the schema does
    /// not define.
    #[error("unresolved type `{name}` referenced by {context}")]
    SchemaResolution { name: String, context: String },

    /// The schema description could not be decoded.
    #[error("malformed schema input: {0}")]
    MalformedInput(String),

    /// Two types share one qualified name.
    #[error("duplicate type definition `{0}`")]
    DuplicateType(String),

    /// The designated file to generate for is not part of the schema.
    #[error("file `{0}` is not part of the schema")]
    UnknownFile(String),

    /// A configuration value or plugin parameter is invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A map-entry message does not have the key/value field pair.
    #[error("map entry `{0}` must have exactly two fields (key, value)")]
    InvalidMapEntry(String),
}

impl CodegenError {
    pub(crate) fn unresolved(name: &str, context: impl Into<String>) -> Self {
        Self::SchemaResolution {
            name: name.to_string(),
            context: context.into(),
        }
    }
}

pub type Result<T, E = CodegenError> = std::result::Result<T, E>;
