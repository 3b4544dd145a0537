//! CLI error type.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the `strata` binary.
#[derive(Debug, Error)]
pub enum CliError {
    /// The manifest file could not be read.
    #[error("cannot read manifest {path}: {source}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest file is not valid YAML for the expected shape.
    #[error("cannot parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A field value has no scalar representation.
    #[error("field `{field}` of node `{node}` holds an unsupported value; use scalars, metadata, or children")]
    UnsupportedField { node: String, field: String },

    /// A `breaking` entry names a field the node never declares.
    #[error("node `{node}` marks unknown field `{field}` as breaking")]
    UnknownBreakingField { node: String, field: String },

    /// Engine-side failure.
    #[error(transparent)]
    Engine(#[from] strata_engine::Error),
}

impl CliError {
    pub fn unsupported_field(node: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnsupportedField {
            node: node.into(),
            field: field.into(),
        }
    }

    pub fn unknown_breaking_field(node: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownBreakingField {
            node: node.into(),
            field: field.into(),
        }
    }
}

/// Result alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
