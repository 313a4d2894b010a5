//! Error types for discovery and metadata loading.

use std::path::PathBuf;

/// Family a [`MappingError`] belongs to.
///
/// Configuration errors abort a discovery scan before any filtering happens;
/// load errors abort it mid-scan; capability and lookup errors only occur on
/// direct metadata requests for a single class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingErrorKind {
    Configuration,
    Load,
    Capability,
    Lookup,
}

/// Errors surfaced by the discovery driver and the source loader.
#[derive(Debug, thiserror::Error)]
pub enum MappingError {
    /// Discovery was requested with an empty path set.
    #[error("at least one entity path is required before discovery can run")]
    PathRequired,

    /// A configured path does not resolve to an existing directory.
    #[error("entity path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// A source file could not be canonicalized or read.
    #[error("failed to read source file {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A source file is not syntactically valid.
    #[error("failed to parse source file {path}: {reason}")]
    SourceParse { path: PathBuf, reason: String },

    /// A type declares the metadata method but its body is not a plain
    /// sequence of recognized mapping calls.
    #[error("invalid metadata method on {type_name}: {reason}")]
    InvalidMetadataMethod { type_name: String, reason: String },

    /// The same type name was declared by two different source files.
    #[error("duplicate type {name}: declared in {existing} and {duplicate}")]
    DuplicateType {
        name: String,
        existing: PathBuf,
        duplicate: PathBuf,
    },

    /// Metadata was requested for a type that does not describe itself.
    #[error("type {name} does not declare a static loadMetadata method")]
    MissingCapability { name: String },

    /// Metadata was requested for a name no loaded source file declares.
    #[error("unknown type {name}: no loaded source file declares it")]
    UnknownType { name: String },
}

impl MappingError {
    pub fn kind(&self) -> MappingErrorKind {
        match self {
            Self::PathRequired | Self::NotADirectory { .. } => MappingErrorKind::Configuration,
            Self::SourceRead { .. }
            | Self::SourceParse { .. }
            | Self::InvalidMetadataMethod { .. }
            | Self::DuplicateType { .. } => MappingErrorKind::Load,
            Self::MissingCapability { .. } => MappingErrorKind::Capability,
            Self::UnknownType { .. } => MappingErrorKind::Lookup,
        }
    }
}
