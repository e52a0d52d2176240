//! Repository error types.

use std::path::PathBuf;

use bao_package::PackageError;

/// Errors that can occur while aggregating or writing a repository.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Two packages in the repository share a name.
    #[error("duplicate package name in repository: {name}")]
    Duplicate { name: String },

    /// Building or reading a package failed.
    #[error(transparent)]
    Package(#[from] PackageError),

    /// Writing an output file failed.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading an input file failed.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
