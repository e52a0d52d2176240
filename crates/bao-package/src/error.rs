//! Package error types.

use std::path::PathBuf;

/// Errors that can occur while validating or building a package.
#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    /// A required metadata field is absent (or `name` is empty).
    #[error("metadata field required: {field}")]
    MissingField { field: String },

    /// The package name cannot be used as a file name.
    #[error("invalid package name '{name}': must not contain path separators")]
    InvalidName { name: String },

    /// A module path is not a script file or a directory with an init marker.
    #[error("invalid module: '{}'", path.display())]
    InvalidModule { path: PathBuf },

    /// Two archive entries would share the same name.
    #[error("duplicate archive entry: {entry}")]
    DuplicateEntry { entry: String },

    /// The serialized metadata does not fit in a zip comment.
    #[error("metadata for '{name}' is {size} bytes, exceeding the {limit}-byte archive comment limit")]
    MetadataTooLarge {
        name: String,
        size: usize,
        limit: usize,
    },

    /// The archive carries no metadata comment.
    #[error("archive has no metadata comment")]
    NoMetadata,

    /// The module loader could not find the requested module.
    #[error("module does not exist: {name}")]
    ModuleNotFound { name: String },

    /// The build was cancelled by the caller.
    #[error("build cancelled")]
    Cancelled,

    /// Reading a module from disk failed.
    #[error("I/O error at {}: {source}", path.display())]
    ModuleIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Zip encoding or decoding error.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Metadata comment is not valid UTF-8.
    #[error("metadata comment is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for package operations.
pub type Result<T> = std::result::Result<T, PackageError>;
