//! Package ("bun") building for bao.
//!
//! A package is a main script, a set of bundled modules, and a metadata
//! record, materialized as a single zip archive whose global comment holds
//! the metadata as TOML. Tools unaware of the convention still see an
//! ordinary zip file.
//!
//! # Pipeline
//!
//! - [`metadata`] — attribute schema, defaulting, validation
//! - [`module`] — which paths may be bundled
//! - [`package`] — archive assembly
//! - [`extract`] / [`loader`] — deriving metadata from a script header
//!
//! Builds are reproducible: unchanged inputs yield byte-identical archives.

pub mod archive;
pub mod cancel;
pub mod error;
pub mod extract;
pub mod integrity;
pub mod loader;
pub mod metadata;
pub mod module;
pub mod package;

// Re-exports for convenience.
pub use archive::{inspect, read_entry, read_metadata, ArchiveSummary};
pub use cancel::Cancellation;
pub use error::{PackageError, Result};
pub use extract::{extract, extract_with_overrides, ModuleHandle, ModuleLoader};
pub use integrity::ContentHash;
pub use loader::{InMemoryLoader, ScriptHeader, ScriptHeaderLoader};
pub use metadata::{fill_defaults, Field, FieldDefault, MetadataRecord, PackageMetadata, PACKAGE_ATTRIBUTES};
pub use module::{is_valid_module, ModuleLayout, ModulePath};
pub use package::{BuildOptions, Package};
