//! Repository ("bakery") building for bao.
//!
//! A repository is a directory holding one zip archive per package and a
//! `BAKERY.toml` index that aggregates every package's metadata.

pub mod error;
pub mod index;
pub mod repository;
mod write;

// Re-exports for convenience.
pub use error::{RepositoryError, Result};
pub use index::{RepositoryIndex, INDEX_FILE};
pub use repository::{
    ArchiveRecord, BuildReport, Repository, RepositoryBuildOptions, RepositoryEntry,
};
