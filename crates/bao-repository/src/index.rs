//! The `BAKERY.toml` repository index.
//!
//! ```toml
//! name = "my-bakery"
//!
//! [[packages]]
//! author = "A"
//! copyright = "2020"
//! doc = ""
//! email = ""
//! license = "MIT"
//! maintainer = ""
//! name = "hello"
//! version = "1.0.0"
//! ```

use std::path::{Path, PathBuf};

use bao_package::PackageMetadata;
use serde::{Deserialize, Serialize};

use crate::error::{RepositoryError, Result};
use crate::write::write_atomic;

/// File name of the index at the repository root.
pub const INDEX_FILE: &str = "BAKERY.toml";

/// Repository index: nickname plus every package's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryIndex {
    /// Repository nickname.
    pub name: String,
    /// Package metadata, in repository order.
    #[serde(default)]
    pub packages: Vec<PackageMetadata>,
}

impl RepositoryIndex {
    pub fn new(name: impl Into<String>, packages: Vec<PackageMetadata>) -> Self {
        RepositoryIndex {
            name: name.into(),
            packages,
        }
    }

    /// Parse an index from a TOML string. Package records are validated.
    pub fn parse(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Load the index file from a repository directory.
    pub fn load(repo_dir: &Path) -> Result<Self> {
        let path = repo_dir.join(INDEX_FILE);
        let content = std::fs::read_to_string(&path).map_err(|source| RepositoryError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Serialize this index to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the index into `repo_dir`, replacing any previous index.
    pub fn write(&self, repo_dir: &Path) -> Result<PathBuf> {
        let path = repo_dir.join(INDEX_FILE);
        write_atomic(&path, self.to_toml()?.as_bytes())?;
        Ok(path)
    }

    /// Metadata of the package called `name`.
    pub fn get(&self, name: &str) -> Option<&PackageMetadata> {
        self.packages.iter().find(|m| m.name() == name)
    }
}
