//! Module path validation.
//!
//! A module is either a single script file (`helpers.py`) or a directory
//! that directly contains an init marker (`helpers/__init__.py`).

use std::path::{Path, PathBuf};

use crate::error::{PackageError, Result};

/// Naming conventions for scripts and module directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLayout {
    /// Script file extension, without the leading dot.
    pub script_extension: String,
    /// File name marking a directory as a module.
    pub init_marker: String,
}

impl Default for ModuleLayout {
    fn default() -> Self {
        ModuleLayout {
            script_extension: "py".to_string(),
            init_marker: "__init__.py".to_string(),
        }
    }
}

impl ModuleLayout {
    /// Archive entry name of the main script for a package called `name`.
    pub fn script_name(&self, name: &str) -> String {
        format!("{name}.{}", self.script_extension)
    }

    /// Whether `path` can be bundled as a module.
    ///
    /// Never fails: missing paths and unreadable entries are simply invalid.
    pub fn is_valid_module(&self, path: &Path) -> bool {
        if path.is_file() {
            let suffix = format!(".{}", self.script_extension);
            return path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(&suffix));
        }

        path.is_dir() && path.join(&self.init_marker).is_file()
    }

    /// Resolve `path` to an absolute path and check that it is a module.
    ///
    /// The file name must be valid UTF-8, since it becomes an entry name.
    pub fn resolve_module(&self, path: &Path) -> Result<ModulePath> {
        let resolved = path.canonicalize().map_err(|_| PackageError::InvalidModule {
            path: path.to_path_buf(),
        })?;

        if resolved.file_name().and_then(|n| n.to_str()).is_none()
            || !self.is_valid_module(&resolved)
        {
            return Err(PackageError::InvalidModule { path: resolved });
        }

        Ok(ModulePath(resolved))
    }
}

/// Check `path` against the default layout.
pub fn is_valid_module(path: &Path) -> bool {
    ModuleLayout::default().is_valid_module(path)
}

/// An absolute path that passed module validation when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModulePath(PathBuf);

impl ModulePath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// The final path component, used as the entry name inside the archive.
    pub fn entry_name(&self) -> &str {
        self.0
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

impl AsRef<Path> for ModulePath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}
