//! Repository (bakery) aggregation.
//!
//! A repository is an ordered list of packages. Building it writes one
//! `{name}.zip` per package into the output directory and then the
//! `BAKERY.toml` index. The index is written last, so an index entry always
//! refers to an archive that was fully written. Builds are not transactional:
//! if a write fails midway, archives already written stay on disk.
//!
//! Package names should be unique. When two packages share a name the later
//! one wins: its archive overwrites the earlier one and its metadata takes
//! the earlier one's slot in the index. Collisions are logged, reported in
//! [`BuildReport::duplicates`], and can be turned into a hard
//! [`RepositoryError::Duplicate`] with
//! [`RepositoryBuildOptions::deny_duplicates`].

use std::path::{Path, PathBuf};

use bao_package::{BuildOptions, Cancellation, ContentHash, Package, PackageMetadata};
use tracing::{info, warn};

use crate::error::{RepositoryError, Result};
use crate::index::RepositoryIndex;
use crate::write::write_atomic;

/// A package held by a repository.
#[derive(Debug, Clone)]
pub enum RepositoryEntry {
    /// Built from source when the repository is built.
    Source(Package),
    /// An archive that was built elsewhere.
    Prebuilt {
        metadata: PackageMetadata,
        bytes: Vec<u8>,
    },
}

impl RepositoryEntry {
    pub fn metadata(&self) -> &PackageMetadata {
        match self {
            RepositoryEntry::Source(package) => package.metadata(),
            RepositoryEntry::Prebuilt { metadata, .. } => metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.metadata().name()
    }

    /// Archive bytes for this entry.
    pub fn archive(&self, options: &BuildOptions) -> Result<Vec<u8>> {
        match self {
            RepositoryEntry::Source(package) => Ok(package.build_with(options)?),
            RepositoryEntry::Prebuilt { bytes, .. } => Ok(bytes.clone()),
        }
    }
}

/// Options for [`Repository::build_with`].
#[derive(Debug, Clone, Default)]
pub struct RepositoryBuildOptions {
    /// Fail before writing anything if two packages share a name.
    pub deny_duplicates: bool,
    /// Polled between packages and between module copies.
    pub cancel: Cancellation,
}

/// One archive written by a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveRecord {
    pub name: String,
    pub path: PathBuf,
    pub size: usize,
    pub hash: ContentHash,
}

/// Outcome of a repository build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Path of the written index.
    pub index_path: PathBuf,
    /// Archives on disk after the build, one per distinct package name.
    pub archives: Vec<ArchiveRecord>,
    /// Package names that occurred more than once.
    pub duplicates: Vec<String>,
}

/// A named, ordered collection of packages.
#[derive(Debug, Clone)]
pub struct Repository {
    name: String,
    entries: Vec<RepositoryEntry>,
}

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        Repository {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[RepositoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append a package. Name collisions are reported when building.
    pub fn add_package(&mut self, package: Package) {
        self.entries.push(RepositoryEntry::Source(package));
    }

    /// Append an already-built package archive.
    ///
    /// The archive's metadata comment is read and validated.
    pub fn add_archive(&mut self, bytes: Vec<u8>) -> Result<()> {
        let metadata = bao_package::read_metadata(&bytes)?;
        self.entries.push(RepositoryEntry::Prebuilt { metadata, bytes });
        Ok(())
    }

    /// The package called `name`; the last one added wins.
    pub fn get(&self, name: &str) -> Option<&RepositoryEntry> {
        self.entries.iter().rev().find(|e| e.name() == name)
    }

    /// Names that occur more than once, in order of first appearance.
    pub fn duplicates(&self) -> Vec<String> {
        let mut duplicates: Vec<String> = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let name = entry.name();
            let seen_before = self.entries[..i].iter().any(|e| e.name() == name);
            if seen_before && !duplicates.iter().any(|d| d == name) {
                duplicates.push(name.to_string());
            }
        }
        duplicates
    }

    /// Entries as they end up on disk: one per name, in first-appearance
    /// order, holding the last entry added under that name.
    fn effective_entries(&self) -> Vec<&RepositoryEntry> {
        let mut effective: Vec<&RepositoryEntry> = Vec::new();
        for entry in &self.entries {
            match effective.iter_mut().find(|e| e.name() == entry.name()) {
                Some(slot) => *slot = entry,
                None => effective.push(entry),
            }
        }
        effective
    }

    /// The index describing this repository.
    pub fn index(&self) -> RepositoryIndex {
        RepositoryIndex::new(
            self.name.clone(),
            self.effective_entries()
                .into_iter()
                .map(|e| e.metadata().clone())
                .collect(),
        )
    }

    /// Build into `output_dir` with default options.
    pub fn build(&self, output_dir: &Path) -> Result<BuildReport> {
        self.build_with(output_dir, &RepositoryBuildOptions::default())
    }

    /// Build every package into `output_dir`, then write the index.
    ///
    /// `output_dir` is created if missing. Every package is written in
    /// insertion order, so a later duplicate overwrites the earlier archive.
    pub fn build_with(
        &self,
        output_dir: &Path,
        options: &RepositoryBuildOptions,
    ) -> Result<BuildReport> {
        let duplicates = self.duplicates();
        if let Some(name) = duplicates.first() {
            if options.deny_duplicates {
                return Err(RepositoryError::Duplicate { name: name.clone() });
            }
            for name in &duplicates {
                warn!(repository = %self.name, package = %name, "duplicate package name; archive will be overwritten");
            }
        }

        std::fs::create_dir_all(output_dir).map_err(|source| RepositoryError::Write {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let package_options = BuildOptions {
            bundle_meta: true,
            cancel: options.cancel.clone(),
        };

        let mut archives: Vec<ArchiveRecord> = Vec::new();
        for entry in &self.entries {
            options.cancel.checkpoint()?;

            let bytes = entry.archive(&package_options)?;
            let path = output_dir.join(format!("{}.zip", entry.name()));
            write_atomic(&path, &bytes)?;
            info!(package = entry.name(), path = %path.display(), "wrote package archive");

            let record = ArchiveRecord {
                name: entry.name().to_string(),
                path,
                size: bytes.len(),
                hash: ContentHash::compute(&bytes),
            };
            match archives.iter_mut().find(|r| r.name == record.name) {
                Some(slot) => *slot = record,
                None => archives.push(record),
            }
        }

        options.cancel.checkpoint()?;
        let index_path = self.index().write(output_dir)?;
        info!(
            repository = %self.name,
            packages = archives.len(),
            index = %index_path.display(),
            "wrote repository index"
        );

        Ok(BuildReport {
            index_path,
            archives,
            duplicates,
        })
    }
}
