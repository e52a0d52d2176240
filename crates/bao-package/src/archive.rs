//! Deterministic zip assembly and metadata-comment inspection.
//!
//! Every entry is written with a fixed timestamp (the DOS epoch) and fixed
//! permissions, and directory trees are walked in file-name order, so the
//! same inputs always produce the same bytes. Package metadata travels in
//! the archive's global comment as a TOML block.

use std::collections::BTreeSet;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

use crate::cancel::Cancellation;
use crate::error::{PackageError, Result};
use crate::metadata::PackageMetadata;

/// Largest comment the zip end-of-central-directory record can hold.
pub const MAX_COMMENT_LEN: usize = u16::MAX as usize;

const FILE_MODE: u32 = 0o644;
const DIR_MODE: u32 = 0o755;

/// In-memory zip writer with reproducible entry headers.
pub struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    entries: BTreeSet<String>,
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveWriter {
    pub fn new() -> Self {
        ArchiveWriter {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            entries: BTreeSet::new(),
        }
    }

    fn options(mode: u32) -> SimpleFileOptions {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(mode)
    }

    fn claim(&mut self, entry: &str) -> Result<()> {
        if !self.entries.insert(entry.to_string()) {
            return Err(PackageError::DuplicateEntry {
                entry: entry.to_string(),
            });
        }
        Ok(())
    }

    /// Add a file entry with the given contents.
    pub fn add_file(&mut self, entry: &str, contents: &[u8]) -> Result<()> {
        self.claim(entry)?;
        debug!(entry, size = contents.len(), "adding archive entry");
        self.zip.start_file(entry, Self::options(FILE_MODE))?;
        self.zip.write_all(contents)?;
        Ok(())
    }

    /// Add an (empty) directory entry. A trailing `/` is appended if missing.
    pub fn add_directory(&mut self, entry: &str) -> Result<()> {
        let entry = if entry.ends_with('/') {
            entry.to_string()
        } else {
            format!("{entry}/")
        };
        self.claim(&entry)?;
        debug!(entry = %entry, "adding archive directory");
        self.zip.add_directory(entry, Self::options(DIR_MODE))?;
        Ok(())
    }

    /// Copy a file from disk into the archive under `entry`.
    pub fn add_path(&mut self, entry: &str, path: &Path) -> Result<()> {
        let contents = std::fs::read(path).map_err(|source| PackageError::ModuleIo {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_file(entry, &contents)
    }

    /// Add a whole directory tree, rooted at the directory's own name.
    ///
    /// `cancel` is polled before every entry.
    pub fn add_tree(&mut self, root: &Path, cancel: &Cancellation) -> Result<()> {
        let base = root
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| PackageError::InvalidModule {
                path: root.to_path_buf(),
            })?;

        for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
            cancel.checkpoint()?;

            let entry = entry.map_err(|e| PackageError::ModuleIo {
                path: e.path().unwrap_or(root).to_path_buf(),
                source: e.into(),
            })?;

            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|_| PackageError::InvalidModule {
                    path: entry.path().to_path_buf(),
                })?;

            let mut name = base.clone();
            for component in relative.components() {
                // Entry names must round-trip exactly.
                let part = component
                    .as_os_str()
                    .to_str()
                    .ok_or_else(|| PackageError::InvalidModule {
                        path: entry.path().to_path_buf(),
                    })?;
                name.push('/');
                name.push_str(part);
            }

            let file_type = entry.file_type();
            if file_type.is_dir() {
                self.add_directory(&name)?;
            } else if file_type.is_file() {
                self.add_path(&name, entry.path())?;
            } else {
                debug!(path = %entry.path().display(), "skipping special file");
            }
        }

        Ok(())
    }

    /// Names of all entries added so far, sorted.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Finish the archive, attaching `comment` as the global comment.
    pub fn finish(mut self, comment: Option<&str>) -> Result<Vec<u8>> {
        if let Some(comment) = comment {
            self.zip.set_comment(comment.to_string());
        }
        Ok(self.zip.finish()?.into_inner())
    }
}

/// Summary of a package archive, read without extracting it.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// Metadata decoded from the archive comment, if present.
    pub metadata: Option<PackageMetadata>,
    /// Entry names in central-directory order.
    pub entries: Vec<String>,
}

/// Decode the metadata comment of a package archive.
pub fn read_metadata(bytes: &[u8]) -> Result<PackageMetadata> {
    let archive = ZipArchive::new(Cursor::new(bytes))?;
    decode_comment(archive.comment())?.ok_or(PackageError::NoMetadata)
}

/// List the entries of a package archive along with its metadata.
pub fn inspect(bytes: &[u8]) -> Result<ArchiveSummary> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let metadata = decode_comment(archive.comment())?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        entries.push(archive.by_index(i)?.name().to_string());
    }

    Ok(ArchiveSummary { metadata, entries })
}

/// Read the contents of a single entry.
pub fn read_entry(bytes: &[u8], entry: &str) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut file = archive.by_name(entry)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

fn decode_comment(comment: &[u8]) -> Result<Option<PackageMetadata>> {
    if comment.is_empty() {
        return Ok(None);
    }
    let text = std::str::from_utf8(comment)?;
    PackageMetadata::parse(text).map(Some)
}
