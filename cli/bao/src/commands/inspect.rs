//! `bao inspect` — show a package archive's metadata and entries.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bao_package::{ArchiveSummary, ContentHash, MetadataRecord};
use serde::Serialize;

#[derive(Serialize)]
struct InspectReport<'a> {
    path: String,
    size: usize,
    sha256: String,
    metadata: Option<&'a MetadataRecord>,
    entries: &'a [String],
}

/// Print what `archive` contains, as text or JSON.
pub fn run(archive: &Path, json: bool) -> Result<()> {
    let bytes = fs::read(archive).with_context(|| format!("reading {}", archive.display()))?;
    let summary = bao_package::inspect(&bytes)
        .with_context(|| format!("reading archive {}", archive.display()))?;
    let hash = ContentHash::compute(&bytes);

    if json {
        let report = InspectReport {
            path: archive.display().to_string(),
            size: bytes.len(),
            sha256: hash.to_string(),
            metadata: summary.metadata.as_ref().map(|m| m.as_record()),
            entries: &summary.entries,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print!("{}", render_text(archive, bytes.len(), &hash, &summary)?);
    Ok(())
}

fn render_text(
    archive: &Path,
    size: usize,
    hash: &ContentHash,
    summary: &ArchiveSummary,
) -> Result<String> {
    let mut out = String::new();
    out.push_str(&format!("--- {} ({size} bytes) ---\n", archive.display()));
    out.push_str(&format!("sha256: {hash}\n\n"));

    match &summary.metadata {
        Some(metadata) => {
            out.push_str("[metadata]\n");
            out.push_str(&metadata.to_toml()?);
        }
        None => out.push_str("(no metadata comment)\n"),
    }

    out.push_str(&format!("\n[entries] {}\n", summary.entries.len()));
    for entry in &summary.entries {
        out.push_str(&format!("  {entry}\n"));
    }
    Ok(out)
}
