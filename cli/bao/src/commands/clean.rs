//! `bao clean` — remove build output.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use bao_repository::INDEX_FILE;

use crate::manifest::BaoManifest;

/// Remove what `bao build` wrote to the project's output directory.
///
/// Only package archives and the index are deleted, and only from a
/// directory strictly inside `project_dir`. The directory itself is removed
/// once nothing else is left in it.
pub fn run(project_dir: &Path, manifest: &BaoManifest) -> Result<()> {
    let out_dir = manifest.output_dir(project_dir);
    if !out_dir.exists() {
        println!("Already clean: {} does not exist", out_dir.display());
        return Ok(());
    }

    let project = project_dir
        .canonicalize()
        .with_context(|| format!("resolving {}", project_dir.display()))?;
    let resolved = out_dir
        .canonicalize()
        .with_context(|| format!("resolving {}", out_dir.display()))?;
    if resolved == project || !resolved.starts_with(&project) {
        bail!(
            "refusing to clean {}: the output directory must be inside {}",
            resolved.display(),
            project.display()
        );
    }

    let mut removed = 0usize;
    for entry in fs::read_dir(&resolved)
        .with_context(|| format!("reading {}", resolved.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let is_output = entry.file_name().to_str() == Some(INDEX_FILE)
            || path.extension().is_some_and(|ext| ext == "zip");
        if is_output && entry.file_type()?.is_file() {
            fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
            removed += 1;
        }
    }

    let is_empty = fs::read_dir(&resolved)?.next().is_none();
    if is_empty {
        fs::remove_dir(&resolved)
            .with_context(|| format!("removing {}", resolved.display()))?;
        println!("Removed {}", resolved.display());
    } else {
        println!(
            "Removed {removed} file(s) from {}; other files were left in place",
            resolved.display()
        );
    }

    Ok(())
}
