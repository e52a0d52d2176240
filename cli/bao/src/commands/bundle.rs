//! `bao bundle` — build a single package archive from a script.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bao_package::{BuildOptions, ModuleLayout};

use crate::manifest::load_package;

/// Bundle `script` and `modules` into one archive.
///
/// Metadata comes from the script header; `name` overrides the header.
/// The archive is written to `output`, or `<name>.zip` in `cwd`.
pub fn run(
    cwd: &Path,
    script: &Path,
    modules: &[PathBuf],
    output: Option<&Path>,
    name: Option<&str>,
    layout: &ModuleLayout,
) -> Result<PathBuf> {
    let mut overrides = BTreeMap::new();
    if let Some(name) = name {
        overrides.insert("name".to_string(), name.to_string());
    }

    let package = load_package(cwd, script, modules, true, &overrides, layout)?;
    let bytes = package
        .build_with(&BuildOptions::default())
        .with_context(|| format!("building package '{}'", package.name()))?;

    let path = match output {
        Some(path) => cwd.join(path),
        None => cwd.join(format!("{}.zip", package.name())),
    };
    fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;

    println!(
        "Bundled '{}' ({} modules, {} bytes) into {}",
        package.name(),
        package.modules().len(),
        bytes.len(),
        path.display()
    );
    Ok(path)
}
