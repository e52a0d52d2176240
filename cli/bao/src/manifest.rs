//! `bao.toml` manifest parsing and project configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bao_package::{extract_with_overrides, ModuleLayout, Package, ScriptHeaderLoader};
use bao_repository::Repository;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// File name of the project manifest.
pub const MANIFEST_FILE: &str = "bao.toml";

/// The top-level manifest structure for a bao project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaoManifest {
    /// Repository settings (required).
    pub repository: RepositoryConfig,
    /// Script and module naming conventions.
    #[serde(default)]
    pub layout: Option<LayoutConfig>,
    /// Packages, in build order.
    #[serde(default, rename = "package")]
    pub packages: Vec<PackageConfig>,
}

/// Repository section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Repository name, recorded in the index.
    pub name: String,
    /// Output directory, relative to the manifest.
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from("dist")
}

/// Layout section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LayoutConfig {
    #[serde(default)]
    pub script_extension: Option<String>,
    #[serde(default)]
    pub init_marker: Option<String>,
}

/// One `[[package]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Main script, relative to the manifest.
    pub script: PathBuf,
    /// Modules to bundle, relative to the manifest.
    #[serde(default)]
    pub modules: Vec<PathBuf>,
    /// Read metadata from the script's dunder header. Explicit
    /// `metadata` values still take precedence.
    #[serde(default)]
    pub autogen: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl BaoManifest {
    /// Search upward from `start_dir` for a `bao.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(MANIFEST_FILE);
            if candidate.is_file() {
                let content = std::fs::read_to_string(&candidate)
                    .with_context(|| format!("reading {}", candidate.display()))?;
                let manifest: BaoManifest = toml::from_str(&content)
                    .with_context(|| format!("parsing {}", candidate.display()))?;
                debug!(path = %candidate.display(), "loaded manifest");
                return Ok(Some((manifest, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Parse a manifest from a TOML string.
    #[cfg(test)]
    pub fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("parsing bao.toml")
    }

    /// Layout with manifest overrides applied.
    pub fn module_layout(&self) -> ModuleLayout {
        let mut layout = ModuleLayout::default();
        if let Some(config) = &self.layout {
            if let Some(ext) = &config.script_extension {
                layout.script_extension = ext.trim_start_matches('.').to_string();
            }
            if let Some(marker) = &config.init_marker {
                layout.init_marker = marker.clone();
            }
        }
        layout
    }

    /// Output directory resolved against `project_dir`.
    pub fn output_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.repository.output)
    }

    /// Assemble the repository described by this manifest.
    pub fn load_repository(&self, project_dir: &Path) -> Result<Repository> {
        let layout = self.module_layout();
        let mut repository = Repository::new(self.repository.name.clone());

        for (i, config) in self.packages.iter().enumerate() {
            let package = load_package(
                project_dir,
                &config.script,
                &config.modules,
                config.autogen,
                &config.metadata,
                &layout,
            )
            .with_context(|| format!("package #{} ({})", i + 1, config.script.display()))?;
            repository.add_package(package);
        }

        Ok(repository)
    }

    /// Generate the default template for `bao init`.
    pub fn template(name: &str) -> String {
        format!(
            r#"[repository]
name = "{name}"
output = "dist"

[[package]]
script = "{name}.py"
autogen = true
"#
        )
    }
}

/// Build a [`Package`] from a script on disk.
///
/// With `autogen`, metadata is read from the script's header and `metadata`
/// overrides it; otherwise `metadata` is the whole record.
pub fn load_package(
    base_dir: &Path,
    script: &Path,
    modules: &[PathBuf],
    autogen: bool,
    metadata: &BTreeMap<String, String>,
    layout: &ModuleLayout,
) -> Result<Package> {
    let script_path = base_dir.join(script);
    let mainscript = std::fs::read(&script_path)
        .with_context(|| format!("reading {}", script_path.display()))?;

    let metadata = if autogen {
        let stem = script_path
            .file_stem()
            .and_then(|s| s.to_str())
            .with_context(|| format!("script name of {}", script_path.display()))?;
        let search_path = script_path.parent().unwrap_or(base_dir);
        let loader = ScriptHeaderLoader::new(Vec::new()).with_layout(layout.clone());
        extract_with_overrides(&loader, stem, Some(search_path), metadata)
            .with_context(|| format!("extracting metadata from {}", script_path.display()))?
    } else {
        bao_package::PackageMetadata::new(metadata.clone())
            .with_context(|| format!("metadata for {}", script_path.display()))?
    };

    for warning in metadata.warnings() {
        warn!(package = metadata.name(), "{warning}");
    }

    let mut package = Package::new(mainscript, metadata).with_layout(layout.clone());
    for module in modules {
        package.add_module(base_dir.join(module))?;
    }
    Ok(package)
}
