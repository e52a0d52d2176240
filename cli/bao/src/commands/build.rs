//! `bao build` — build the repository described by `bao.toml`.

use std::path::Path;

use anyhow::{Context, Result};
use bao_repository::{BuildReport, RepositoryBuildOptions};

use crate::manifest::BaoManifest;

/// Build every package in the manifest into the output directory.
///
/// `output` overrides the manifest's `[repository] output`.
pub fn run(
    project_dir: &Path,
    manifest: &BaoManifest,
    output: Option<&Path>,
    deny_duplicates: bool,
) -> Result<BuildReport> {
    let repository = manifest.load_repository(project_dir)?;
    let output_dir = match output {
        Some(dir) => dir.to_path_buf(),
        None => manifest.output_dir(project_dir),
    };

    let options = RepositoryBuildOptions {
        deny_duplicates,
        ..Default::default()
    };
    let report = repository
        .build_with(&output_dir, &options)
        .with_context(|| format!("building repository into {}", output_dir.display()))?;

    print_report(repository.name(), &report);
    Ok(report)
}

fn print_report(name: &str, report: &BuildReport) {
    println!("Built repository '{name}'");
    for archive in &report.archives {
        println!(
            "  {:<24} {:>8} bytes  sha256:{}",
            archive.name, archive.size, archive.hash
        );
    }
    for duplicate in &report.duplicates {
        println!("  warning: '{duplicate}' was defined more than once; the last definition was kept");
    }
    println!("Index: {}", report.index_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use bao_repository::{RepositoryIndex, INDEX_FILE};

    const TWO_PACKAGES: &str = r#"
[repository]
name = "bakery"
output = "out"

[[package]]
script = "a.py"
modules = ["shared"]
autogen = true

[[package]]
script = "b.py"
autogen = true

[package.metadata]
author = "Override"
"#;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let header = "__author__ = \"A\"\n__license__ = \"MIT\"\n__copyright__ = \"2020\"\n__version__ = \"1.0.0\"\n";
        fs::write(dir.path().join("a.py"), header).unwrap();
        fs::write(dir.path().join("b.py"), header).unwrap();
        fs::create_dir(dir.path().join("shared")).unwrap();
        fs::write(dir.path().join("shared").join("__init__.py"), "").unwrap();
        dir
    }

    #[test]
    fn builds_archives_and_index() {
        let dir = project();
        let manifest = BaoManifest::from_str(TWO_PACKAGES).unwrap();

        let report = run(dir.path(), &manifest, None, false).unwrap();
        assert_eq!(report.archives.len(), 2);

        let out = dir.path().join("out");
        assert!(out.join("a.zip").is_file());
        assert!(out.join("b.zip").is_file());
        assert!(out.join(INDEX_FILE).is_file());

        let index = RepositoryIndex::load(&out).unwrap();
        assert_eq!(index.name, "bakery");
        assert_eq!(index.packages[1].author(), "Override");
    }

    #[test]
    fn output_flag_overrides_manifest() {
        let dir = project();
        let manifest = BaoManifest::from_str(TWO_PACKAGES).unwrap();
        let elsewhere = dir.path().join("elsewhere");

        run(dir.path(), &manifest, Some(&elsewhere), false).unwrap();
        assert!(elsewhere.join(INDEX_FILE).is_file());
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn deny_duplicates_fails_before_writing() {
        let dir = project();
        let mut manifest = BaoManifest::from_str(TWO_PACKAGES).unwrap();
        let again = manifest.packages[0].clone();
        manifest.packages.push(again);

        let err = run(dir.path(), &manifest, None, true).unwrap_err();
        assert!(format!("{err:#}").contains("duplicate package name in repository: a"));
        assert!(!dir.path().join("out").exists());

        let report = run(dir.path(), &manifest, None, false).unwrap();
        assert_eq!(report.duplicates, vec!["a".to_string()]);
    }

    #[test]
    fn missing_module_is_reported_with_package() {
        let dir = project();
        fs::remove_dir_all(dir.path().join("shared")).unwrap();
        let manifest = BaoManifest::from_str(TWO_PACKAGES).unwrap();

        let err = run(dir.path(), &manifest, None, false).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("a.py"), "{message}");
        assert!(message.contains("shared"), "{message}");
    }
}
