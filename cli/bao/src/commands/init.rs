//! `bao init` — project scaffolding.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::manifest::{BaoManifest, MANIFEST_FILE};

/// Create a new bao project at the given path.
///
/// `name` is the project name. The directory `name` is created relative to cwd.
pub fn run(name: &str) -> Result<()> {
    let project_dir = Path::new(name);
    create_project(project_dir, name)
}

fn script_template(name: &str) -> String {
    format!(
        r#""""{name}: a bao package."""

__author__ = "Your Name"
__license__ = "MIT"
__copyright__ = "Copyright (c) Your Name"
__version__ = "0.1.0"


def main():
    print("Hello from {name}!")


if __name__ == "__main__":
    main()
"#
    )
}

pub(crate) fn create_project(project_dir: &Path, name: &str) -> Result<()> {
    if project_dir.exists() {
        bail!("directory '{}' already exists", project_dir.display());
    }

    fs::create_dir_all(project_dir)
        .with_context(|| format!("creating {}", project_dir.display()))?;

    fs::write(project_dir.join(MANIFEST_FILE), BaoManifest::template(name))
        .context("writing bao.toml")?;

    let script = format!("{name}.py");
    fs::write(project_dir.join(&script), script_template(name))
        .with_context(|| format!("writing {script}"))?;

    fs::write(project_dir.join(".gitignore"), "dist/\n").context("writing .gitignore")?;

    println!("Created project '{name}'");
    println!("  {name}/{MANIFEST_FILE}");
    println!("  {name}/{script}");
    println!("  {name}/.gitignore");

    Ok(())
}
