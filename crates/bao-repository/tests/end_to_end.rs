//! End-to-end package and repository builds against a real filesystem.

use std::fs;
use std::path::Path;

use bao_package::{inspect, read_entry, read_metadata, Package, PackageMetadata};
use bao_repository::{
    Repository, RepositoryBuildOptions, RepositoryError, RepositoryIndex, INDEX_FILE,
};

fn metadata(name: &str, author: &str) -> PackageMetadata {
    PackageMetadata::from_pairs([
        ("name", name),
        ("author", author),
        ("license", "MIT"),
        ("copyright", "2020"),
        ("version", "1.0.0"),
    ])
    .unwrap()
}

fn dir_listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn two_packages_into_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bakery");

    let mut repo = Repository::new("my-bakery");
    repo.add_package(Package::new(b"print('a')".to_vec(), metadata("a", "Alice")));
    repo.add_package(Package::new(b"print('b')".to_vec(), metadata("b", "Bob")));

    let report = repo.build(&out).unwrap();
    assert!(report.duplicates.is_empty());
    assert_eq!(report.archives.len(), 2);
    assert_eq!(report.index_path, out.join(INDEX_FILE));

    assert_eq!(dir_listing(&out), vec!["BAKERY.toml", "a.zip", "b.zip"]);

    let index = RepositoryIndex::load(&out).unwrap();
    assert_eq!(index.name, "my-bakery");
    assert_eq!(index.packages.len(), 2);
    assert_eq!(index.packages[0], metadata("a", "Alice"));
    assert_eq!(index.packages[1], metadata("b", "Bob"));

    let a = fs::read(out.join("a.zip")).unwrap();
    assert_eq!(read_metadata(&a).unwrap(), metadata("a", "Alice"));
    assert_eq!(read_entry(&a, "a.py").unwrap(), b"print('a')");
}

#[test]
fn duplicate_names_overwrite_and_are_reported() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bakery");

    let mut repo = Repository::new("dupes");
    repo.add_package(Package::new(b"first".to_vec(), metadata("a", "First")));
    repo.add_package(Package::new(b"second".to_vec(), metadata("a", "Second")));

    let report = repo.build(&out).unwrap();
    assert_eq!(report.duplicates, vec!["a".to_string()]);
    assert_eq!(report.archives.len(), 1);
    assert_eq!(dir_listing(&out), vec!["BAKERY.toml", "a.zip"]);

    let bytes = fs::read(out.join("a.zip")).unwrap();
    assert_eq!(read_entry(&bytes, "a.py").unwrap(), b"second");
    assert_eq!(read_metadata(&bytes).unwrap().author(), "Second");

    let index = RepositoryIndex::load(&out).unwrap();
    assert_eq!(index.packages, vec![metadata("a", "Second")]);
}

#[test]
fn duplicate_names_can_be_denied() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("bakery");

    let mut repo = Repository::new("strict");
    repo.add_package(Package::new(b"1".to_vec(), metadata("a", "First")));
    repo.add_package(Package::new(b"2".to_vec(), metadata("a", "Second")));

    let options = RepositoryBuildOptions {
        deny_duplicates: true,
        ..Default::default()
    };
    match repo.build_with(&out, &options) {
        Err(RepositoryError::Duplicate { name }) => assert_eq!(name, "a"),
        other => panic!("expected Duplicate, got {other:?}"),
    }
    assert!(!out.exists());
}

#[test]
fn rebuild_produces_identical_directory() {
    let dir = tempfile::tempdir().unwrap();
    let modules = dir.path().join("src");
    fs::create_dir_all(modules.join("alib")).unwrap();
    fs::write(modules.join("alib").join("__init__.py"), b"").unwrap();
    fs::write(modules.join("util.py"), b"def util(): pass\n").unwrap();

    let mut pkg = Package::new(b"import alib".to_vec(), metadata("a", "Alice"));
    pkg.add_module(modules.join("alib")).unwrap();
    pkg.add_module(modules.join("util.py")).unwrap();

    let mut repo = Repository::new("stable");
    repo.add_package(pkg);

    let out = dir.path().join("out");
    let first = repo.build(&out).unwrap();
    let snapshot: Vec<(String, Vec<u8>)> = dir_listing(&out)
        .into_iter()
        .map(|n| {
            let bytes = fs::read(out.join(&n)).unwrap();
            (n, bytes)
        })
        .collect();

    let second = repo.build(&out).unwrap();
    assert_eq!(first.archives, second.archives);
    for (name, bytes) in snapshot {
        assert_eq!(fs::read(out.join(&name)).unwrap(), bytes, "{name} changed");
    }

    let summary = inspect(&fs::read(out.join("a.zip")).unwrap()).unwrap();
    assert_eq!(
        summary.entries,
        vec!["alib/", "alib/__init__.py", "util.py", "a.py"]
    );
}

#[test]
fn missing_module_surfaces_at_add_time() {
    let dir = tempfile::tempdir().unwrap();
    let mut pkg = Package::new(b"".to_vec(), metadata("a", "Alice"));
    let err = pkg.add_module(dir.path().join("ghost")).unwrap_err();
    assert!(err.to_string().contains("ghost"));
    assert!(pkg.modules().is_empty());
}
