//! Package (bun) assembly.
//!
//! A package is a main script plus bundled modules, materialized as one zip
//! archive. The main script is stored as `{name}.{ext}`; file modules land
//! at the top level under their own file name and directory modules are
//! copied recursively under the directory's name. Metadata rides along as
//! the archive comment.

use std::path::Path;

use tracing::{debug, info};

use crate::archive::{ArchiveWriter, MAX_COMMENT_LEN};
use crate::cancel::Cancellation;
use crate::error::{PackageError, Result};
use crate::metadata::{MetadataRecord, PackageMetadata};
use crate::module::{ModuleLayout, ModulePath};

/// Options for [`Package::build_with`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Attach the metadata as the archive comment.
    pub bundle_meta: bool,
    /// Polled between module copies.
    pub cancel: Cancellation,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            bundle_meta: true,
            cancel: Cancellation::new(),
        }
    }
}

/// A buildable package.
#[derive(Debug, Clone)]
pub struct Package {
    mainscript: Vec<u8>,
    metadata: PackageMetadata,
    modules: Vec<ModulePath>,
    layout: ModuleLayout,
}

impl Package {
    /// Create a package from already-validated metadata.
    pub fn new(mainscript: impl Into<Vec<u8>>, metadata: PackageMetadata) -> Self {
        Package {
            mainscript: mainscript.into(),
            metadata,
            modules: Vec::new(),
            layout: ModuleLayout::default(),
        }
    }

    /// Create a package from a raw record, filling defaults.
    pub fn from_record(mainscript: impl Into<Vec<u8>>, record: MetadataRecord) -> Result<Self> {
        Ok(Self::new(mainscript, PackageMetadata::new(record)?))
    }

    /// Use a non-default script/module naming convention.
    pub fn with_layout(mut self, layout: ModuleLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn metadata(&self) -> &PackageMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    pub fn mainscript(&self) -> &[u8] {
        &self.mainscript
    }

    pub fn modules(&self) -> &[ModulePath] {
        &self.modules
    }

    pub fn layout(&self) -> &ModuleLayout {
        &self.layout
    }

    /// Archive entry name of the main script.
    pub fn script_name(&self) -> String {
        self.layout.script_name(self.metadata.name())
    }

    /// Bundle a module as a dependency of this package.
    ///
    /// The path is resolved to an absolute path and must point to a script
    /// file or to a directory containing the init marker. On failure the
    /// module list is left unchanged.
    pub fn add_module(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let module = self.layout.resolve_module(path.as_ref())?;
        debug!(package = self.name(), module = %module.as_path().display(), "adding module");
        self.modules.push(module);
        Ok(())
    }

    /// Build the archive with default options.
    pub fn build(&self) -> Result<Vec<u8>> {
        self.build_with(&BuildOptions::default())
    }

    /// Build the archive.
    ///
    /// Modules are re-validated, since they may have changed on disk since
    /// they were added. Assembly happens entirely in memory.
    pub fn build_with(&self, options: &BuildOptions) -> Result<Vec<u8>> {
        let cancel = &options.cancel;
        let mut writer = ArchiveWriter::new();

        for module in &self.modules {
            cancel.checkpoint()?;

            let path = module.as_path();
            if !self.layout.is_valid_module(path) {
                return Err(PackageError::InvalidModule {
                    path: path.to_path_buf(),
                });
            }

            if path.is_dir() {
                writer.add_tree(path, cancel)?;
            } else {
                writer.add_path(module.entry_name(), path)?;
            }
        }

        cancel.checkpoint()?;
        writer.add_file(&self.script_name(), &self.mainscript)?;

        let comment = if options.bundle_meta {
            let comment = self.metadata.to_toml()?;
            if comment.len() > MAX_COMMENT_LEN {
                return Err(PackageError::MetadataTooLarge {
                    name: self.name().to_string(),
                    size: comment.len(),
                    limit: MAX_COMMENT_LEN,
                });
            }
            Some(comment)
        } else {
            None
        };

        let entries = writer.entries().count();
        let bytes = writer.finish(comment.as_deref())?;
        info!(package = self.name(), entries, size = bytes.len(), "built package");
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{inspect, read_entry, read_metadata};
    use std::fs;

    fn hello_metadata() -> PackageMetadata {
        PackageMetadata::from_pairs([
            ("name", "hello"),
            ("author", "A"),
            ("license", "MIT"),
            ("copyright", "2020"),
            ("version", "1.0.0"),
        ])
        .unwrap()
    }

    fn module_fixtures(root: &Path) {
        fs::write(root.join("helpers.py"), b"def helper():\n    return 1\n").unwrap();
        let lib = root.join("hellolib");
        fs::create_dir_all(lib.join("inner")).unwrap();
        fs::write(lib.join("__init__.py"), b"").unwrap();
        fs::write(lib.join("inner").join("__init__.py"), b"X = 2\n").unwrap();
    }

    #[test]
    fn single_script_package() {
        let pkg = Package::new(b"print('hi')".to_vec(), hello_metadata());
        let bytes = pkg.build().unwrap();

        let summary = inspect(&bytes).unwrap();
        assert_eq!(summary.entries, vec!["hello.py"]);
        assert_eq!(read_entry(&bytes, "hello.py").unwrap(), b"print('hi')");

        let meta = summary.metadata.unwrap();
        assert_eq!(meta.as_record().len(), 8);
        assert_eq!(meta.name(), "hello");
        assert_eq!(meta.author(), "A");
        assert_eq!(meta.license(), "MIT");
        assert_eq!(meta.copyright(), "2020");
        assert_eq!(meta.version(), "1.0.0");
        assert_eq!(meta.doc(), "");
        assert_eq!(meta.maintainer(), "");
        assert_eq!(meta.email(), "");
    }

    #[test]
    fn comment_round_trips_metadata() {
        let mut record = hello_metadata().as_record().clone();
        record.insert("doc".into(), "Greets people".into());
        record.insert("homepage".into(), "https://example.org".into());
        let pkg = Package::from_record(b"".to_vec(), record).unwrap();

        let bytes = pkg.build().unwrap();
        assert_eq!(&read_metadata(&bytes).unwrap(), pkg.metadata());
    }

    #[test]
    fn construction_requires_fields() {
        let mut record = hello_metadata().as_record().clone();
        record.remove("copyright");
        assert!(matches!(
            Package::from_record(b"".to_vec(), record),
            Err(PackageError::MissingField { field }) if field == "copyright"
        ));
    }

    #[test]
    fn invalid_module_leaves_list_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let mut pkg = Package::new(b"".to_vec(), hello_metadata());

        let missing = dir.path().join("does_not_exist.py");
        match pkg.add_module(&missing) {
            Err(PackageError::InvalidModule { path }) => assert_eq!(path, missing),
            other => panic!("expected InvalidModule, got {other:?}"),
        }
        assert!(pkg.modules().is_empty());
    }

    #[test]
    fn bundles_file_and_directory_modules() {
        let dir = tempfile::tempdir().unwrap();
        module_fixtures(dir.path());

        let mut pkg = Package::new(b"import helpers\n".to_vec(), hello_metadata());
        pkg.add_module(dir.path().join("helpers.py")).unwrap();
        pkg.add_module(dir.path().join("hellolib")).unwrap();
        let bytes = pkg.build().unwrap();

        let summary = inspect(&bytes).unwrap();
        assert_eq!(
            summary.entries,
            vec![
                "helpers.py",
                "hellolib/",
                "hellolib/__init__.py",
                "hellolib/inner/",
                "hellolib/inner/__init__.py",
                "hello.py",
            ]
        );
        assert_eq!(
            read_entry(&bytes, "hellolib/inner/__init__.py").unwrap(),
            b"X = 2\n"
        );
    }

    #[test]
    fn build_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        module_fixtures(dir.path());

        let mut pkg = Package::new(b"print('hi')".to_vec(), hello_metadata());
        pkg.add_module(dir.path().join("helpers.py")).unwrap();
        pkg.add_module(dir.path().join("hellolib")).unwrap();

        assert_eq!(pkg.build().unwrap(), pkg.build().unwrap());
    }

    #[test]
    fn module_order_changes_bytes_not_contents() {
        let dir = tempfile::tempdir().unwrap();
        module_fixtures(dir.path());

        let mut forward = Package::new(b"main".to_vec(), hello_metadata());
        forward.add_module(dir.path().join("helpers.py")).unwrap();
        forward.add_module(dir.path().join("hellolib")).unwrap();

        let mut reverse = Package::new(b"main".to_vec(), hello_metadata());
        reverse.add_module(dir.path().join("hellolib")).unwrap();
        reverse.add_module(dir.path().join("helpers.py")).unwrap();

        let a = forward.build().unwrap();
        let b = reverse.build().unwrap();
        assert_ne!(a, b);

        let mut entries_a = inspect(&a).unwrap().entries;
        let mut entries_b = inspect(&b).unwrap().entries;
        entries_a.sort();
        entries_b.sort();
        assert_eq!(entries_a, entries_b);
        for entry in entries_a.iter().filter(|e| !e.ends_with('/')) {
            assert_eq!(read_entry(&a, entry).unwrap(), read_entry(&b, entry).unwrap());
        }
    }

    #[test]
    fn module_deleted_after_add_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        module_fixtures(dir.path());

        let mut pkg = Package::new(b"".to_vec(), hello_metadata());
        pkg.add_module(dir.path().join("helpers.py")).unwrap();
        fs::remove_file(dir.path().join("helpers.py")).unwrap();

        assert!(matches!(
            pkg.build(),
            Err(PackageError::InvalidModule { path }) if path.ends_with("helpers.py")
        ));
    }

    #[test]
    fn module_shadowing_main_script_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.py"), b"shadow").unwrap();

        let mut pkg = Package::new(b"".to_vec(), hello_metadata());
        pkg.add_module(dir.path().join("hello.py")).unwrap();

        assert!(matches!(
            pkg.build(),
            Err(PackageError::DuplicateEntry { entry }) if entry == "hello.py"
        ));
    }

    #[test]
    fn metadata_can_be_left_out() {
        let pkg = Package::new(b"".to_vec(), hello_metadata());
        let options = BuildOptions {
            bundle_meta: false,
            ..Default::default()
        };
        let bytes = pkg.build_with(&options).unwrap();
        assert!(inspect(&bytes).unwrap().metadata.is_none());
    }

    #[test]
    fn cancelled_build_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        module_fixtures(dir.path());

        let mut pkg = Package::new(b"".to_vec(), hello_metadata());
        pkg.add_module(dir.path().join("hellolib")).unwrap();

        let options = BuildOptions::default();
        options.cancel.cancel();
        assert!(matches!(pkg.build_with(&options), Err(PackageError::Cancelled)));
    }

    #[test]
    fn metadata_at_comment_limit_is_accepted() {
        let base_len = hello_metadata().to_toml().unwrap().len();
        let mut record = hello_metadata().as_record().clone();
        record.insert("doc".into(), "x".repeat(MAX_COMMENT_LEN - base_len));
        let pkg = Package::from_record(b"".to_vec(), record.clone()).unwrap();
        assert_eq!(pkg.metadata().to_toml().unwrap().len(), MAX_COMMENT_LEN);

        let bytes = pkg.build().unwrap();
        assert_eq!(read_metadata(&bytes).unwrap(), *pkg.metadata());

        record.insert("doc".into(), "x".repeat(MAX_COMMENT_LEN - base_len + 1));
        let over = Package::from_record(b"".to_vec(), record).unwrap();
        assert!(matches!(
            over.build(),
            Err(PackageError::MetadataTooLarge { size, .. }) if size == MAX_COMMENT_LEN + 1
        ));
    }

    #[test]
    fn oversized_metadata_is_rejected() {
        let mut record = hello_metadata().as_record().clone();
        record.insert("doc".into(), "x".repeat(MAX_COMMENT_LEN));
        let pkg = Package::from_record(b"".to_vec(), record).unwrap();
        assert!(matches!(
            pkg.build(),
            Err(PackageError::MetadataTooLarge { .. })
        ));
    }
}
