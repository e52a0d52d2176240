//! Metadata extraction from a script's module-level attributes.
//!
//! Scripts declare their metadata with dunder assignments such as
//! `__author__ = "..."`. Loading the script is delegated to a
//! [`ModuleLoader`]; this module only turns the resulting handle into a
//! metadata record.

use std::path::Path;

use crate::error::{PackageError, Result};
use crate::metadata::{Field, FieldDefault, MetadataRecord, PackageMetadata, PACKAGE_ATTRIBUTES};

/// A loaded module exposing named attributes.
pub trait ModuleHandle {
    /// Value of the module-level attribute `name` (e.g. `__author__`).
    fn attribute(&self, name: &str) -> Option<String>;
}

/// Loads a module by name, optionally looking in an extra search path first.
pub trait ModuleLoader {
    /// Fails with [`PackageError::ModuleNotFound`] if no such module exists.
    fn load(&self, name: &str, search_path: Option<&Path>) -> Result<Box<dyn ModuleHandle>>;
}

/// The attribute name that carries schema field `field`.
pub fn header_attribute(field: &str) -> String {
    format!("__{field}__")
}

/// Derive a record for `schema` from a loaded module.
pub fn extract_record(handle: &dyn ModuleHandle, schema: &[Field]) -> Result<MetadataRecord> {
    let mut record = MetadataRecord::new();

    for field in schema {
        let value = match (handle.attribute(&header_attribute(field.name)), field.default) {
            (Some(value), _) => value,
            (None, FieldDefault::Value(default)) => default.to_string(),
            (None, FieldDefault::Required) => {
                return Err(PackageError::MissingField {
                    field: field.name.to_string(),
                });
            }
        };
        record.insert(field.name.to_string(), value);
    }

    Ok(record)
}

/// Load `module` through `loader` and derive validated package metadata.
pub fn extract(
    loader: &dyn ModuleLoader,
    module: &str,
    search_path: Option<&Path>,
) -> Result<PackageMetadata> {
    let handle = loader.load(module, search_path)?;
    let record = extract_record(handle.as_ref(), PACKAGE_ATTRIBUTES)?;
    PackageMetadata::new(record)
}

/// Like [`extract`], but values in `overrides` take precedence over the
/// module's attributes and may supply fields the module lacks.
pub fn extract_with_overrides(
    loader: &dyn ModuleLoader,
    module: &str,
    search_path: Option<&Path>,
    overrides: &MetadataRecord,
) -> Result<PackageMetadata> {
    let handle = loader.load(module, search_path)?;
    let mut record = overrides.clone();
    for field in PACKAGE_ATTRIBUTES {
        if record.contains_key(field.name) {
            continue;
        }
        if let Some(value) = handle.attribute(&header_attribute(field.name)) {
            record.insert(field.name.to_string(), value);
        }
    }
    PackageMetadata::new(record)
}
