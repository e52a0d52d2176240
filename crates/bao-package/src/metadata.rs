//! Package metadata schema, defaulting, and validation.
//!
//! A metadata record is a flat string-to-string mapping. The schema lists
//! every recognized attribute together with either a default value or the
//! [`FieldDefault::Required`] sentinel. Attributes outside the schema are
//! carried through untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{PackageError, Result};

/// A raw, unvalidated metadata record.
pub type MetadataRecord = BTreeMap<String, String>;

/// Default rule for a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldDefault {
    /// The attribute must be supplied.
    Required,
    /// The attribute falls back to this value when absent.
    Value(&'static str),
}

/// A single schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub default: FieldDefault,
}

impl Field {
    pub const fn required(name: &'static str) -> Self {
        Field {
            name,
            default: FieldDefault::Required,
        }
    }

    pub const fn optional(name: &'static str, default: &'static str) -> Self {
        Field {
            name,
            default: FieldDefault::Value(default),
        }
    }
}

/// The package attribute schema, in canonical order.
pub const PACKAGE_ATTRIBUTES: &[Field] = &[
    Field::required("name"),
    Field::required("author"),
    Field::required("license"),
    Field::required("copyright"),
    Field::required("version"),
    Field::optional("doc", ""),
    Field::optional("maintainer", ""),
    Field::optional("email", ""),
];

/// Fill schema defaults into a copy of `record`.
///
/// Fails with [`PackageError::MissingField`] on the first required attribute
/// that is absent. Applying the result to the same schema again is a no-op.
pub fn fill_defaults(record: &MetadataRecord, schema: &[Field]) -> Result<MetadataRecord> {
    let mut filled = record.clone();
    for field in schema {
        if filled.contains_key(field.name) {
            continue;
        }
        match field.default {
            FieldDefault::Value(default) => {
                filled.insert(field.name.to_string(), default.to_string());
            }
            FieldDefault::Required => {
                return Err(PackageError::MissingField {
                    field: field.name.to_string(),
                });
            }
        }
    }
    Ok(filled)
}

/// A validated package metadata record.
///
/// Every attribute of [`PACKAGE_ATTRIBUTES`] is present and `name` is a
/// non-empty string usable as a file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MetadataRecord", into = "MetadataRecord")]
pub struct PackageMetadata {
    record: MetadataRecord,
}

impl PackageMetadata {
    /// Validate a raw record against [`PACKAGE_ATTRIBUTES`].
    pub fn new(record: MetadataRecord) -> Result<Self> {
        let record = fill_defaults(&record, PACKAGE_ATTRIBUTES)?;

        let name = &record["name"];
        if name.trim().is_empty() {
            return Err(PackageError::MissingField {
                field: "name".to_string(),
            });
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(PackageError::InvalidName { name: name.clone() });
        }

        Ok(PackageMetadata { record })
    }

    /// Build a record from `(key, value)` pairs and validate it.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Parse and validate a TOML metadata block.
    pub fn parse(input: &str) -> Result<Self> {
        let record: MetadataRecord = toml::from_str(input)?;
        Self::new(record)
    }

    /// Serialize this record as a TOML block.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.record)?)
    }

    pub fn name(&self) -> &str {
        &self.record["name"]
    }

    pub fn author(&self) -> &str {
        &self.record["author"]
    }

    pub fn license(&self) -> &str {
        &self.record["license"]
    }

    pub fn copyright(&self) -> &str {
        &self.record["copyright"]
    }

    pub fn version(&self) -> &str {
        &self.record["version"]
    }

    pub fn doc(&self) -> &str {
        &self.record["doc"]
    }

    pub fn maintainer(&self) -> &str {
        &self.record["maintainer"]
    }

    pub fn email(&self) -> &str {
        &self.record["email"]
    }

    /// Look up any attribute, including ones outside the schema.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.record.get(key).map(String::as_str)
    }

    /// Attributes that are not part of [`PACKAGE_ATTRIBUTES`].
    pub fn extras(&self) -> impl Iterator<Item = (&str, &str)> {
        self.record
            .iter()
            .filter(|(k, _)| !PACKAGE_ATTRIBUTES.iter().any(|f| f.name == k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The underlying record.
    pub fn as_record(&self) -> &MetadataRecord {
        &self.record
    }

    /// Non-fatal observations about the record.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if semver::Version::parse(self.version()).is_err() {
            warnings.push(format!(
                "version '{}' is not a semantic version",
                self.version()
            ));
        }

        if self.doc().is_empty() {
            warnings.push("doc is recommended".to_string());
        }

        warnings
    }
}

impl TryFrom<MetadataRecord> for PackageMetadata {
    type Error = PackageError;

    fn try_from(record: MetadataRecord) -> Result<Self> {
        PackageMetadata::new(record)
    }
}

impl From<PackageMetadata> for MetadataRecord {
    fn from(metadata: PackageMetadata) -> Self {
        metadata.record
    }
}
