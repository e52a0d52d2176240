//! [`ModuleLoader`] implementations.
//!
//! - [`InMemoryLoader`] serves fixed attribute maps, for tests and embedders.
//! - [`ScriptHeaderLoader`] reads module-level dunder string assignments from
//!   script files on disk. It scans source text only and never runs it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{PackageError, Result};
use crate::extract::{ModuleHandle, ModuleLoader};
use crate::module::ModuleLayout;

/// A module handle backed by a plain attribute map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap(pub HashMap<String, String>);

impl ModuleHandle for AttributeMap {
    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get(name).cloned()
    }
}

/// Loader that serves pre-registered attribute maps.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoader {
    modules: HashMap<String, AttributeMap>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` with the given attributes.
    pub fn with_module<I, K, V>(mut self, name: &str, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.modules.insert(name.to_string(), AttributeMap(map));
        self
    }
}

impl ModuleLoader for InMemoryLoader {
    fn load(&self, name: &str, _search_path: Option<&Path>) -> Result<Box<dyn ModuleHandle>> {
        self.modules
            .get(name)
            .cloned()
            .map(|m| Box::new(m) as Box<dyn ModuleHandle>)
            .ok_or_else(|| PackageError::ModuleNotFound {
                name: name.to_string(),
            })
    }
}

/// Attributes declared in a script's header.
///
/// `__name__` starts out as the module name and `__doc__` as the leading
/// docstring; explicit top-level assignments override both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptHeader {
    attributes: AttributeMap,
}

fn assignment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // __attr__ = "value"  or  __attr__ = 'value', unindented, optional trailing comment
        Regex::new(
            r#"(?m)^(__[A-Za-z_][A-Za-z0-9_]*__)[ \t]*=[ \t]*(?:"((?:[^"\\\n]|\\.)*)"|'((?:[^'\\\n]|\\.)*)')[ \t]*(?:#[^\r\n]*)?\r?$"#,
        )
        .expect("assignment pattern is valid")
    })
}

fn docstring_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Leading blank/comment lines, then a triple-quoted string.
        Regex::new(r#"\A(?:[ \t]*(?:#[^\n]*)?\r?\n)*[ \t]*[rR]?(?:"""((?s:.*?))"""|'''((?s:.*?))''')"#)
            .expect("docstring pattern is valid")
    })
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

impl ScriptHeader {
    /// Scan `source` for module-level string attributes.
    pub fn parse(module_name: &str, source: &str) -> Self {
        let mut map = HashMap::new();
        map.insert("__name__".to_string(), module_name.to_string());

        if let Some(caps) = docstring_pattern().captures(source) {
            if let Some(doc) = caps.get(1).or_else(|| caps.get(2)) {
                map.insert("__doc__".to_string(), doc.as_str().trim().to_string());
            }
        }

        for caps in assignment_pattern().captures_iter(source) {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .map(|m| unescape(m.as_str()))
                .unwrap_or_default();
            map.insert(caps[1].to_string(), value);
        }

        ScriptHeader {
            attributes: AttributeMap(map),
        }
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes.0
    }
}

impl ModuleHandle for ScriptHeader {
    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.attribute(name)
    }
}

/// Loader that reads script headers from disk.
///
/// A module `name` resolves to `<dir>/<name>.<ext>` or, failing that,
/// `<dir>/<name>/<init marker>`, trying the per-call search path first and
/// then the configured search paths in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptHeaderLoader {
    search_paths: Vec<PathBuf>,
    layout: ModuleLayout,
}

impl ScriptHeaderLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        ScriptHeaderLoader {
            search_paths,
            layout: ModuleLayout::default(),
        }
    }

    pub fn with_layout(mut self, layout: ModuleLayout) -> Self {
        self.layout = layout;
        self
    }

    fn locate(&self, name: &str, search_path: Option<&Path>) -> Option<PathBuf> {
        search_path
            .into_iter()
            .chain(self.search_paths.iter().map(PathBuf::as_path))
            .flat_map(|dir| {
                [
                    dir.join(self.layout.script_name(name)),
                    dir.join(name).join(&self.layout.init_marker),
                ]
            })
            .find(|candidate| candidate.is_file())
    }
}

impl ModuleLoader for ScriptHeaderLoader {
    fn load(&self, name: &str, search_path: Option<&Path>) -> Result<Box<dyn ModuleHandle>> {
        let path = self
            .locate(name, search_path)
            .ok_or_else(|| PackageError::ModuleNotFound {
                name: name.to_string(),
            })?;
        debug!(module = name, path = %path.display(), "reading script header");

        let bytes = std::fs::read(&path).map_err(|source| PackageError::ModuleIo {
            path: path.clone(),
            source,
        })?;
        let source = String::from_utf8_lossy(&bytes);
        Ok(Box::new(ScriptHeader::parse(name, &source)))
    }
}
