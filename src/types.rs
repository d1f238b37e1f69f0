use std::fmt;
use std::path::{Path, PathBuf};

use toml::{Table, Value};

use crate::tree::ConfigTree;

/// A dot path into a config tree.
///
/// Built from a dotted string (`"database.url"`) or from already-split
/// segments. The empty string and the empty sequence both denote the root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn parse(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::root();
        }
        Self(dotted.split('.').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for KeyPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

impl From<String> for KeyPath {
    fn from(dotted: String) -> Self {
        Self::parse(&dotted)
    }
}

impl From<&String> for KeyPath {
    fn from(dotted: &String) -> Self {
        Self::parse(dotted)
    }
}

impl From<Vec<String>> for KeyPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<Vec<&str>> for KeyPath {
    fn from(segments: Vec<&str>) -> Self {
        Self(segments.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for KeyPath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for KeyPath {
    fn from(segments: [&str; N]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

/// Where a merge layer comes from.
#[derive(Debug, Clone)]
pub enum Source<'a> {
    /// A config file, parsed by the first registered parser that supports it.
    /// The only variant that picks up an environment overlay.
    File(PathBuf),
    /// An in-memory table, used as-is.
    Table(Table),
    /// An in-memory value. Must be a table.
    Value(Value),
    /// Another tree, materialized through [`ConfigTree::all`].
    Tree(&'a ConfigTree),
    /// Process environment variables under `{PREFIX}__`.
    Env(String),
    /// Dotted-key overrides such as `("database.url", "pg://")`.
    Pairs(Vec<(String, Value)>),
}

impl From<PathBuf> for Source<'_> {
    fn from(path: PathBuf) -> Self {
        Source::File(path)
    }
}

impl From<&Path> for Source<'_> {
    fn from(path: &Path) -> Self {
        Source::File(path.to_path_buf())
    }
}

impl From<&str> for Source<'_> {
    fn from(path: &str) -> Self {
        Source::File(PathBuf::from(path))
    }
}

impl From<Table> for Source<'_> {
    fn from(table: Table) -> Self {
        Source::Table(table)
    }
}

impl From<Value> for Source<'_> {
    fn from(value: Value) -> Self {
        Source::Value(value)
    }
}

impl<'a> From<&'a ConfigTree> for Source<'a> {
    fn from(tree: &'a ConfigTree) -> Self {
        Source::Tree(tree)
    }
}

/// How a loaded layer is combined with the existing tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOptions {
    /// Nest the loaded data under this dot path before merging.
    pub root_key: Option<KeyPath>,
    /// Keep existing values on conflicting keys instead of overwriting them.
    pub prefer_existing: bool,
}

impl MergeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn under(root_key: impl Into<KeyPath>) -> Self {
        Self {
            root_key: Some(root_key.into()),
            prefer_existing: false,
        }
    }

    pub fn prefer_existing(mut self) -> Self {
        self.prefer_existing = true;
        self
    }
}
