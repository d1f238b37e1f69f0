//! Cross-file inclusion: `{{ include:$alias/relative/path.toml }}`.
//!
//! `alias` names a root directory registered up front. The file is looked up
//! under that root's resource directory (`resources` by default) and loaded
//! through the tree's [`Loader`](crate::Loader), so the environment overlay
//! applies to included files as well.
//!
//! A missing target loads as an empty table, which leaves a complete token in
//! place. A malformed token or an unknown alias fails the read: both mean the
//! config file itself is wrong.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use toml::Value;
use tracing::debug;

use crate::error::TreefigError;
use crate::resolve::Lookup;
use crate::resolver::PrefixedResolver;
use crate::types::Source;

static INCLUDE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$([A-Za-z0-9_-]+)/([^\s]+)$").expect("valid regex")
});

/// Conventional subdirectory of every root that holds includable files.
pub const RESOURCE_DIR: &str = "resources";

pub struct IncludeResolver {
    prefix: String,
    roots: BTreeMap<String, PathBuf>,
    resource_dir: String,
}

impl IncludeResolver {
    pub fn new<K, P>(roots: impl IntoIterator<Item = (K, P)>) -> Self
    where
        K: Into<String>,
        P: Into<PathBuf>,
    {
        Self {
            prefix: "include".into(),
            roots: roots
                .into_iter()
                .map(|(alias, dir)| (alias.into(), dir.into()))
                .collect(),
            resource_dir: RESOURCE_DIR.into(),
        }
    }

    /// Roots for the platform directories of `app_name`: `config` and `data`.
    ///
    /// Either alias is left out when the platform has no such directory
    /// (e.g. no home directory).
    pub fn platform(app_name: &str) -> Self {
        let mut roots = BTreeMap::new();
        if let Some(proj) = directories::ProjectDirs::from("", "", app_name) {
            roots.insert("config".to_string(), proj.config_dir().to_path_buf());
            roots.insert("data".to_string(), proj.data_dir().to_path_buf());
        }
        Self::new(roots)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Change the subdirectory looked up under each root. An empty name
    /// resolves paths directly against the root.
    pub fn resource_dir(mut self, dir: impl Into<String>) -> Self {
        self.resource_dir = dir.into();
        self
    }

    pub fn roots(&self) -> &BTreeMap<String, PathBuf> {
        &self.roots
    }

    /// Map an include token to the file it names.
    pub fn target(&self, token: &str) -> Result<PathBuf, TreefigError> {
        let caps = INCLUDE_TOKEN
            .captures(token)
            .ok_or_else(|| TreefigError::InvalidInclude(token.to_string()))?;
        let (Some(alias), Some(relative)) = (caps.get(1), caps.get(2)) else {
            return Err(TreefigError::InvalidInclude(token.to_string()));
        };

        let root = self
            .roots
            .get(alias.as_str())
            .ok_or_else(|| TreefigError::UnknownRootAlias {
                alias: alias.as_str().to_string(),
                token: token.to_string(),
            })?;

        let mut path = root.clone();
        if !self.resource_dir.is_empty() {
            path.push(&self.resource_dir);
        }
        path.extend(relative.as_str().split('/').filter(|s| !s.is_empty()));
        Ok(path)
    }
}

impl PrefixedResolver for IncludeResolver {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn resolve_rest(
        &self,
        rest: &str,
        lookup: &mut Lookup<'_>,
    ) -> Result<Option<Value>, TreefigError> {
        let path = self.target(rest)?;
        debug!(path = %path.display(), "including config file");
        let table = lookup.loader().load(Source::File(path))?;
        Ok(Some(Value::Table(table)))
    }
}
