//! Turn a [`Source`] into a plain table.
//!
//! Files go through the first registered [`FileParser`] that supports them.
//! When an environment tag is set, a file source also picks up its sibling
//! overlay (`app.toml` → `app.{env}.toml`), deep-merged on top of the base.

use std::path::Path;
use std::sync::Arc;

use toml::{Table, Value};
use tracing::{debug, warn};

use crate::env;
use crate::error::TreefigError;
use crate::file::{self, FileParser, JsonParser, TomlParser};
use crate::merge::deep_merge;
use crate::overrides;
use crate::types::Source;

pub struct Loader {
    parsers: Vec<Arc<dyn FileParser>>,
    environment: Option<String>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// A loader with the built-in parsers registered and no environment.
    pub fn new() -> Self {
        let mut loader = Self::empty();
        loader.register(Arc::new(TomlParser));
        loader.register(Arc::new(JsonParser));
        #[cfg(feature = "yaml")]
        loader.register(Arc::new(file::YamlParser));
        loader
    }

    /// A loader with no parsers at all.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
            environment: None,
        }
    }

    pub fn environment(&self) -> Option<&str> {
        self.environment.as_deref()
    }

    pub fn set_environment(&mut self, environment: Option<String>) {
        self.environment = environment;
    }

    /// Append a parser. Earlier registrations take priority.
    pub fn register(&mut self, parser: Arc<dyn FileParser>) {
        self.parsers.push(parser);
    }

    /// Remove a previously registered parser. Returns whether it was present.
    pub fn deregister(&mut self, parser: &Arc<dyn FileParser>) -> bool {
        let before = self.parsers.len();
        self.parsers.retain(|p| !Arc::ptr_eq(p, parser));
        self.parsers.len() != before
    }

    pub fn has_parser(&self, parser: &Arc<dyn FileParser>) -> bool {
        self.parsers.iter().any(|p| Arc::ptr_eq(p, parser))
    }

    pub fn parsers(&self) -> &[Arc<dyn FileParser>] {
        &self.parsers
    }

    /// Load a source into a plain table.
    pub fn load(&self, source: Source<'_>) -> Result<Table, TreefigError> {
        match source {
            Source::File(path) => self.load_file(&path),
            Source::Table(table) => Ok(table),
            Source::Value(Value::Table(table)) => Ok(table),
            Source::Value(other) => Err(TreefigError::InvalidSource(format!(
                "expected a table, got {}",
                other.type_str()
            ))),
            Source::Tree(tree) => tree.all(),
            Source::Env(prefix) => Ok(env::env_to_table(&prefix, std::env::vars())),
            Source::Pairs(pairs) => Ok(overrides::overrides_to_table(pairs)),
        }
    }

    /// Parse a file and, when an environment is set, merge its overlay on top.
    pub fn load_file(&self, path: &Path) -> Result<Table, TreefigError> {
        let base = self.parse_file(path)?;
        let Some(environment) = &self.environment else {
            return Ok(base);
        };

        let overlay_path = file::overlay_path(path, environment);
        let overlay = self.parse_file(&overlay_path)?;
        if !overlay.is_empty() {
            debug!(
                path = %overlay_path.display(),
                environment = %environment,
                "applying environment overlay"
            );
        }
        Ok(deep_merge(base, overlay))
    }

    /// Parse a single file with the first supporting parser, without overlays.
    /// Unsupported files yield an empty table.
    pub fn parse_file(&self, path: &Path) -> Result<Table, TreefigError> {
        let Some(parser) = self.parsers.iter().find(|p| p.supports(path)) else {
            warn!(path = %path.display(), "no registered parser supports this file");
            return Ok(Table::new());
        };
        debug!(path = %path.display(), parser = parser.name(), "loading config file");
        parser.parse(path)
    }
}
