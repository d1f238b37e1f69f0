use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use toml::{Table, Value};
use tracing::debug;

use crate::builder::ConfigTreeBuilder;
use crate::error::TreefigError;
use crate::file::FileParser;
use crate::loader::Loader;
use crate::merge::{deep_merge, nest_under};
use crate::resolve::Lookup;
use crate::resolver::Resolver;
use crate::types::{KeyPath, MergeOptions, Source};
use crate::value::is_truthy;

/// A merged configuration tree with an ordered resolver chain.
///
/// Data is layered in with [`merge`](Self::merge) and read back with
/// [`get`](Self::get). Resolvers run on every read; the stored data is never
/// rewritten.
pub struct ConfigTree {
    data: Table,
    resolvers: Vec<Arc<dyn Resolver>>,
    loader: Loader,
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigTree")
            .field("data", &self.data)
            .field("resolvers", &self.resolvers.len())
            .field("environment", &self.loader.environment())
            .finish()
    }
}

impl ConfigTree {
    /// An empty tree with the default parsers, no resolvers and no environment.
    pub fn new() -> Self {
        Self::with_loader(Loader::new())
    }

    pub fn builder() -> ConfigTreeBuilder {
        ConfigTreeBuilder::new()
    }

    pub(crate) fn with_loader(loader: Loader) -> Self {
        Self {
            data: Table::new(),
            resolvers: Vec::new(),
            loader,
        }
    }

    // -- Layering -------------------------------------------------------------

    /// Merge a source into the tree; the new data wins on conflicts.
    pub fn merge<'s>(&mut self, source: impl Into<Source<'s>>) -> Result<(), TreefigError> {
        self.merge_with(source, MergeOptions::default())
    }

    /// Merge a source, optionally nested under a root key and optionally
    /// keeping existing values on conflicts.
    pub fn merge_with<'s>(
        &mut self,
        source: impl Into<Source<'s>>,
        options: MergeOptions,
    ) -> Result<(), TreefigError> {
        let mut data = self.loader.load(source.into())?;
        if let Some(root_key) = &options.root_key {
            data = nest_under(data, root_key);
        }

        let existing = std::mem::take(&mut self.data);
        self.data = if options.prefer_existing {
            deep_merge(data, existing)
        } else {
            deep_merge(existing, data)
        };
        debug!(
            keys = self.data.len(),
            prefer_existing = options.prefer_existing,
            "merged config layer"
        );
        Ok(())
    }

    // -- Reading --------------------------------------------------------------

    /// Read a dot path with resolvers applied.
    ///
    /// Returns `None` only when the path is absent. A present value is
    /// returned even when it is falsy (`false`, `0`, `""`, empty list or
    /// table); use [`get_or`](Self::get_or) for fallback-on-falsy reads.
    pub fn get(&self, path: impl Into<KeyPath>) -> Result<Option<Value>, TreefigError> {
        Lookup::new(self).get(path)
    }

    /// Read a dot path, falling back to `default` when the stored value is
    /// absent **or falsy**.
    ///
    /// `false`, `0`, `0.0`, `""`, `[]` and `{}` all yield `default`. This is
    /// the classic "truthy or default" contract; call [`get`](Self::get) to
    /// tell a stored `false` apart from a missing key.
    ///
    /// Truthiness is judged on the value as stored, before the final resolver
    /// pass: a token string is truthy even if it resolves to `""`.
    pub fn get_or(
        &self,
        path: impl Into<KeyPath>,
        default: impl Into<Value>,
    ) -> Result<Value, TreefigError> {
        Ok(Lookup::new(self)
            .read(path.into(), is_truthy)?
            .unwrap_or_else(|| default.into()))
    }

    /// Read a dot path and deserialize it into `T`.
    pub fn get_as<T: DeserializeOwned>(
        &self,
        path: impl Into<KeyPath>,
    ) -> Result<Option<T>, TreefigError> {
        let path = path.into();
        let Some(value) = self.get(path.clone())? else {
            return Ok(None);
        };
        value
            .try_into()
            .map(Some)
            .map_err(|e: toml::de::Error| TreefigError::InvalidValue {
                key: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// The whole tree with resolvers applied.
    pub fn all(&self) -> Result<Table, TreefigError> {
        Lookup::new(self).resolve_table(self.data.clone())
    }

    /// The merged data as stored, tokens unresolved.
    pub fn raw(&self) -> &Table {
        &self.data
    }

    // -- Resolver chain -------------------------------------------------------

    /// Append a resolver. Resolvers run in registration order.
    pub fn add_resolver(&mut self, resolver: Arc<dyn Resolver>) {
        self.resolvers.push(resolver);
    }

    /// Remove a resolver by identity. Returns whether it was registered.
    pub fn remove_resolver(&mut self, resolver: &Arc<dyn Resolver>) -> bool {
        let before = self.resolvers.len();
        self.resolvers.retain(|r| !Arc::ptr_eq(r, resolver));
        self.resolvers.len() != before
    }

    pub fn resolvers(&self) -> &[Arc<dyn Resolver>] {
        &self.resolvers
    }

    // -- Loader ---------------------------------------------------------------

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn environment(&self) -> Option<&str> {
        self.loader.environment()
    }

    pub fn register_parser(&mut self, parser: Arc<dyn FileParser>) {
        self.loader.register(parser);
    }

    pub fn deregister_parser(&mut self, parser: &Arc<dyn FileParser>) -> bool {
        self.loader.deregister(parser)
    }

    pub fn has_parser(&self, parser: &Arc<dyn FileParser>) -> bool {
        self.loader.has_parser(parser)
    }

    /// Merge a config file. Shorthand for `merge(Source::File(..))`.
    pub fn merge_file(&mut self, path: impl AsRef<Path>) -> Result<(), TreefigError> {
        self.merge(Source::File(path.as_ref().to_path_buf()))
    }
}
