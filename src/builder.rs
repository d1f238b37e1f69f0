use std::sync::Arc;

use crate::file::FileParser;
use crate::loader::Loader;
use crate::resolver::Resolver;
use crate::tree::ConfigTree;

/// Builder for a [`ConfigTree`].
///
/// Fixes the environment, parser registry and resolver chain up front, which
/// is the usual way to set a tree up before any data is merged in.
///
/// ```ignore
/// let tree = ConfigTree::builder()
///     .environment_from_var("APP_ENV")
///     .resolver(Arc::new(ConfigResolver::new()))
///     .build();
/// ```
pub struct ConfigTreeBuilder {
    environment: Option<String>,
    default_parsers: bool,
    parsers: Vec<Arc<dyn FileParser>>,
    resolvers: Vec<Arc<dyn Resolver>>,
}

impl Default for ConfigTreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigTreeBuilder {
    pub fn new() -> Self {
        Self {
            environment: None,
            default_parsers: true,
            parsers: Vec::new(),
            resolvers: Vec::new(),
        }
    }

    /// Set the environment tag used to find overlay files.
    pub fn environment(mut self, environment: &str) -> Self {
        self.environment = Some(environment.to_string());
        self
    }

    /// Take the environment tag from an environment variable, if it is set
    /// and non-empty. Leaves any previous value otherwise.
    pub fn environment_from_var(self, var: &str) -> Self {
        self.environment_from(std::env::var(var).ok())
    }

    fn environment_from(mut self, value: Option<String>) -> Self {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.environment = Some(value.trim().to_string());
        }
        self
    }

    /// Append a resolver to the chain. Registration order is resolution order.
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolvers.push(resolver);
        self
    }

    /// Register an additional file parser after the built-in ones.
    pub fn parser(mut self, parser: Arc<dyn FileParser>) -> Self {
        self.parsers.push(parser);
        self
    }

    /// Start from an empty parser registry instead of the built-in parsers.
    pub fn no_default_parsers(mut self) -> Self {
        self.default_parsers = false;
        self
    }

    pub fn build(self) -> ConfigTree {
        let mut loader = if self.default_parsers {
            Loader::new()
        } else {
            Loader::empty()
        };
        for parser in self.parsers {
            loader.register(parser);
        }
        loader.set_environment(self.environment);

        let mut tree = ConfigTree::with_loader(loader);
        for resolver in self.resolvers {
            tree.add_resolver(resolver);
        }
        tree
    }
}
