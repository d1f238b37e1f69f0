use toml::Value;

use crate::error::TreefigError;
use crate::resolve::Lookup;
use crate::resolver::PrefixedResolver;

/// Resolves `{{ config:some.path }}` by reading another path of the same tree.
///
/// Reads go through the current [`Lookup`], so a reference that leads back to
/// a path already being read fails with
/// [`CyclicResolution`](TreefigError::CyclicResolution).
pub struct ConfigResolver {
    prefix: String,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    pub fn new() -> Self {
        Self {
            prefix: "config".into(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

impl PrefixedResolver for ConfigResolver {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn resolve_rest(
        &self,
        rest: &str,
        lookup: &mut Lookup<'_>,
    ) -> Result<Option<Value>, TreefigError> {
        lookup.get(rest)
    }
}
