use std::sync::{PoisonError, RwLock};

use toml::{Table, Value};

use crate::error::TreefigError;
use crate::resolve::Lookup;
use crate::resolver::PrefixedResolver;

/// Resolves `{{ prefix:key }}` from a fixed table. `{{ prefix:* }}` yields the
/// whole table.
///
/// The table can be swapped after the resolver has been registered, which is
/// how request- or run-scoped values are fed into an otherwise static tree.
pub struct DataResolver {
    prefix: String,
    data: RwLock<Table>,
}

impl DataResolver {
    pub fn new(prefix: impl Into<String>, data: Table) -> Self {
        Self {
            prefix: prefix.into(),
            data: RwLock::new(data),
        }
    }

    /// Replace the lookup table.
    pub fn set_data(&self, data: Table) {
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = data;
    }

    pub fn data(&self) -> Table {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PrefixedResolver for DataResolver {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn resolve_rest(
        &self,
        rest: &str,
        _lookup: &mut Lookup<'_>,
    ) -> Result<Option<Value>, TreefigError> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        if rest == "*" {
            return Ok(Some(Value::Table(data.clone())));
        }
        Ok(data.get(rest).cloned())
    }
}
