//! A [`ConfigTree`] shared across threads.
//!
//! The whole tree sits behind one reader/writer lock: merges take the write
//! side, reads take the read side. Reads may load files through the include
//! resolver, so they must never overlap a merge of the tree they read from.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use toml::{Table, Value};

use crate::error::TreefigError;
use crate::tree::ConfigTree;
use crate::types::{KeyPath, MergeOptions, Source};

#[derive(Clone, Default)]
pub struct SharedConfig {
    inner: Arc<RwLock<ConfigTree>>,
}

impl From<ConfigTree> for SharedConfig {
    fn from(tree: ConfigTree) -> Self {
        Self::new(tree)
    }
}

impl SharedConfig {
    pub fn new(tree: ConfigTree) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, ConfigTree> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, ConfigTree> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn merge<'s>(&self, source: impl Into<Source<'s>>) -> Result<(), TreefigError> {
        self.write_lock().merge(source)
    }

    pub fn merge_with<'s>(
        &self,
        source: impl Into<Source<'s>>,
        options: MergeOptions,
    ) -> Result<(), TreefigError> {
        self.write_lock().merge_with(source, options)
    }

    pub fn get(&self, path: impl Into<KeyPath>) -> Result<Option<Value>, TreefigError> {
        self.read_lock().get(path)
    }

    pub fn get_or(
        &self,
        path: impl Into<KeyPath>,
        default: impl Into<Value>,
    ) -> Result<Value, TreefigError> {
        self.read_lock().get_or(path, default)
    }

    pub fn all(&self) -> Result<Table, TreefigError> {
        self.read_lock().all()
    }

    /// Run `f` with shared access to the tree.
    pub fn read<R>(&self, f: impl FnOnce(&ConfigTree) -> R) -> R {
        f(&self.read_lock())
    }

    /// Run `f` with exclusive access to the tree, e.g. to change the resolver
    /// chain.
    pub fn write<R>(&self, f: impl FnOnce(&mut ConfigTree) -> R) -> R {
        f(&mut self.write_lock())
    }
}
