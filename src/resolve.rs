//! Read-time resolution: walking a dot path and running the resolver chain.
//!
//! Every top-level read creates one [`Lookup`]. Resolvers receive it so they
//! can re-enter the tree (self references) or reach its loader (includes)
//! while the lookup tracks what is in flight:
//!
//! 1. Each dot path being read is recorded. Reading a path that is already
//!    being read fails with [`TreefigError::CyclicResolution`].
//! 2. A token that expands into a table or array starts a new level of
//!    expansion. At most [`MAX_DEPTH`] such levels may nest. This catches
//!    cycles that do not go through a path, such as a file including itself.
//!    Plain nesting of tables in the data never counts.

use std::borrow::Cow;

use toml::{Table, Value};

use crate::error::TreefigError;
use crate::loader::Loader;
use crate::tree::ConfigTree;
use crate::types::KeyPath;

/// Maximum nesting of token expansions before a read is declared cyclic.
pub const MAX_DEPTH: usize = 64;

/// Resolution context for one read of a [`ConfigTree`].
pub struct Lookup<'a> {
    tree: &'a ConfigTree,
    in_flight: Vec<KeyPath>,
    depth: usize,
}

impl<'a> Lookup<'a> {
    pub(crate) fn new(tree: &'a ConfigTree) -> Self {
        Self {
            tree,
            in_flight: Vec::new(),
            depth: 0,
        }
    }

    /// The loader of the tree being read.
    pub fn loader(&self) -> &'a Loader {
        self.tree.loader()
    }

    /// Read a dot path from the tree being resolved, resolvers applied.
    ///
    /// Returns `None` when the path is absent. Falsy values are returned
    /// as-is.
    pub fn get(&mut self, path: impl Into<KeyPath>) -> Result<Option<Value>, TreefigError> {
        self.read(path.into(), |_| true)
    }

    /// Read a dot path, skipping the final resolver pass (and returning
    /// `None`) when the stored value fails `keep`.
    pub(crate) fn read(
        &mut self,
        path: KeyPath,
        keep: impl FnOnce(&Value) -> bool,
    ) -> Result<Option<Value>, TreefigError> {
        if self.in_flight.contains(&path) {
            return Err(self.cycle(&path.to_string()));
        }

        self.in_flight.push(path.clone());
        let result = self.read_in_flight(&path, keep);
        self.in_flight.pop();
        result
    }

    fn read_in_flight(
        &mut self,
        path: &KeyPath,
        keep: impl FnOnce(&Value) -> bool,
    ) -> Result<Option<Value>, TreefigError> {
        let Some(value) = self.walk(path)? else {
            return Ok(None);
        };
        if !keep(&value) {
            return Ok(None);
        }
        self.resolve(value.into_owned()).map(Some)
    }

    /// Walk to the value at `path`, resolving strings met on the way but not
    /// the value found at the end.
    fn walk(&mut self, path: &KeyPath) -> Result<Option<Cow<'a, Value>>, TreefigError> {
        let tree = self.tree;
        let Some((first, rest)) = path.segments().split_first() else {
            return Ok(Some(Cow::Owned(Value::Table(tree.raw().clone()))));
        };

        let mut current: Option<Cow<'a, Value>> = tree.raw().get(first.as_str()).map(Cow::Borrowed);
        for key in rest {
            let Some(value) = current else {
                return Ok(None);
            };
            // A string met mid-path may expand into a sub-tree.
            let value = if value.is_str() {
                Cow::Owned(self.resolve(value.into_owned())?)
            } else {
                value
            };
            current = match value {
                Cow::Borrowed(Value::Table(table)) => table.get(key.as_str()).map(Cow::Borrowed),
                Cow::Owned(Value::Table(mut table)) => table.remove(key.as_str()).map(Cow::Owned),
                _ => None,
            };
        }
        Ok(current)
    }

    /// Run the whole resolver chain over a value.
    ///
    /// Tables and arrays are resolved entry by entry after the value itself,
    /// so a token that expands into a table gets its contents resolved too.
    pub fn resolve(&mut self, value: Value) -> Result<Value, TreefigError> {
        let tree = self.tree;
        let was_token = value.is_str();
        let mut value = value;
        for resolver in tree.resolvers() {
            value = resolver.process(value, self)?;
        }

        if was_token && (value.is_table() || value.is_array()) {
            self.expand(value)
        } else {
            self.resolve_entries(value)
        }
    }

    /// Resolve every entry of a table.
    pub fn resolve_table(&mut self, table: Table) -> Result<Table, TreefigError> {
        table
            .into_iter()
            .map(|(key, value)| self.resolve(value).map(|value| (key, value)))
            .collect()
    }

    fn expand(&mut self, value: Value) -> Result<Value, TreefigError> {
        if self.depth >= MAX_DEPTH {
            let mut chain: Vec<String> = self.in_flight.iter().map(ToString::to_string).collect();
            chain.push(format!("token expansion nested deeper than {MAX_DEPTH} levels"));
            return Err(TreefigError::CyclicResolution(chain.join(" -> ")));
        }

        self.depth += 1;
        let result = self.resolve_entries(value);
        self.depth -= 1;
        result
    }

    fn resolve_entries(&mut self, value: Value) -> Result<Value, TreefigError> {
        match value {
            Value::Table(table) => Ok(Value::Table(self.resolve_table(table)?)),
            Value::Array(items) => Ok(Value::Array(
                items
                    .into_iter()
                    .map(|item| self.resolve(item))
                    .collect::<Result<_, _>>()?,
            )),
            other => Ok(other),
        }
    }

    fn cycle(&self, at: &str) -> TreefigError {
        let mut chain: Vec<String> = self.in_flight.iter().map(ToString::to_string).collect();
        chain.push(at.to_string());
        TreefigError::CyclicResolution(chain.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::table;
    use crate::resolver::Resolver;
    use crate::types::Source;
    use std::sync::Arc;

    /// Expands `{{ nest }}` into a table containing another `{{ nest }}`.
    struct Nesting;

    impl Resolver for Nesting {
        fn resolve_body(
            &self,
            body: &str,
            _lookup: &mut Lookup<'_>,
        ) -> Result<Option<Value>, TreefigError> {
            Ok((body == "nest").then(|| Value::Table(table(r#"inner = "{{ nest }}""#))))
        }
    }

    #[test]
    fn unbounded_expansion_is_cyclic() {
        let mut tree = ConfigTree::new();
        tree.add_resolver(Arc::new(Nesting));
        tree.merge(Source::Table(table(r#"root = "{{ nest }}""#)))
            .unwrap();
        let err = tree.get("root").unwrap_err();
        assert!(matches!(err, TreefigError::CyclicResolution(_)));
        assert!(err.to_string().contains("root -> token expansion nested deeper"));
    }

    #[test]
    fn deep_plain_tables_are_not_cyclic() {
        let mut data = table("leaf = 1");
        for _ in 0..(MAX_DEPTH + 6) {
            let mut parent = Table::new();
            parent.insert("n".into(), Value::Table(data));
            data = parent;
        }
        let mut tree = ConfigTree::new();
        tree.add_resolver(Arc::new(Nesting));
        tree.merge(Source::Table(data)).unwrap();

        assert!(tree.all().is_ok());
        let mut path = vec!["n"; MAX_DEPTH + 6];
        path.push("leaf");
        assert_eq!(tree.get(path).unwrap(), Some(Value::Integer(1)));
    }

    #[test]
    fn nested_tables_and_arrays_resolved() {
        let mut tree = ConfigTree::new();
        tree.add_resolver(Arc::new(Nesting));
        tree.merge(Source::Table(table(
            r#"
            list = ["plain", 3]
            [a]
            b = { c = "text" }
            "#,
        )))
        .unwrap();
        let mut lookup = Lookup::new(&tree);
        let all = lookup.resolve_table(tree.raw().clone()).unwrap();
        assert_eq!(all["a"]["b"]["c"].as_str(), Some("text"));
        assert_eq!(all["list"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn in_flight_path_rereads_are_cyclic() {
        let tree = ConfigTree::new();
        let mut lookup = Lookup::new(&tree);
        lookup.in_flight.push("a.b".into());
        let err = lookup.get("a.b").unwrap_err();
        assert!(err.to_string().contains("a.b -> a.b"));
    }

    #[test]
    fn dotted_key_and_nested_path_are_distinct_in_flight() {
        let tree = ConfigTree::new();
        let mut lookup = Lookup::new(&tree);
        lookup.in_flight.push(KeyPath::from(["a.b"]));
        assert_eq!(lookup.get("a.b").unwrap(), None);
    }
}
