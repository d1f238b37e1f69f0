//! Hierarchical configuration trees with environment overlays and pluggable
//! token resolvers.
//!
//! Treefig loads nested configuration from files, in-memory tables and
//! environment variables, deep-merges the layers into one [`ConfigTree`], and
//! rewrites `{{ ... }}` tokens in string values on every read.
//!
//! ```ignore
//! let mut tree = ConfigTree::builder()
//!     .environment("prod")
//!     .resolver(Arc::new(ConfigResolver::new()))
//!     .build();
//! tree.merge_file("conf/app.toml")?;
//!
//! let url = tree.get("database.url")?;
//! ```
//!
//! # Layers
//!
//! Each [`merge`](ConfigTree::merge) loads a [`Source`] into a plain table and
//! deep-merges it into the tree:
//!
//! - Tables merge key by key, recursively.
//! - Scalars and arrays are replaced wholesale.
//! - By default the new layer wins. [`MergeOptions::prefer_existing`] flips
//!   that, which is how fallback defaults are layered in after the fact.
//! - [`MergeOptions::under`] nests the whole layer under a dot path first.
//!
//! | Source | Loaded as |
//! |--------|-----------|
//! | `File(path)` | parsed by the first supporting [`FileParser`], plus overlay |
//! | `Table(t)` / `Value(v)` | used as-is (`v` must be a table) |
//! | `Tree(&t)` | `t.all()`, i.e. fully resolved |
//! | `Env(prefix)` | `PREFIX__A__B=v` → `{a = {b = v}}` |
//! | `Pairs(..)` | `("a.b", v)` → `{a = {b = v}}` |
//!
//! # Environment overlays
//!
//! With an environment tag set (say `prod`), loading `conf/app.toml` also
//! loads `conf/app.prod.toml` when it exists and deep-merges it on top. The
//! overlay only needs the keys that differ. Overlays apply to file sources
//! only, including files pulled in by [`IncludeResolver`].
//!
//! # Tokens
//!
//! A string value may carry tokens. Two forms are recognised:
//!
//! - **Complete**: the token is the entire value, e.g. `"{{ data:ports }}"`.
//!   The replacement keeps its type, so a list stays a list and a table can
//!   stand in for a whole sub-tree.
//! - **Inline**: the token sits in surrounding text, e.g.
//!   `"pg://{{ config:db.host }}/app"`. The replacement is rendered as text.
//!
//! Resolvers run in registration order, each one over the output of the
//! previous one. A resolver that does not recognise a token leaves it exactly
//! as written (`{{ body }}`), so a later resolver can still pick it up. Tokens
//! nobody recognises survive the read unchanged.
//!
//! Built-in resolvers, all [`PrefixedResolver`]s:
//!
//! | Resolver | Token | Result |
//! |----------|-------|--------|
//! | [`DataResolver`] | `{{ data:key }}`, `{{ data:* }}` | entry of a replaceable table |
//! | [`ConfigResolver`] | `{{ config:a.b }}` | another path of the same tree |
//! | [`CallResolver`] | `{{ call:name('x', 1) }}` | a registered host function |
//! | [`IncludeResolver`] | `{{ include:$root/file.toml }}` | another file, as a table |
//!
//! A string met in the middle of a dot path is resolved before it is indexed,
//! so `tree.get("db.host")` works when `db` is `"{{ include:$app/db.toml }}"`.
//!
//! # Reads never mutate
//!
//! Resolution happens at read time only; [`raw`](ConfigTree::raw) always shows
//! the merged data as written. A [`DataResolver`] swapped to new data is
//! picked up by the next read.
//!
//! # Absent versus falsy
//!
//! [`get`](ConfigTree::get) returns `None` only for absent paths, so a stored
//! `false` comes back as `Some(false)`. [`get_or`](ConfigTree::get_or) keeps
//! the "truthy or default" contract: `false`, `0`, `""`, `[]` and `{}` all
//! yield the default. Pick the one whose semantics you want. `get_or` judges
//! the value as stored, before the final resolver pass, so a token string that
//! resolves to `""` is returned rather than replaced.
//!
//! # Error handling
//!
//! All fallible operations return [`TreefigError`]. Misses are not errors: an
//! absent key is `None`, an unknown token is left in place, a missing file or
//! overlay loads as an empty table. Authoring mistakes are errors and abort
//! the read: a malformed include or call token, an unknown root alias, a
//! syntax error in a file, or a token chain that refers back to itself
//! ([`TreefigError::CyclicResolution`]).
//!
//! # Threads
//!
//! A [`ConfigTree`] is `Send + Sync`. To merge and read one tree from several
//! threads, wrap it in a [`SharedConfig`], which puts the whole tree behind a
//! single reader/writer lock.

pub mod error;
pub mod types;

mod builder;
mod call;
mod data;
mod env;
mod file;
mod include;
mod loader;
pub(crate) mod merge;
mod overrides;
mod reference;
mod resolve;
mod resolver;
mod shared;
mod tree;
mod value;

#[cfg(test)]
mod fixtures;

pub use builder::ConfigTreeBuilder;
pub use call::{CallResolver, HostFn};
pub use data::DataResolver;
pub use error::TreefigError;
#[cfg(feature = "yaml")]
pub use file::YamlParser;
pub use file::{FileParser, JsonParser, TomlParser};
pub use include::{IncludeResolver, RESOURCE_DIR};
pub use loader::Loader;
pub use merge::deep_merge;
pub use reference::ConfigResolver;
pub use resolve::{Lookup, MAX_DEPTH};
pub use resolver::{PrefixedResolver, Resolver};
pub use shared::SharedConfig;
pub use tree::ConfigTree;
pub use types::{KeyPath, MergeOptions, Source};
pub use value::is_truthy;
