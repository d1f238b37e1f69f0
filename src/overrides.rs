//! Convert dotted-key overrides into a nested `toml::Table`.
//!
//! Each `("database.url", Value)` pair is expanded into the nested table
//! structure needed for deep-merge with the other layers of a tree.

use toml::{Table, Value};

use crate::env::insert_nested;
use crate::types::KeyPath;

/// Convert dotted-key overrides into a nested `toml::Table`.
///
/// `("database.url", Value::String("pg://"))` becomes `{database = {url = "pg://"}}`
///
/// If multiple entries target the same key, the last one wins. Empty keys are
/// skipped.
pub fn overrides_to_table(entries: Vec<(String, Value)>) -> Table {
    let mut table = Table::new();
    for (dotted_key, value) in entries {
        let path = KeyPath::parse(&dotted_key);
        insert_nested(&mut table, path.segments(), value);
    }
    table
}
