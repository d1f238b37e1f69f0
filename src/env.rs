use toml::{Table, Value};

use crate::value::parse_scalar;

/// Build a table from environment variables matching `{PREFIX}__*`.
///
/// Double underscore `__` separates nesting levels.
/// Single `_` within a segment is literal (part of the key).
/// Segments are lowercased.
///
/// Values are parsed heuristically: bool > integer > float > string.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_to_table(prefix: &str, vars: impl IntoIterator<Item = (String, String)>) -> Table {
    let needle = format!("{prefix}__");
    let mut table = Table::new();

    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(&needle) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }

        let segments: Vec<String> = rest.split("__").map(str::to_lowercase).collect();
        let value = parse_scalar(&value).unwrap_or(Value::String(value));
        insert_nested(&mut table, &segments, value);
    }

    table
}

/// Insert `value` at the nested location named by `segments`, creating
/// intermediate tables. A scalar sitting where a table is needed is replaced.
pub(crate) fn insert_nested(table: &mut Table, segments: &[String], value: Value) {
    let Some((leaf, parents)) = segments.split_last() else {
        return;
    };

    let mut current = table;
    for segment in parents {
        let slot = current
            .entry(segment.as_str())
            .or_insert_with(|| Value::Table(Table::new()));
        if !slot.is_table() {
            *slot = Value::Table(Table::new());
        }
        let Value::Table(next) = slot else {
            return;
        };
        current = next;
    }

    current.insert(leaf.clone(), value);
}
