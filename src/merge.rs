use toml::{Table, Value};

use crate::types::KeyPath;

/// Deep-merge `overlay` on top of `base`.
/// If both sides have a Table for the same key, recurse.
/// Otherwise, `overlay`'s value wins. Arrays are replaced, not concatenated.
pub fn deep_merge(mut base: Table, overlay: Table) -> Table {
    for (key, overlay_val) in overlay {
        match (base.remove(&key), overlay_val) {
            (Some(Value::Table(base_tbl)), Value::Table(overlay_tbl)) => {
                base.insert(key, Value::Table(deep_merge(base_tbl, overlay_tbl)));
            }
            (_, overlay_val) => {
                base.insert(key, overlay_val);
            }
        }
    }
    base
}

/// Wrap `data` so that it sits at `root_key`.
///
/// A root key of `a.b` turns `{x = 1}` into `{a = {b = {x = 1}}}`. Segments
/// are applied innermost first.
pub fn nest_under(data: Table, root_key: &KeyPath) -> Table {
    root_key
        .segments()
        .iter()
        .rev()
        .fold(data, |inner, segment| {
            let mut outer = Table::new();
            outer.insert(segment.clone(), Value::Table(inner));
            outer
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(toml_str: &str) -> Table {
        toml_str.parse::<Table>().unwrap()
    }

    #[test]
    fn disjoint_keys_merge() {
        let base = table(r#"host = "localhost""#);
        let overlay = table("port = 3000");
        let merged = deep_merge(base, overlay);
        assert_eq!(merged["host"].as_str().unwrap(), "localhost");
        assert_eq!(merged["port"].as_integer().unwrap(), 3000);
    }

    #[test]
    fn same_scalar_key_overlay_wins() {
        let merged = deep_merge(table("port = 8080"), table("port = 3000"));
        assert_eq!(merged["port"].as_integer().unwrap(), 3000);
    }

    #[test]
    fn nested_tables_recurse() {
        let base = table(
            r#"
            [database]
            url = "postgres://old"
            pool_size = 5
            "#,
        );
        let overlay = table(
            r#"
            [database]
            pool_size = 20
            "#,
        );
        let merged = deep_merge(base, overlay);
        let db = merged["database"].as_table().unwrap();
        assert_eq!(db["url"].as_str().unwrap(), "postgres://old");
        assert_eq!(db["pool_size"].as_integer().unwrap(), 20);
    }

    #[test]
    fn arrays_are_replaced_wholesale() {
        let merged = deep_merge(table("hosts = [1, 2, 3]"), table("hosts = [9]"));
        assert_eq!(merged["hosts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn overlay_scalar_replaces_table() {
        let base = table(
            r#"
            [database]
            url = "x"
            "#,
        );
        let merged = deep_merge(base, table(r#"database = "flat_string""#));
        assert_eq!(merged["database"].as_str().unwrap(), "flat_string");
    }

    #[test]
    fn empty_overlay_returns_base() {
        let base = table("port = 8080");
        assert_eq!(deep_merge(base.clone(), Table::new()), base);
    }

    #[test]
    fn nest_under_single_segment() {
        let nested = nest_under(table("x = 1"), &KeyPath::from("db"));
        assert_eq!(nested["db"]["x"].as_integer().unwrap(), 1);
    }

    #[test]
    fn nest_under_innermost_segment_closest_to_data() {
        let nested = nest_under(table("x = 1"), &KeyPath::from("a.b.c"));
        assert_eq!(nested.len(), 1);
        assert_eq!(nested["a"]["b"]["c"]["x"].as_integer().unwrap(), 1);
    }

    #[test]
    fn nest_under_root_is_identity() {
        let data = table("x = 1");
        assert_eq!(nest_under(data.clone(), &KeyPath::root()), data);
    }
}
