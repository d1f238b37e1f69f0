//! Helpers over `toml::Value`, the leaf type of every config tree.

use toml::Value;

/// Whether a value counts as "set" for fallback purposes.
///
/// Empty strings, `0`, `0.0`, `false`, empty arrays and empty tables are
/// falsy. Datetimes are always truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::String(s) => !s.is_empty(),
        Value::Integer(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Boolean(b) => *b,
        Value::Array(items) => !items.is_empty(),
        Value::Table(table) => !table.is_empty(),
        Value::Datetime(_) => true,
    }
}

/// Render a value for insertion into surrounding text.
///
/// Strings are inserted verbatim. Compound values fall back to their inline
/// TOML form.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Integer(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Boolean(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Parse a bare scalar literal. Tries: bool → integer → float.
///
/// Returns `None` for anything else, leaving the caller to decide whether a
/// plain string is acceptable.
pub fn parse_scalar(s: &str) -> Option<Value> {
    if s.eq_ignore_ascii_case("true") {
        return Some(Value::Boolean(true));
    }
    if s.eq_ignore_ascii_case("false") {
        return Some(Value::Boolean(false));
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    // Require a dot so "NaN" / "inf" stay strings.
    if s.contains('.')
        && let Ok(f) = s.parse::<f64>()
    {
        return Some(Value::Float(f));
    }
    None
}
