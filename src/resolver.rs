//! Token resolvers: the pluggable units that rewrite `{{ ... }}` tokens.
//!
//! A token is either the whole value (the *complete* form, `"{{ data:x }}"`)
//! or embedded in surrounding text (the *inline* form, `"a {{ data:x }} b"`).
//!
//! - A complete token may resolve to any value type: a list stays a list.
//!   When resolution yields nothing (or a falsy value) the original string is
//!   returned untouched.
//! - Inline tokens are always rendered to text. A token the resolver does not
//!   handle is written back as `{{ body }}` so that a later resolver in the
//!   chain can still act on it.
//!
//! The second rule is what lets resolvers with different prefixes share one
//! string without any of them knowing about the others.

use std::sync::LazyLock;

use regex::Regex;
use toml::Value;

use crate::error::TreefigError;
use crate::resolve::Lookup;
use crate::value::{is_truthy, to_text};

static COMPLETE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\{\{\s*([^{}]*?)\s*\}\}\s*$").expect("valid regex"));

static INLINE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("valid regex"));

/// Turns one token body into a replacement value, or declines.
pub trait Resolver: Send + Sync {
    /// Resolve a trimmed token body. `Ok(None)` means "not handled".
    fn resolve_body(
        &self,
        body: &str,
        lookup: &mut Lookup<'_>,
    ) -> Result<Option<Value>, TreefigError>;

    /// Apply this resolver to a value. Non-strings pass through unchanged.
    fn process(&self, value: Value, lookup: &mut Lookup<'_>) -> Result<Value, TreefigError> {
        let Value::String(text) = value else {
            return Ok(value);
        };
        substitute(text, |body| self.resolve_body(body, lookup))
    }
}

/// A resolver that only answers tokens of the form `prefix:rest`.
///
/// Implementors get [`Resolver`] for free.
pub trait PrefixedResolver: Send + Sync {
    fn prefix(&self) -> &str;

    /// Resolve the trimmed part after `prefix:`.
    fn resolve_rest(
        &self,
        rest: &str,
        lookup: &mut Lookup<'_>,
    ) -> Result<Option<Value>, TreefigError>;
}

impl<T: PrefixedResolver> Resolver for T {
    fn resolve_body(
        &self,
        body: &str,
        lookup: &mut Lookup<'_>,
    ) -> Result<Option<Value>, TreefigError> {
        match body
            .strip_prefix(self.prefix())
            .and_then(|rest| rest.strip_prefix(':'))
        {
            Some(rest) => self.resolve_rest(rest.trim(), lookup),
            None => Ok(None),
        }
    }
}

enum Segment<'t> {
    Literal(&'t str),
    Resolved(String),
    Unresolved(&'t str),
}

/// Rewrite the tokens in `text` using `resolve`.
pub(crate) fn substitute<F>(text: String, mut resolve: F) -> Result<Value, TreefigError>
where
    F: FnMut(&str) -> Result<Option<Value>, TreefigError>,
{
    if !text.contains("{{") {
        return Ok(Value::String(text));
    }

    if let Some(body) = COMPLETE_TOKEN.captures(&text).and_then(|c| c.get(1)) {
        return match resolve(body.as_str())? {
            Some(value) if is_truthy(&value) => Ok(value),
            _ => Ok(Value::String(text)),
        };
    }

    let mut segments = Vec::new();
    let mut cursor = 0;
    for caps in INLINE_TOKEN.captures_iter(&text) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        segments.push(Segment::Literal(&text[cursor..whole.start()]));
        segments.push(match resolve(body.as_str())? {
            Some(value) => Segment::Resolved(to_text(&value)),
            None => Segment::Unresolved(body.as_str()),
        });
        cursor = whole.end();
    }
    segments.push(Segment::Literal(&text[cursor..]));

    let mut out = String::with_capacity(text.len());
    for segment in segments {
        match segment {
            Segment::Literal(s) => out.push_str(s),
            Segment::Resolved(s) => out.push_str(&s),
            Segment::Unresolved(body) => {
                out.push_str("{{ ");
                out.push_str(body);
                out.push_str(" }}");
            }
        }
    }
    Ok(Value::String(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_table(body: &str) -> Result<Option<Value>, TreefigError> {
        Ok(match body {
            "data:x" => Some(Value::String("1".into())),
            "data:y" => Some(Value::String("2".into())),
            "data:list" => Some(Value::Array(vec![
                Value::Integer(1),
                Value::Integer(2),
                Value::Integer(3),
            ])),
            "data:zero" => Some(Value::Integer(0)),
            "data:num" => Some(Value::Integer(42)),
            _ => None,
        })
    }

    fn run(text: &str) -> Value {
        substitute(text.to_string(), lookup_table).unwrap()
    }

    #[test]
    fn plain_string_unchanged() {
        assert_eq!(run("no tokens here"), Value::String("no tokens here".into()));
    }

    #[test]
    fn complete_token_keeps_type() {
        let value = run("{{ data:list }}");
        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    #[test]
    fn complete_token_tolerates_whitespace() {
        assert_eq!(run("  {{data:num}} \n"), Value::Integer(42));
    }

    #[test]
    fn complete_token_unresolved_returns_original() {
        let original = "  {{ foo:bar }} ";
        assert_eq!(run(original), Value::String(original.into()));
    }

    #[test]
    fn complete_token_falsy_returns_original() {
        assert_eq!(run("{{ data:zero }}"), Value::String("{{ data:zero }}".into()));
    }

    #[test]
    fn inline_tokens_concatenate() {
        assert_eq!(
            run("a {{ data:x }} b {{ data:y }} c"),
            Value::String("a 1 b 2 c".into())
        );
    }

    #[test]
    fn inline_tokens_render_to_text() {
        assert_eq!(run("n={{data:num}}"), Value::String("n=42".into()));
        assert_eq!(run("z={{ data:zero }}"), Value::String("z=0".into()));
    }

    #[test]
    fn inline_unresolved_is_rewrapped() {
        assert_eq!(
            run("x {{foo:bar}} {{ data:x }}"),
            Value::String("x {{ foo:bar }} 1".into())
        );
    }

    #[test]
    fn adjacent_tokens() {
        assert_eq!(run("{{ data:x }}{{ data:y }}"), Value::String("12".into()));
    }

    #[test]
    fn braces_inside_body_are_not_tokens() {
        assert_eq!(run("{{ a{b }}"), Value::String("{{ a{b }}".into()));
    }

    #[test]
    fn resolve_errors_propagate() {
        let result = substitute("a {{ boom }}".into(), |_| {
            Err(TreefigError::InvalidInclude("boom".into()))
        });
        assert!(matches!(result, Err(TreefigError::InvalidInclude(_))));
    }

    #[test]
    fn already_resolved_value_is_stable() {
        let once = run("a {{ data:x }} {{ foo:bar }}");
        let Value::String(text) = once.clone() else {
            panic!("expected string");
        };
        assert_eq!(substitute(text, lookup_table).unwrap(), once);
    }
}
