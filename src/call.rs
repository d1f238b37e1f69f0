//! Host calls: `{{ call:name(arg, arg, ...) }}`.
//!
//! The host registers named functions up front; a token picks one by name and
//! passes literal arguments. Supported literals:
//!
//! | Literal | Value |
//! |---------|-------|
//! | `'text'`, `"text"` | string (`\` escapes the next character) |
//! | `true`, `false` | boolean |
//! | `42`, `-7` | integer |
//! | `1.5` | float |
//!
//! A malformed expression is an authoring error and fails the read. A name
//! with no registered function is a soft miss: the token is left for later
//! resolvers.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use toml::Value;
use tracing::trace;

use crate::error::TreefigError;
use crate::resolve::Lookup;
use crate::resolver::PrefixedResolver;
use crate::value::parse_scalar;

static CALL_EXPR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*\((.*)\)\s*$").expect("valid regex")
});

/// A host function callable from config. `None` declines the call.
pub type HostFn = dyn Fn(&[Value]) -> Option<Value> + Send + Sync;

pub struct CallResolver {
    prefix: String,
    functions: HashMap<String, Arc<HostFn>>,
}

impl Default for CallResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CallResolver {
    pub fn new() -> Self {
        Self {
            prefix: "call".into(),
            functions: HashMap::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Register a function under `name`, replacing any previous one.
    pub fn function<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Option<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(f));
        self
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}

impl PrefixedResolver for CallResolver {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn resolve_rest(
        &self,
        rest: &str,
        _lookup: &mut Lookup<'_>,
    ) -> Result<Option<Value>, TreefigError> {
        let (name, args) = parse_call(rest)?;
        let Some(function) = self.functions.get(name) else {
            trace!(function = name, "no host function registered");
            return Ok(None);
        };
        Ok(function(&args))
    }
}

/// Split `name(a, b)` into the name and its parsed arguments.
pub fn parse_call(expr: &str) -> Result<(&str, Vec<Value>), TreefigError> {
    let invalid = |reason: &str| TreefigError::InvalidCall {
        expr: expr.to_string(),
        reason: reason.to_string(),
    };

    let caps = CALL_EXPR
        .captures(expr)
        .ok_or_else(|| invalid("expected 'name(arg, ...)'"))?;
    let (Some(name), Some(args)) = (caps.get(1), caps.get(2)) else {
        return Err(invalid("expected 'name(arg, ...)'"));
    };

    let args = split_args(args.as_str()).map_err(|reason| invalid(&reason))?;
    Ok((name.as_str(), args))
}

/// Scan a comma-separated argument list, honoring quotes.
fn split_args(list: &str) -> Result<Vec<Value>, String> {
    let mut args = Vec::new();
    if list.trim().is_empty() {
        return Ok(args);
    }

    let mut chars = list.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let arg = match chars.peek().copied() {
            Some(quote @ ('\'' | '"')) => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('\\') => match chars.next() {
                            Some(escaped) => text.push(escaped),
                            None => return Err("unterminated string".into()),
                        },
                        Some(c) if c == quote => break,
                        Some(c) => text.push(c),
                        None => return Err("unterminated string".into()),
                    }
                }
                Value::String(text)
            }
            Some(',') | None => return Err("empty argument".into()),
            Some(_) => {
                let mut raw = String::new();
                while let Some(c) = chars.next_if(|c| *c != ',') {
                    raw.push(c);
                }
                let raw = raw.trim();
                parse_scalar(raw).ok_or_else(|| format!("unsupported argument '{raw}'"))?
            }
        };
        args.push(arg);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') => continue,
            None => return Ok(args),
            Some(c) => return Err(format!("unexpected '{c}' after argument")),
        }
    }
}
