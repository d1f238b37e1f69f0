//! Format-specific config file parsers.
//!
//! A [`FileParser`] claims files by name and turns them into a `toml::Table`.
//! The [`Loader`](crate::Loader) keeps an ordered registry of parsers and asks
//! each in turn; the first one whose [`supports`](FileParser::supports)
//! returns `true` wins.
//!
//! Built-in parsers:
//!
//! - [`TomlParser`] for `.toml`
//! - [`JsonParser`] for `.json`
//! - [`YamlParser`] for `.yaml` / `.yml` (behind the `yaml` feature)
//!
//! Missing files parse to an empty table. Only actual I/O errors
//! (permissions, etc.) and syntax errors are propagated.
//!
//! JSON and YAML can express `null`, TOML cannot: nulls are dropped during
//! conversion, so a `null` key reads back as absent.

use std::path::{Path, PathBuf};

use toml::{Table, Value};
use tracing::debug;

use crate::error::TreefigError;

/// A format-specific parser for config files.
pub trait FileParser: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &str;

    /// Whether this parser handles the given file.
    fn supports(&self, path: &Path) -> bool;

    /// Parse the file into a table. A missing file yields an empty table.
    fn parse(&self, path: &Path) -> Result<Table, TreefigError>;
}

/// Read a file, mapping "not found" to `None`.
pub fn read_optional(path: &Path) -> Result<Option<String>, TreefigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "config file not found, using empty table");
            Ok(None)
        }
        Err(e) => Err(TreefigError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Sibling file carrying environment-specific overrides.
///
/// `conf/app.toml` with environment `prod` becomes `conf/app.prod.toml`;
/// `conf/app` becomes `conf/app.prod`.
pub fn overlay_path(path: &Path, environment: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem}.{environment}.{}", ext.to_string_lossy()),
        None => format!("{stem}.{environment}"),
    };
    path.with_file_name(file_name)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

fn parse_error(
    path: &Path,
    reason: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> TreefigError {
    TreefigError::ParseError {
        path: path.to_path_buf(),
        source: reason.into(),
    }
}

/// Parser for TOML files, the structured-literal format of this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlParser;

impl FileParser for TomlParser {
    fn name(&self) -> &str {
        "toml"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["toml"])
    }

    fn parse(&self, path: &Path) -> Result<Table, TreefigError> {
        let Some(content) = read_optional(path)? else {
            return Ok(Table::new());
        };
        content
            .parse::<Table>()
            .map_err(|e| parse_error(path, e))
    }
}

/// Parser for JSON files. The document must be an object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl FileParser for JsonParser {
    fn name(&self) -> &str {
        "json"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["json"])
    }

    fn parse(&self, path: &Path) -> Result<Table, TreefigError> {
        let Some(content) = read_optional(path)? else {
            return Ok(Table::new());
        };
        let json: serde_json::Value =
            serde_json::from_str(&content).map_err(|e| parse_error(path, e))?;
        match from_json(json) {
            Some(Value::Table(table)) => Ok(table),
            _ => Err(parse_error(path, "top-level JSON value is not an object")),
        }
    }
}

fn from_json(json: serde_json::Value) -> Option<Value> {
    match json {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(Value::Boolean(b)),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Float),
        },
        serde_json::Value::String(s) => Some(Value::String(s)),
        serde_json::Value::Array(items) => {
            Some(Value::Array(items.into_iter().filter_map(from_json).collect()))
        }
        serde_json::Value::Object(map) => Some(Value::Table(
            map.into_iter()
                .filter_map(|(k, v)| from_json(v).map(|v| (k, v)))
                .collect(),
        )),
    }
}

/// Parser for YAML files. The document must be a mapping; an empty document
/// is an empty table.
#[cfg(feature = "yaml")]
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

#[cfg(feature = "yaml")]
impl FileParser for YamlParser {
    fn name(&self) -> &str {
        "yaml"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, &["yaml", "yml"])
    }

    fn parse(&self, path: &Path) -> Result<Table, TreefigError> {
        let Some(content) = read_optional(path)? else {
            return Ok(Table::new());
        };
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|e| parse_error(path, e))?;
        match from_yaml(yaml) {
            None => Ok(Table::new()),
            Some(Value::Table(table)) => Ok(table),
            Some(_) => Err(parse_error(path, "top-level YAML value is not a mapping")),
        }
    }
}

#[cfg(feature = "yaml")]
fn from_yaml(yaml: serde_yaml::Value) -> Option<Value> {
    use serde_yaml::Value as Yaml;

    match yaml {
        Yaml::Null => None,
        Yaml::Bool(b) => Some(Value::Boolean(b)),
        Yaml::Number(n) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().map(Value::Float),
        },
        Yaml::String(s) => Some(Value::String(s)),
        Yaml::Sequence(items) => {
            Some(Value::Array(items.into_iter().filter_map(from_yaml).collect()))
        }
        Yaml::Mapping(map) => Some(Value::Table(
            map.into_iter()
                .filter_map(|(k, v)| {
                    let key = match k {
                        Yaml::String(s) => s,
                        Yaml::Bool(b) => b.to_string(),
                        Yaml::Number(n) => n.to_string(),
                        _ => return None,
                    };
                    from_yaml(v).map(|v| (key, v))
                })
                .collect(),
        )),
        Yaml::Tagged(tagged) => from_yaml(tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn overlay_path_inserts_environment_before_extension() {
        let path = overlay_path(Path::new("/etc/app/config.toml"), "prod");
        assert_eq!(path, PathBuf::from("/etc/app/config.prod.toml"));
    }

    #[test]
    fn overlay_path_without_extension() {
        let path = overlay_path(Path::new("conf/app"), "dev");
        assert_eq!(path, PathBuf::from("conf/app.dev"));
    }

    #[test]
    fn overlay_path_keeps_inner_dots() {
        let path = overlay_path(Path::new("app.base.json"), "test");
        assert_eq!(path, PathBuf::from("app.base.test.json"));
    }

    #[test]
    fn supports_by_extension() {
        assert!(TomlParser.supports(Path::new("a/b.toml")));
        assert!(TomlParser.supports(Path::new("B.TOML")));
        assert!(!TomlParser.supports(Path::new("b.json")));
        assert!(JsonParser.supports(Path::new("b.json")));
        assert!(!JsonParser.supports(Path::new("json")));
    }

    #[test]
    fn toml_parses_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "[db]\nport = 5432\n").unwrap();
        let table = TomlParser.parse(&path).unwrap();
        assert_eq!(table["db"]["port"].as_integer().unwrap(), 5432);
    }

    #[test]
    fn missing_file_is_empty_table() {
        let dir = TempDir::new().unwrap();
        let table = TomlParser.parse(&dir.path().join("nope.toml")).unwrap();
        assert!(table.is_empty());
        let table = JsonParser.parse(&dir.path().join("nope.json")).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn toml_syntax_error_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "port = = 1\n").unwrap();
        let err = TomlParser.parse(&path).unwrap_err();
        assert!(matches!(err, TreefigError::ParseError { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn json_nulls_are_dropped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.json");
        fs::write(
            &path,
            r#"{"a": null, "b": [1, null, 2], "c": {"d": 1.5, "e": "x"}}"#,
        )
        .unwrap();
        let table = JsonParser.parse(&path).unwrap();
        assert!(!table.contains_key("a"));
        assert_eq!(table["b"].as_array().unwrap().len(), 2);
        assert_eq!(table["c"]["d"].as_float().unwrap(), 1.5);
        assert_eq!(table["c"]["e"].as_str().unwrap(), "x");
    }

    #[test]
    fn json_non_object_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2, 3]").unwrap();
        assert!(matches!(
            JsonParser.parse(&path),
            Err(TreefigError::ParseError { .. })
        ));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_parses_mapping() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.yml");
        fs::write(&path, "db:\n  host: localhost\n  port: 5432\n  opt: ~\n1: one\n").unwrap();
        let table = YamlParser.parse(&path).unwrap();
        assert_eq!(table["db"]["host"].as_str().unwrap(), "localhost");
        assert_eq!(table["db"]["port"].as_integer().unwrap(), 5432);
        assert!(!table["db"].as_table().unwrap().contains_key("opt"));
        assert_eq!(table["1"].as_str().unwrap(), "one");
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_empty_document_is_empty_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.yaml");
        fs::write(&path, "").unwrap();
        assert!(YamlParser.parse(&path).unwrap().is_empty());
    }
}
