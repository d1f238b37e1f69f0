use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreefigError {
    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config source: {0}")]
    InvalidSource(String),

    #[error("Invalid include token '{0}' (expected '$alias/relative/path')")]
    InvalidInclude(String),

    #[error("Unknown root alias '{alias}' in include token '{token}'")]
    UnknownRootAlias { alias: String, token: String },

    #[error("Invalid call expression '{expr}': {reason}")]
    InvalidCall { expr: String, reason: String },

    #[error("Cyclic token resolution: {0}")]
    CyclicResolution(String),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_root_alias_formats() {
        let err = TreefigError::UnknownRootAlias {
            alias: "app".into(),
            token: "$app/db.toml".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'app'"));
        assert!(msg.contains("$app/db.toml"));
    }

    #[test]
    fn parse_error_names_path() {
        let err = TreefigError::ParseError {
            path: "/etc/app/config.json".into(),
            source: "expected value at line 1".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("config.json"));
        assert!(msg.contains("line 1"));
    }

    #[test]
    fn cyclic_resolution_formats() {
        let err = TreefigError::CyclicResolution("a -> b -> a".into());
        assert!(err.to_string().contains("a -> b -> a"));
    }
}
