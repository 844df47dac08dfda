//! Configuration loading from disk.
//!
//! The file format is one `key=value` pair per line. Lines starting with `#`,
//! blank lines and lines without `=` are skipped. Only the first `=` splits,
//! so values may themselves contain `=`.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::ServerConfig;
use crate::config::validation::{describe_errors, validate_config, ValidationError};

/// Default config location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.txt";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {} not found", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config value: {0}")]
    Parse(#[from] serde::de::value::Error),

    #[error("invalid configuration: {}", describe_errors(.0))]
    Validation(Vec<ValidationError>),
}

/// Split config text into its flat key/value mapping.
///
/// Later occurrences of a key replace earlier ones.
pub fn parse_pairs(content: &str) -> BTreeMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Read the raw key/value mapping without building a `ServerConfig`.
///
/// Used by the client, which only needs the connection keys.
pub fn read_pairs(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    Ok(parse_pairs(&content))
}

/// Parse and validate configuration text.
pub fn parse_config(content: &str) -> Result<ServerConfig, ConfigError> {
    let config = ServerConfig::from_pairs(parse_pairs(content))?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a key=value file.
pub fn load_config(path: &Path) -> Result<ServerConfig, ConfigError> {
    let config = ServerConfig::from_pairs(read_pairs(path)?)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(path = %path.display(), "Configuration file parsed");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn pairs_skip_comments_blanks_and_bare_lines() {
        let pairs = parse_pairs(
            "# dataset\n\nlinuxpath = /srv/data.txt\nnot a pair\n  max_payload=64  \n",
        );
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs["linuxpath"], "/srv/data.txt");
        assert_eq!(pairs["max_payload"], "64");
    }

    #[test]
    fn pairs_split_on_first_equals() {
        let pairs = parse_pairs("test_query=a=b\n");
        assert_eq!(pairs["test_query"], "a=b");
    }

    #[test]
    fn parse_config_applies_defaults() {
        let config = parse_config("linuxpath=/srv/data.txt\n").unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 44445);
        assert_eq!(config.max_payload, 1024);
        assert!(!config.reread_on_query);
        assert!(!config.use_ssl);
    }

    #[test]
    fn missing_linuxpath_names_the_key() {
        let err = parse_config("max_payload=1024\nuse_ssl=true\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("linuxpath"), "{}", err);
    }

    #[test]
    fn non_numeric_payload_is_rejected() {
        let err = parse_config("linuxpath=/srv/data.txt\nmax_payload=lots\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("lots"), "{}", err);
    }

    #[test]
    fn load_config_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn load_config_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "linuxpath=/srv/data.txt").unwrap();
        writeln!(file, "reread_on_query=True").unwrap();
        writeln!(file, "port=0").unwrap();

        let config = load_config(file.path()).unwrap();
        assert!(config.reread_on_query);
        assert_eq!(config.port, 0);
    }
}
