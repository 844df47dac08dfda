//! Configuration schema definitions.
//!
//! `ServerConfig` is deserialized with serde straight from the flat string
//! mapping produced by the loader. Every value arrives as text, so numeric
//! and boolean fields go through small `deserialize_with` adapters.

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use serde::de::value::{Error as ValueError, MapDeserializer};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::net::tls::{DEFAULT_CERT_PATH, DEFAULT_KEY_PATH};

/// Root configuration for the query server.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerConfig {
    /// Host or IP to bind.
    pub host: String,

    /// Port to bind. `0` asks the OS for a free port.
    #[serde(deserialize_with = "from_text")]
    pub port: u16,

    /// Line-oriented dataset file.
    #[serde(rename = "linuxpath")]
    pub dataset_path: PathBuf,

    /// Reload the dataset for every query instead of caching it.
    #[serde(deserialize_with = "truthy")]
    pub reread_on_query: bool,

    /// Largest accepted query, in bytes.
    #[serde(deserialize_with = "from_text")]
    pub max_payload: usize,

    /// Wrap accepted connections in TLS.
    #[serde(deserialize_with = "truthy")]
    pub use_ssl: bool,

    /// PEM certificate chain used when `use_ssl` is set.
    #[serde(rename = "ssl_cert")]
    pub cert_path: PathBuf,

    /// PEM private key used when `use_ssl` is set.
    #[serde(rename = "ssl_key")]
    pub key_path: PathBuf,

    /// Maximum concurrent connections (backpressure). `0` disables the cap.
    #[serde(deserialize_with = "from_text")]
    pub max_connections: usize,

    /// Prometheus scrape endpoint, if any.
    #[serde(deserialize_with = "optional_from_text")]
    pub metrics_address: Option<SocketAddr>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 44445,
            dataset_path: PathBuf::new(),
            reread_on_query: false,
            max_payload: 1024,
            use_ssl: false,
            cert_path: PathBuf::from(DEFAULT_CERT_PATH),
            key_path: PathBuf::from(DEFAULT_KEY_PATH),
            max_connections: 10_000,
            metrics_address: None,
        }
    }
}

impl ServerConfig {
    /// Build a config serving `dataset_path` with every other setting at its default.
    pub fn for_dataset(dataset_path: impl Into<PathBuf>) -> Self {
        Self {
            dataset_path: dataset_path.into(),
            ..Self::default()
        }
    }

    /// Deserialize from the loader's flat key/value mapping.
    ///
    /// Unknown keys are ignored. No semantic validation happens here.
    pub fn from_pairs(pairs: BTreeMap<String, String>) -> Result<Self, ValueError> {
        Self::deserialize(MapDeserializer::<_, ValueError>::new(pairs.into_iter()))
    }
}

/// Interpret a config flag. Accepts `true`, `1`, `yes` and `on`, ignoring case.
pub fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(is_truthy(&raw))
}

fn from_text<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim()
        .parse()
        .map_err(|e| de::Error::custom(format!("`{}`: {}", raw, e)))
}

fn optional_from_text<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = String::deserialize(deserializer)?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| de::Error::custom(format!("`{}`: {}", raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> BTreeMap<String, String> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn truthy_values() {
        for raw in ["true", "True", "TRUE", "1", "yes", "on", " on "] {
            assert!(is_truthy(raw), "{raw}");
        }
        for raw in ["false", "False", "0", "no", "", "maybe"] {
            assert!(!is_truthy(raw), "{raw}");
        }
    }

    #[test]
    fn all_keys_deserialize() {
        let config = ServerConfig::from_pairs(pairs(&[
            ("host", "127.0.0.1"),
            ("port", "9000"),
            ("linuxpath", "/srv/200k.txt"),
            ("reread_on_query", "True"),
            ("max_payload", "64"),
            ("use_ssl", "yes"),
            ("ssl_cert", "/etc/lookup/cert.pem"),
            ("ssl_key", "/etc/lookup/key.pem"),
            ("max_connections", "0"),
            ("metrics_address", "127.0.0.1:9100"),
            ("test_query", "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.dataset_path, PathBuf::from("/srv/200k.txt"));
        assert!(config.reread_on_query);
        assert_eq!(config.max_payload, 64);
        assert!(config.use_ssl);
        assert_eq!(config.cert_path, PathBuf::from("/etc/lookup/cert.pem"));
        assert_eq!(config.key_path, PathBuf::from("/etc/lookup/key.pem"));
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.metrics_address, Some("127.0.0.1:9100".parse().unwrap()));
    }

    #[test]
    fn tls_material_defaults_to_fixed_locations() {
        let config = ServerConfig::from_pairs(pairs(&[("linuxpath", "data.txt")])).unwrap();
        assert_eq!(config.cert_path, PathBuf::from("ssl/cert.pem"));
        assert_eq!(config.key_path, PathBuf::from("ssl/key.pem"));
        assert_eq!(config.metrics_address, None);
    }

    #[test]
    fn bad_port_is_rejected() {
        let err = ServerConfig::from_pairs(pairs(&[("port", "70000")])).unwrap_err();
        assert!(err.to_string().contains("70000"), "{err}");
    }
}
