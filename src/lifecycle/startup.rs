//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Start the metrics exporter when configured
//! - Load the dataset and TLS material, then bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener binds last, so traffic only arrives once everything is ready

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{load_config, ConfigError};
use crate::observability::metrics;
use crate::server::{LookupServer, ServerError};

/// Environment variable that overrides the config location.
pub const CONFIG_PATH_ENV: &str = "LINE_LOOKUP_CONFIG";

/// Any condition that prevents the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),
}

/// Config location: `LINE_LOOKUP_CONFIG` if set, else `config.txt`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(crate::config::loader::DEFAULT_CONFIG_PATH))
}

/// Load config from `path` and bring up a bound, not yet running, server.
pub async fn start(path: &Path) -> Result<LookupServer, StartupError> {
    let config = load_config(path)?;

    tracing::info!(
        config = %path.display(),
        host = %config.host,
        port = config.port,
        dataset = %config.dataset_path.display(),
        reread_on_query = config.reread_on_query,
        max_payload = config.max_payload,
        use_ssl = config.use_ssl,
        "Configuration loaded"
    );

    if let Some(addr) = config.metrics_address {
        metrics::init_metrics(addr)?;
    }

    Ok(LookupServer::bind(config).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn missing_config_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = start(&dir.path().join("config.txt")).await.err().unwrap();
        assert!(matches!(err, StartupError::Config(ConfigError::NotFound(_))));
    }

    #[tokio::test]
    async fn missing_linuxpath_is_fatal_and_named() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        fs::write(&path, "port=0\nmax_payload=1024\n").unwrap();

        let err = start(&path).await.err().unwrap();
        assert!(matches!(err, StartupError::Config(ConfigError::Validation(_))));
        assert!(err.to_string().contains("linuxpath"), "{err}");
    }

    #[tokio::test]
    async fn missing_dataset_is_fatal_in_cached_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        fs::write(
            &path,
            format!(
                "host=127.0.0.1\nport=0\nlinuxpath={}\n",
                dir.path().join("absent.txt").display()
            ),
        )
        .unwrap();

        let err = start(&path).await.err().unwrap();
        assert!(matches!(err, StartupError::Server(ServerError::Dataset(_))), "{err}");
    }

    #[tokio::test]
    async fn valid_config_binds() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.txt");
        fs::write(&data, "apple\n").unwrap();
        let path = dir.path().join("config.txt");
        fs::write(&path, format!("host=127.0.0.1\nport=0\nlinuxpath={}\n", data.display())).unwrap();

        let server = start(&path).await.unwrap();
        assert_ne!(server.local_addr().port(), 0);
    }
}
