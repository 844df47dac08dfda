//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::task::JoinHandle;

use line_lookup::client::{ClientTls, QueryClient};
use line_lookup::net::connection::ConnectionTracker;
use line_lookup::server::{LookupServer, ServerError, ServerHandle};
use line_lookup::ServerConfig;

/// A server running on an ephemeral port, with its dataset in a temp dir.
pub struct TestServer {
    pub addr: SocketAddr,
    pub handle: ServerHandle,
    pub connections: ConnectionTracker,
    pub task: JoinHandle<Result<(), ServerError>>,
    pub dataset_path: PathBuf,
    pub dir: TempDir,
}

impl TestServer {
    pub fn client(&self) -> QueryClient {
        QueryClient::new(self.addr)
    }

    /// Replace the dataset file's contents.
    pub fn rewrite_dataset(&self, contents: &str) {
        fs::write(&self.dataset_path, contents).unwrap();
    }

    /// Stop the server and wait for the accept loop to exit.
    pub async fn stop(self) {
        self.handle.stop();
        self.task.await.unwrap().unwrap();
    }
}

/// Write `contents` as the dataset in a fresh temp dir and return a config for it.
pub fn dataset_config(contents: &str) -> (TempDir, ServerConfig) {
    let dir = tempfile::tempdir().unwrap();
    let dataset_path = dir.path().join("data.txt");
    fs::write(&dataset_path, contents).unwrap();

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::for_dataset(dataset_path)
    };
    (dir, config)
}

/// Bind and run `config`, keeping `dir` alive for the server's lifetime.
pub async fn spawn_server(dir: TempDir, config: ServerConfig) -> TestServer {
    let dataset_path = config.dataset_path.clone();
    let server = LookupServer::bind(config).await.unwrap();
    let addr = server.local_addr();
    let handle = server.handle();
    let connections = server.connections();
    let task = tokio::spawn(server.run());

    TestServer {
        addr,
        handle,
        connections,
        task,
        dataset_path,
        dir,
    }
}

/// Start a plain-TCP server over `contents` with default settings.
pub async fn start_server(contents: &str) -> TestServer {
    let (dir, config) = dataset_config(contents);
    spawn_server(dir, config).await
}

/// Write a self-signed certificate for `localhost` into `dir`.
pub fn write_self_signed(dir: &Path) -> (PathBuf, PathBuf) {
    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    fs::write(&cert_path, cert.pem()).unwrap();
    fs::write(&key_path, key_pair.serialize_pem()).unwrap();
    (cert_path, key_path)
}

/// Client trusting the certificate written by [`write_self_signed`].
pub fn tls_client(addr: SocketAddr, cert_path: &Path) -> QueryClient {
    QueryClient::new(addr).with_tls(ClientTls::trusting(cert_path, "localhost").unwrap())
}
