//! Cached versus reread dataset lifecycles, observed through the server.

use line_lookup::{Response, ServerConfig};

mod common;

#[tokio::test]
async fn test_cached_mode_ignores_file_changes() {
    let server = common::start_server("apple\nbanana\n").await;
    let client = server.client();
    assert_eq!(client.query("apple").await.unwrap(), Response::Exists);

    server.rewrite_dataset("mango\n");
    assert_eq!(client.query("apple").await.unwrap(), Response::Exists);
    assert_eq!(client.query("mango").await.unwrap(), Response::NotFound);
    server.stop().await;
}

#[tokio::test]
async fn test_reread_mode_sees_file_changes() {
    let (dir, config) = common::dataset_config("apple\n");
    let config = ServerConfig {
        reread_on_query: true,
        ..config
    };
    let server = common::spawn_server(dir, config).await;
    let client = server.client();
    assert_eq!(client.query("apple").await.unwrap(), Response::Exists);

    server.rewrite_dataset("mango\n");
    assert_eq!(client.query("apple").await.unwrap(), Response::NotFound);
    assert_eq!(client.query("mango").await.unwrap(), Response::Exists);
    server.stop().await;
}

#[tokio::test]
async fn test_reread_failure_keeps_server_alive() {
    let (dir, config) = common::dataset_config("apple\n");
    let config = ServerConfig {
        reread_on_query: true,
        ..config
    };
    let server = common::spawn_server(dir, config).await;
    let client = server.client();

    std::fs::remove_file(&server.dataset_path).unwrap();
    assert_eq!(client.query("apple").await.unwrap(), Response::NotFound);

    server.rewrite_dataset("apple\n");
    assert_eq!(client.query("apple").await.unwrap(), Response::Exists);
    server.stop().await;
}

#[tokio::test]
async fn test_cached_mode_refuses_to_start_without_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServerConfig::for_dataset(dir.path().join("missing.txt"))
    };
    let err = line_lookup::LookupServer::bind(config).await.err().unwrap();
    assert!(err.to_string().contains("missing.txt"), "{err}");
}
