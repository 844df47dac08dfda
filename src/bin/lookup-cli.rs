use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use serde_json::json;

use line_lookup::client::{ClientTls, QueryClient};
use line_lookup::config::loader::read_pairs;
use line_lookup::config::schema::{is_truthy, ServerConfig};
use line_lookup::Response;

#[derive(Parser)]
#[command(name = "lookup-cli")]
#[command(about = "Client for the line-lookup query server", long_about = None)]
struct Cli {
    /// Config file shared with the server (host, port, use_ssl, ssl_cert)
    #[arg(short, long, default_value = "config.txt")]
    config: PathBuf,

    #[arg(long)]
    host: Option<String>,

    #[arg(short, long)]
    port: Option<u16>,

    /// Force TLS even if the config does not enable it
    #[arg(long)]
    tls: bool,

    /// Name checked against the server certificate
    #[arg(long, default_value = "localhost")]
    server_name: String,

    #[arg(long, default_value_t = 5)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask whether a line exists
    Query {
        query: String,

        /// Print a JSON object instead of the bare response
        #[arg(long)]
        json: bool,
    },
    /// Send batches of queries until one batch sees a failure
    Stress {
        /// Defaults to `test_query` from the config file
        #[arg(long)]
        query: Option<String>,

        #[arg(long, default_value_t = 50)]
        batch_size: usize,

        #[arg(long, default_value_t = 40)]
        max_batches: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // The client runs fine without a config file; every key has a default.
    let pairs = read_pairs(&cli.config).unwrap_or_default();
    let client = build_client(&cli, &pairs).await?;

    match cli.command {
        Commands::Query { query, json } => {
            let start = Instant::now();
            let response = client.send_raw(query.as_bytes()).await?;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            let response = response.trim_end();

            if json {
                let out = json!({
                    "query": query,
                    "response": response,
                    "elapsed_ms": elapsed_ms,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Server response: {}", response);
            }
        }
        Commands::Stress {
            query,
            batch_size,
            max_batches,
        } => {
            let query = query
                .or_else(|| pairs.get("test_query").cloned())
                .unwrap_or_else(|| "5;0;6;28;0;20;3;0;".to_string());
            stress(&client, &query, batch_size, max_batches).await;
        }
    }

    Ok(())
}

async fn build_client(
    cli: &Cli,
    pairs: &BTreeMap<String, String>,
) -> Result<QueryClient, Box<dyn std::error::Error>> {
    let host = cli
        .host
        .clone()
        .or_else(|| pairs.get("host").cloned())
        .filter(|host| host != "0.0.0.0")
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = match (cli.port, pairs.get("port")) {
        (Some(port), _) => port,
        (None, Some(raw)) => raw.parse()?,
        (None, None) => ServerConfig::default().port,
    };

    let addr: SocketAddr = tokio::net::lookup_host((host.as_str(), port))
        .await?
        .next()
        .ok_or_else(|| format!("{}:{} did not resolve", host, port))?;

    let mut client = QueryClient::new(addr).with_timeout(Duration::from_secs(cli.timeout_secs));

    let use_tls = cli.tls || pairs.get("use_ssl").is_some_and(|raw| is_truthy(raw));
    if use_tls {
        let cert_path = pairs
            .get("ssl_cert")
            .map(PathBuf::from)
            .unwrap_or_else(|| ServerConfig::default().cert_path);
        client = client.with_tls(ClientTls::trusting(&cert_path, &cli.server_name)?);
    }

    Ok(client)
}

async fn stress(client: &QueryClient, query: &str, batch_size: usize, max_batches: usize) {
    let mut total_sent = 0;
    let mut failures = 0;

    for batch in 1..=max_batches {
        let start = Instant::now();
        let mut tasks = tokio::task::JoinSet::new();
        for _ in 0..batch_size {
            let client = client.clone();
            let query = query.to_string();
            tasks.spawn(async move {
                matches!(
                    client.query(&query).await,
                    Ok(Response::Exists | Response::NotFound)
                )
            });
        }

        let mut success = 0;
        while let Some(result) = tasks.join_next().await {
            if matches!(result, Ok(true)) {
                success += 1;
            }
        }

        total_sent += batch_size;
        failures += batch_size - success;
        println!(
            "Batch {}: {} queries in {:.2}s, success: {}, failed: {}",
            batch,
            batch_size,
            start.elapsed().as_secs_f64(),
            success,
            batch_size - success
        );

        if success < batch_size {
            println!("Server started dropping or failing queries, likely reached its limit.");
            break;
        }
    }

    println!("\nTotal Queries Sent: {}", total_sent);
    println!("Total Failures: {}", failures);
}
