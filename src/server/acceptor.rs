//! Accept loop and server lifecycle.
//!
//! # Responsibilities
//! - Load the dataset and TLS material, then bind the listener
//! - Accept connections and spawn one task per connection
//! - Run the TLS handshake inside the connection task
//! - Back off and keep accepting when descriptors run out
//! - Stop promptly and idempotently on request

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use crate::config::validation::describe_errors;
use crate::config::{validate_config, ServerConfig, ValidationError};
use crate::dataset::{DatasetError, DatasetMode, DatasetStore};
use crate::lifecycle::Shutdown;
use crate::net::connection::{ConnectionGuard, ConnectionTracker};
use crate::net::listener::{Accepted, ConnectionPermit, Listener, ListenerError};
use crate::net::tls::{load_tls_acceptor, TlsError};
use crate::observability::metrics;
use crate::server::handler::QueryHandler;

/// Upper bound on a single TLS handshake.
pub const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause before retrying accept after descriptor or memory exhaustion.
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(200);

/// Errors that prevent the server from starting or keep it from accepting.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid configuration: {}", describe_errors(.0))]
    InvalidConfig(Vec<ValidationError>),

    #[error("failed to load dataset: {0}")]
    Dataset(#[from] DatasetError),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// State shared by every connection task.
struct ServerContext {
    store: DatasetStore,
    max_payload: usize,
    tls: Option<TlsAcceptor>,
}

/// Handle for stopping a running server from elsewhere.
#[derive(Debug, Clone)]
pub struct ServerHandle {
    shutdown: Shutdown,
}

impl ServerHandle {
    /// Stop accepting new connections.
    ///
    /// In-flight queries run to completion. Calling this more than once is harmless.
    pub fn stop(&self) {
        if self.shutdown.trigger() {
            tracing::info!("Stop requested, closing listener");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_triggered()
    }
}

/// A bound query server.
pub struct LookupServer {
    listener: Listener,
    context: Arc<ServerContext>,
    shutdown: Shutdown,
    tracker: ConnectionTracker,
    mode: DatasetMode,
}

impl LookupServer {
    /// Prepare everything the accept loop needs.
    ///
    /// The dataset (cached mode) and TLS material are loaded before the
    /// socket is bound, so any failure leaves nothing listening.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        validate_config(&config).map_err(ServerError::InvalidConfig)?;

        let store = DatasetStore::open(&config.dataset_path, config.reread_on_query)?;
        let mode = store.mode();

        let tls = if config.use_ssl {
            Some(load_tls_acceptor(&config.cert_path, &config.key_path)?)
        } else {
            None
        };

        let listener = Listener::bind(&config.host, config.port, config.max_connections).await?;

        Ok(Self {
            listener,
            context: Arc::new(ServerContext {
                store,
                max_payload: config.max_payload,
                tls,
            }),
            shutdown: Shutdown::new(),
            tracker: ConnectionTracker::new(),
            mode,
        })
    }

    /// Effective listening address, including an OS-assigned port.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            shutdown: self.shutdown.clone(),
        }
    }

    /// Tracker of in-flight connections, for draining after `run` returns.
    pub fn connections(&self) -> ConnectionTracker {
        self.tracker.clone()
    }

    /// Run the accept loop until stopped.
    ///
    /// Returns an error only for a fatal accept failure that happened while
    /// the server was still meant to be running.
    pub async fn run(self) -> Result<(), ServerError> {
        let LookupServer {
            listener,
            context,
            shutdown,
            tracker,
            mode,
        } = self;
        let mut stop = shutdown.subscribe();

        tracing::info!(
            address = %listener.local_addr(),
            tls = context.tls.is_some(),
            dataset_mode = %mode,
            max_payload = context.max_payload,
            "Server is listening for incoming connections"
        );

        while !shutdown.is_triggered() {
            let accepted = tokio::select! {
                biased;
                _ = stop.recv() => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok(Accepted::TimedOut) => continue,
                Ok(Accepted::Connection(stream, peer, permit)) => {
                    let guard = tracker.track();
                    let context = Arc::clone(&context);
                    tokio::spawn(serve_connection(context, stream, peer, guard, permit));
                }
                Err(e) if e.is_resource_exhausted() => {
                    tracing::warn!(
                        error = %e,
                        backoff_ms = ACCEPT_BACKOFF.as_millis() as u64,
                        in_flight = tracker.active_count(),
                        "Out of resources while accepting, backing off"
                    );
                    metrics::record_accept_backoff();
                    tokio::select! {
                        biased;
                        _ = stop.recv() => break,
                        _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                    }
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(error = %e, "Transient accept failure");
                }
                Err(e) => {
                    if shutdown.is_triggered() {
                        break;
                    }
                    tracing::error!(error = %e, "Accept failed, stopping server");
                    shutdown.trigger();
                    return Err(e.into());
                }
            }
        }

        drop(listener);
        tracing::info!(
            in_flight = tracker.active_count(),
            "Server stopped accepting connections"
        );
        Ok(())
    }
}

async fn serve_connection(
    context: Arc<ServerContext>,
    stream: TcpStream,
    peer: SocketAddr,
    guard: ConnectionGuard,
    _permit: ConnectionPermit,
) {
    let id = guard.id();
    let handler = QueryHandler::new(&context.store, context.max_payload, id, peer);

    match &context.tls {
        None => {
            handler.handle(stream).await;
        }
        Some(acceptor) => {
            match tokio::time::timeout(TLS_HANDSHAKE_TIMEOUT, acceptor.accept(stream)).await {
                Ok(Ok(tls_stream)) => {
                    handler.handle(tls_stream).await;
                }
                Ok(Err(e)) => {
                    metrics::record_tls_handshake_failure();
                    tracing::error!(connection_id = %id, peer = %peer, error = %e, "TLS handshake failed");
                }
                Err(_) => {
                    metrics::record_tls_handshake_failure();
                    tracing::error!(connection_id = %id, peer = %peer, "TLS handshake timed out");
                }
            }
        }
    }
}
