//! Per-connection query state machine.
//!
//! ```text
//! AwaitRequest → Validate → Lookup → Respond → Close
//!        │           │                  ▲
//!        │           └──────────────────┤  (too large, bad encoding, empty)
//!        └── connection fault → Close (nothing sent)
//! ```
//!
//! Exactly one query is served per connection.

use std::io;
use std::net::SocketAddr;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::dataset::DatasetStore;
use crate::net::connection::ConnectionId;
use crate::observability::metrics;
use crate::server::response::Response;

/// Result of checking raw request bytes before any lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validated<'a> {
    /// The trimmed query to look up.
    Lookup(&'a str),
    /// Answer without touching the dataset.
    Respond(Response),
}

/// Size, encoding and emptiness checks on one received payload.
///
/// A zero-length payload is answered like an empty query.
pub fn validate(raw: &[u8], max_payload: usize) -> Validated<'_> {
    if raw.len() > max_payload {
        return Validated::Respond(Response::TooLarge);
    }

    let text = match std::str::from_utf8(raw) {
        Ok(text) => text,
        Err(_) => return Validated::Respond(Response::InvalidEncoding),
    };

    let query = text.trim();
    if query.is_empty() {
        return Validated::Respond(Response::NotFound);
    }
    if query.len() > max_payload {
        return Validated::Respond(Response::TooLarge);
    }

    Validated::Lookup(query)
}

enum State {
    AwaitRequest,
    Validate(usize),
    Lookup(String),
    Respond(Response),
    Close,
}

/// Serves the single request on one accepted connection.
pub struct QueryHandler<'a> {
    store: &'a DatasetStore,
    max_payload: usize,
    id: ConnectionId,
    peer: SocketAddr,
}

impl<'a> QueryHandler<'a> {
    pub fn new(store: &'a DatasetStore, max_payload: usize, id: ConnectionId, peer: SocketAddr) -> Self {
        Self {
            store,
            max_payload,
            id,
            peer,
        }
    }

    /// Run the state machine to completion on `stream`.
    ///
    /// Returns the response sent, or `None` if the connection was abandoned
    /// before a response could be written.
    pub async fn handle<S>(self, mut stream: S) -> Option<Response>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let started = Instant::now();
        let mut buf = vec![0u8; self.max_payload.saturating_add(1)];
        let mut looked_up: Option<String> = None;
        let mut sent = None;
        let mut state = State::AwaitRequest;

        loop {
            state = match state {
                State::AwaitRequest => match stream.read(&mut buf).await {
                    Ok(received) => State::Validate(received),
                    Err(e) => {
                        self.connection_fault("read", &e);
                        State::Close
                    }
                },
                State::Validate(received) => match validate(&buf[..received], self.max_payload) {
                    Validated::Lookup(query) => State::Lookup(query.to_string()),
                    Validated::Respond(response) => State::Respond(response),
                },
                State::Lookup(query) => {
                    let response = self.lookup(&query).await;
                    looked_up = Some(query);
                    State::Respond(response)
                }
                State::Respond(response) => {
                    metrics::record_query(response, started);
                    match stream.write_all(response.as_bytes()).await {
                        Ok(()) => sent = Some(response),
                        Err(e) => self.connection_fault("write", &e),
                    }
                    State::Close
                }
                State::Close => break,
            };
        }

        // Half-close then drop; the client has everything it will get.
        let _ = stream.shutdown().await;
        drop(stream);

        if let Some(query) = looked_up {
            tracing::info!(
                connection_id = %self.id,
                query = %query,
                peer = %self.peer.ip(),
                elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
                response = ?sent,
                "Query processed"
            );
        } else if let Some(response) = sent {
            tracing::debug!(
                connection_id = %self.id,
                peer = %self.peer,
                response = %response,
                "Request rejected before lookup"
            );
        }

        sent
    }

    async fn lookup(&self, query: &str) -> Response {
        match self.store.contains(query).await {
            Ok(true) => Response::Exists,
            Ok(false) => Response::NotFound,
            Err(e) => {
                metrics::record_reload_failure();
                tracing::error!(
                    connection_id = %self.id,
                    peer = %self.peer,
                    error = %e,
                    "Dataset reload failed, answering not found"
                );
                Response::NotFound
            }
        }
    }

    fn connection_fault(&self, stage: &'static str, error: &io::Error) {
        match error.kind() {
            io::ErrorKind::ConnectionReset | io::ErrorKind::BrokenPipe => {
                tracing::warn!(
                    connection_id = %self.id,
                    peer = %self.peer,
                    stage = stage,
                    "Connection was reset by peer"
                );
            }
            _ => {
                tracing::error!(
                    connection_id = %self.id,
                    peer = %self.peer,
                    stage = stage,
                    error = %error,
                    "Connection I/O error"
                );
            }
        }
    }
}
