//! TCP listener implementation with backpressure.
//!
//! # Responsibilities
//! - Bind to configured host/port with address reuse
//! - Accept incoming TCP connections with a short poll timeout
//! - Enforce max_connections limit via semaphore
//! - Classify accept errors as transient, resource exhaustion, or fatal

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// How long a single accept waits before the loop re-checks its running flag.
pub const ACCEPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

const LISTEN_BACKLOG: u32 = 1024;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Host/port did not resolve to a usable address.
    #[error("failed to resolve {address}: {source}")]
    Resolve {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Failed to accept connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] io::Error),

    #[error("connection limiter closed")]
    LimiterClosed,
}

impl ListenerError {
    /// Accept errors that only concern one half-open connection.
    pub fn is_transient(&self) -> bool {
        match self {
            ListenerError::Accept(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::ConnectionReset
                    | io::ErrorKind::Interrupted
                    | io::ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }

    /// The process or system ran out of descriptors or buffers.
    ///
    /// The pending connection stays in the backlog, so accepting can resume
    /// once resources are released.
    pub fn is_resource_exhausted(&self) -> bool {
        match self {
            ListenerError::Accept(e) => {
                e.kind() == io::ErrorKind::OutOfMemory
                    || matches!(
                        e.raw_os_error(),
                        Some(libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM)
                    )
            }
            _ => false,
        }
    }
}

/// Outcome of one accept attempt.
#[derive(Debug)]
pub enum Accepted {
    Connection(TcpStream, SocketAddr, ConnectionPermit),
    /// Nothing arrived within [`ACCEPT_POLL_INTERVAL`].
    TimedOut,
}

/// A TCP listener that optionally limits concurrent connections.
///
/// When the limit is reached, new connections wait in the kernel backlog
/// until a slot becomes available.
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Semaphore to limit concurrent connections. `None` means unbounded.
    connection_limit: Option<Arc<Semaphore>>,
    local_addr: SocketAddr,
}

impl Listener {
    /// Bind `host:port` with `SO_REUSEADDR`.
    ///
    /// A `max_connections` of zero disables the concurrency cap.
    pub async fn bind(host: &str, port: u16, max_connections: usize) -> Result<Self, ListenerError> {
        let address = format!("{}:{}", host, port);
        let addr = tokio::net::lookup_host((host, port))
            .await
            .map_err(|source| ListenerError::Resolve {
                address: address.clone(),
                source,
            })?
            .next()
            .ok_or_else(|| ListenerError::Resolve {
                address: address.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
            })?;

        let bind = || -> io::Result<TcpListener> {
            let socket = if addr.is_ipv4() {
                TcpSocket::new_v4()?
            } else {
                TcpSocket::new_v6()?
            };
            socket.set_reuseaddr(true)?;
            socket.bind(addr)?;
            socket.listen(LISTEN_BACKLOG)
        };
        let inner = bind().map_err(|source| ListenerError::Bind {
            address: address.clone(),
            source,
        })?;

        let local_addr = inner.local_addr().map_err(|source| ListenerError::Bind {
            address: address.clone(),
            source,
        })?;

        if port == 0 {
            tracing::info!(port = local_addr.port(), "Listener dynamically bound to port");
        }
        tracing::info!(
            address = %local_addr,
            max_connections = max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner,
            connection_limit: (max_connections > 0).then(|| Arc::new(Semaphore::new(max_connections))),
            local_addr,
        })
    }

    /// Accept a new connection, respecting the connection limit.
    ///
    /// Waiting for a permit and waiting for a peer both count against
    /// [`ACCEPT_POLL_INTERVAL`]; on expiry [`Accepted::TimedOut`] is returned.
    pub async fn accept(&self) -> Result<Accepted, ListenerError> {
        let attempt = async {
            // Acquire permit first (backpressure)
            let permit = match &self.connection_limit {
                Some(limit) => Some(
                    Arc::clone(limit)
                        .acquire_owned()
                        .await
                        .map_err(|_| ListenerError::LimiterClosed)?,
                ),
                None => None,
            };

            let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
            Ok::<_, ListenerError>((stream, addr, ConnectionPermit { _permit: permit }))
        };

        match tokio::time::timeout(ACCEPT_POLL_INTERVAL, attempt).await {
            Ok(Ok((stream, addr, permit))) => {
                tracing::debug!(
                    peer_addr = %addr,
                    available_permits = ?self.available_permits(),
                    "Connection accepted"
                );
                Ok(Accepted::Connection(stream, addr, permit))
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Ok(Accepted::TimedOut),
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Get current available connection slots, if bounded.
    pub fn available_permits(&self) -> Option<usize> {
        self.connection_limit.as_ref().map(|s| s.available_permits())
    }
}

/// A permit representing a connection slot.
///
/// When dropped, the connection slot is released back to the pool.
/// This keeps backpressure intact even if the connection handler panics.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: Option<OwnedSemaphorePermit>,
}
