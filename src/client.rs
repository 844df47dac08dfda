//! Client for the one-shot query protocol.
//!
//! Used by `lookup-cli` and by the integration tests.

use std::io;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::rustls::{self, crypto::ring, pki_types::ServerName, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::net::tls::{load_certs, TlsError};
use crate::server::response::Response;

/// Responses are short; anything longer than this is not ours.
const MAX_RESPONSE_LEN: usize = 1024;

/// TLS settings for a [`QueryClient`].
#[derive(Clone)]
pub struct ClientTls {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl ClientTls {
    /// Trust exactly the certificates in `cert_path` (e.g. the server's self-signed cert).
    pub fn trusting(cert_path: &Path, server_name: &str) -> Result<Self, TlsError> {
        let mut roots = RootCertStore::empty();
        for cert in load_certs(cert_path)? {
            roots.add(cert)?;
        }

        let config = rustls::ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth();

        let server_name = ServerName::try_from(server_name.to_string())
            .map_err(|e| TlsError::Config(rustls::Error::General(e.to_string())))?;

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            server_name,
        })
    }
}

/// Sends queries to a line-lookup server, one connection per query.
#[derive(Clone)]
pub struct QueryClient {
    addr: SocketAddr,
    tls: Option<ClientTls>,
    timeout: Duration,
}

impl QueryClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            tls: None,
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_tls(mut self, tls: ClientTls) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Send a text query and parse the response line.
    pub async fn query(&self, query: &str) -> io::Result<Response> {
        let line = self.send_raw(query.as_bytes()).await?;
        Response::parse(&line).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unexpected response {:?}", line),
            )
        })
    }

    /// Send arbitrary bytes and return the raw response text.
    pub async fn send_raw(&self, payload: &[u8]) -> io::Result<String> {
        tokio::time::timeout(self.timeout, self.exchange(payload))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "query timed out"))?
    }

    async fn exchange(&self, payload: &[u8]) -> io::Result<String> {
        let stream = TcpStream::connect(self.addr).await?;
        match &self.tls {
            None => exchange_on(stream, payload).await,
            Some(tls) => {
                let stream = tls
                    .connector
                    .connect(tls.server_name.clone(), stream)
                    .await?;
                exchange_on(stream, payload).await
            }
        }
    }
}

async fn exchange_on<S>(mut stream: S, payload: &[u8]) -> io::Result<String>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(payload).await?;
    // Half-close so the server's read ends even for an empty query.
    stream.shutdown().await?;

    let mut response = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        let read = match stream.read(&mut chunk).await {
            Ok(read) => read,
            // Some peers drop TCP without a TLS close_notify after the line.
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof && !response.is_empty() => 0,
            Err(e) => return Err(e),
        };
        if read == 0 {
            break;
        }
        response.extend_from_slice(&chunk[..read]);
        if response.contains(&b'\n') || response.len() > MAX_RESPONSE_LEN {
            break;
        }
    }

    String::from_utf8(response).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
