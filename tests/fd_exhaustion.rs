//! Accept loop behaviour when the process runs out of file descriptors.
//!
//! Kept in its own test binary: it lowers `RLIMIT_NOFILE` for the whole process.

use std::fs::File;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use line_lookup::server::acceptor::ACCEPT_BACKOFF;
use line_lookup::Response;

mod common;

const FD_LIMIT: libc::rlim_t = 256;

fn lower_fd_limit() {
    let mut limit = libc::rlimit {
        rlim_cur: 0,
        rlim_max: 0,
    };
    assert_eq!(unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut limit) }, 0);
    limit.rlim_cur = FD_LIMIT.min(limit.rlim_max);
    assert_eq!(unsafe { libc::setrlimit(libc::RLIMIT_NOFILE, &limit) }, 0);
}

/// Open `/dev/null` until the descriptor table is full.
fn exhaust_descriptors() -> Vec<File> {
    let mut held = Vec::new();
    loop {
        match File::open("/dev/null") {
            Ok(file) => held.push(file),
            Err(e) => {
                assert_eq!(e.raw_os_error(), Some(libc::EMFILE), "{e}");
                return held;
            }
        }
    }
}

#[tokio::test]
async fn test_accept_survives_descriptor_exhaustion() {
    lower_fd_limit();
    let server = common::start_server("apple\nbanana\n").await;

    let mut held = exhaust_descriptors();
    // One free slot: enough for the client socket, none left for accept.
    drop(held.pop());
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(b"apple").await.unwrap();
    stream.shutdown().await.unwrap();

    tokio::time::sleep(ACCEPT_BACKOFF * 3).await;
    assert!(!server.task.is_finished(), "accept loop gave up");
    assert!(!server.handle.is_stopped());

    drop(held);

    let mut response = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response))
        .await
        .expect("queued connection should be served once descriptors free up")
        .unwrap();
    assert_eq!(response, b"STRING EXISTS\n");

    assert_eq!(server.client().query("cherry").await.unwrap(), Response::NotFound);
    server.stop().await;
}
