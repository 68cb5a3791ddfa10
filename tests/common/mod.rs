//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use line_lookup::config::{ServerOptions, Settings};
use line_lookup::lifecycle::{start_with_settings, Shutdown};
use line_lookup::LookupServer;
use tempfile::NamedTempFile;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// A running server on an ephemeral localhost port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub server: Arc<LookupServer>,
    pub shutdown: Shutdown,
    pub task: JoinHandle<()>,
}

impl TestServer {
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.task.await;
    }
}

/// Write `content` to a fresh temporary file.
pub fn source_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

pub fn settings(source: &Path, reread_on_query: bool) -> Settings {
    Settings {
        source_path: Some(source.to_path_buf()),
        reread_on_query,
        ..Settings::default()
    }
}

pub fn local_options() -> ServerOptions {
    ServerOptions {
        bind_address: "127.0.0.1:0".to_string(),
        ..ServerOptions::default()
    }
}

/// Start a server over `settings` and return once it is accepting.
pub async fn start_server(settings: Settings, options: ServerOptions) -> TestServer {
    let started = start_with_settings(settings, None, options).await.unwrap();
    let addr = started.listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = started.server.clone();

    let run_shutdown = shutdown.clone();
    let task = tokio::spawn(async move {
        let _ = started.server.run(started.listener, run_shutdown).await;
    });

    TestServer {
        addr,
        server,
        shutdown,
        task,
    }
}

/// Send one request and read one response line.
pub async fn query(stream: &mut TcpStream, payload: &[u8]) -> String {
    stream.write_all(payload).await.unwrap();
    let mut buf = vec![0u8; 1024];
    let n = stream.read(&mut buf).await.unwrap();
    String::from_utf8(buf[..n].to_vec()).unwrap()
}

/// Check a timed response and return its execution time.
pub fn parse_timed(line: &str, status: &str) -> f64 {
    let seconds = line
        .strip_prefix(status)
        .and_then(|rest| rest.strip_prefix(" (Execution Time: "))
        .and_then(|rest| rest.strip_suffix(" seconds)\n"))
        .unwrap_or_else(|| panic!("expected {status:?} response, got {line:?}"));
    let (_, decimals) = seconds.split_once('.').unwrap();
    assert_eq!(decimals.len(), 4, "time not printed with 4 decimals: {line:?}");
    seconds.parse().unwrap()
}

pub fn assert_exists(line: &str) {
    parse_timed(line, "STRING EXISTS");
}

pub fn assert_not_found(line: &str) {
    parse_timed(line, "STRING NOT FOUND");
}
