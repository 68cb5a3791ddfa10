//! End-to-end tests over real TCP connections.

use std::time::Duration;

use line_lookup::config::NullBytePolicy;
use line_lookup::protocol::MAX_STRING_LENGTH;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

mod common;

use common::{assert_exists, assert_not_found, local_options, query, settings, source_file, start_server};

#[tokio::test]
async fn cached_mode_answers_exists_and_not_found() {
    let file = source_file("line1\nline2\nline3\n");
    let server = start_server(settings(file.path(), false), local_options()).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    assert_exists(&query(&mut client, b"line2").await);
    assert_not_found(&query(&mut client, b"missing").await);

    server.stop().await;
}

#[tokio::test]
async fn reread_mode_answers_exists_and_not_found() {
    let file = source_file("line1\nline2\nline3\n");
    let server = start_server(settings(file.path(), true), local_options()).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    assert_exists(&query(&mut client, b"line3\n").await);
    assert_not_found(&query(&mut client, b"line4").await);

    server.stop().await;
}

#[tokio::test]
async fn reread_mode_sees_edits_between_queries() {
    let file = source_file("first\n");
    let server = start_server(settings(file.path(), true), local_options()).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    assert_not_found(&query(&mut client, b"second").await);

    std::fs::write(file.path(), "first\nsecond\n").unwrap();
    assert_exists(&query(&mut client, b"second").await);

    server.stop().await;
}

#[tokio::test]
async fn connection_serves_many_cycles() {
    let file = source_file("alpha\nbeta\n");
    let server = start_server(settings(file.path(), false), local_options()).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    for _ in 0..20 {
        assert_exists(&query(&mut client, b"alpha").await);
        assert_not_found(&query(&mut client, b"gamma").await);
    }

    server.stop().await;
}

#[tokio::test]
async fn oversized_query_keeps_connection_usable() {
    let file = source_file("valid\n");
    let server = start_server(settings(file.path(), false), local_options()).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    let long = vec![b'x'; MAX_STRING_LENGTH + 1];
    assert_eq!(query(&mut client, &long).await, "ERROR: Query string too long.\n");
    assert_exists(&query(&mut client, b"valid").await);

    server.stop().await;
}

#[tokio::test]
async fn null_bytes_are_stripped_by_default() {
    let file = source_file("helloworld\nhello world\n");
    let server = start_server(settings(file.path(), false), local_options()).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    assert_exists(&query(&mut client, b"hello\x00world").await);
    assert_exists(&query(&mut client, b"\x00\x00helloworld\x00").await);

    server.stop().await;
}

#[tokio::test]
async fn null_bytes_become_spaces_when_configured() {
    let file = source_file("hello world\n");
    let options = line_lookup::ServerOptions {
        null_byte_policy: NullBytePolicy::Space,
        ..local_options()
    };
    let server = start_server(settings(file.path(), false), options).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    assert_exists(&query(&mut client, b"hello\x00world").await);

    server.stop().await;
}

#[tokio::test]
async fn idle_timeout_closes_quiet_clients() {
    let file = source_file("line1\n");
    let options = line_lookup::ServerOptions {
        idle_timeout: Some(Duration::from_millis(100)),
        ..local_options()
    };
    let server = start_server(settings(file.path(), false), options).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    assert_exists(&query(&mut client, b"line1").await);

    let mut buf = [0u8; 16];
    let n = tokio::time::timeout(Duration::from_secs(5), client.read(&mut buf))
        .await
        .expect("server should close the idle connection")
        .unwrap_or(0);
    assert_eq!(n, 0);

    server.stop().await;
}

#[tokio::test]
async fn shutdown_closes_open_connections() {
    let file = source_file("line1\n");
    let server = start_server(settings(file.path(), false), local_options()).await;

    let mut client = TcpStream::connect(server.addr).await.unwrap();
    assert_exists(&query(&mut client, b"line1").await);

    let tracker = server.server.tracker().clone();
    server.stop().await;

    let mut buf = [0u8; 16];
    assert_eq!(client.read(&mut buf).await.unwrap_or(0), 0);
    assert_eq!(tracker.active_count(), 0);
}
