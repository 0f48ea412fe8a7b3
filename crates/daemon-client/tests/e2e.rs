//! End-to-end tests for daemon-client.
//!
//! Drives the real REST and streaming clients against an in-process
//! fake daemon: a raw TCP responder for HTTP and a tokio-tungstenite
//! acceptor for the log stream.

use std::net::SocketAddr;
use std::time::Duration;

use futures::SinkExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};

use client_core::{ApiError, LogItem, LogLevel, VaultId, VaultStatus};
use daemon_client::api::DaemonApi;
use daemon_client::http::ApiConfig;
use daemon_client::stream::{subscribe, StreamEvent, StreamTarget};

const VAULT_BODY: &str = r#"{"id":"abc123","remote_id":"abc123","size":10,"state":"ready","user_count":1,"file_count":2,"revision_count":3,"resource_uri":"/v1/vault/abc123","folder":"/home/u/v","ignore_paths":[],"crypt_info":{"aes_key_len":256,"rsa_key_len":4096,"key_algo":"RSA","transfer_algo":"AES","hash_algo":"SHA256","fingerprint":null}}"#;

// ============================================================================
// Helpers
// ============================================================================

/// Serve exactly one HTTP request with a canned response; yields the
/// request head (request line + headers) for assertions.
async fn spawn_responder(
    status_line: &'static str,
    body: &'static str,
) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind responder");
    let addr = listener.local_addr().expect("Failed to get local addr");
    let (head_tx, head_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("Failed to accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).await.expect("Failed to read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let head = String::from_utf8_lossy(&buf).to_string();

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        stream
            .write_all(response.as_bytes())
            .await
            .expect("Failed to write response");
        let _ = stream.shutdown().await;
        let _ = head_tx.send(head);
    });

    (addr, head_rx)
}

fn api_for(addr: SocketAddr) -> DaemonApi {
    let config =
        ApiConfig::new(&format!("http://{}/v1", addr), "tok").expect("Failed to build config");
    DaemonApi::new(config).expect("Failed to build client")
}

/// Next stream event, failing the test on timeout or stream end.
async fn next_event(
    subscription: &mut daemon_client::stream::Subscription<LogItem>,
) -> StreamEvent<LogItem> {
    timeout(Duration::from_secs(2), subscription.recv())
        .await
        .expect("Timed out waiting for stream event")
        .expect("Stream ended early")
}

// ============================================================================
// REST client
// ============================================================================

#[tokio::test]
async fn test_get_vault_end_to_end() {
    let (addr, head_rx) = spawn_responder("200 OK", VAULT_BODY).await;
    let api = api_for(addr);

    let vault = api
        .vault(&VaultId::from("abc123"))
        .await
        .expect("Request failed");

    // The path got its trailing separator and the auth header was sent.
    let head = head_rx.await.expect("No request captured");
    assert!(
        head.starts_with("GET /v1/vault/abc123/ HTTP/1.1"),
        "unexpected request head: {}",
        head
    );
    assert!(head.to_ascii_lowercase().contains("x-authtoken: tok"));

    assert_eq!(vault.state, VaultStatus::Ready);
    assert_eq!(vault.crypt_info.aes_key_len, 256);
    assert_eq!(vault.folder.as_deref(), Some("/home/u/v"));
}

#[tokio::test]
async fn test_get_stats_has_no_trailing_separator() {
    let (addr, head_rx) = spawn_responder("200 OK", r#"{"uploads":1,"downloads":2}"#).await;
    let api = api_for(addr);

    let stats = api.stats().await.expect("Request failed");
    assert_eq!(stats.uploads, 1);

    let head = head_rx.await.expect("No request captured");
    assert!(head.starts_with("GET /v1/stats HTTP/1.1"));
}

#[tokio::test]
async fn test_http_error_maps_to_status_failure() {
    let (addr, _head_rx) = spawn_responder("500 Internal Server Error", "boom").await;
    let api = api_for(addr);

    let err = api.vaults().await.expect_err("Expected a failure");
    assert_eq!(
        err,
        ApiError::Status {
            code: 500,
            body: "boom".into()
        }
    );
}

#[tokio::test]
async fn test_schema_mismatch_maps_to_decode_failure() {
    // Well-formed transport, malformed payload: must be Decode, not Network.
    let (addr, _head_rx) = spawn_responder("200 OK", r#"{"state": "exploded"}"#).await;
    let api = api_for(addr);

    let err = api
        .vault(&VaultId::from("abc123"))
        .await
        .expect_err("Expected a failure");
    assert!(matches!(err, ApiError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_unreachable_daemon_maps_to_network_failure() {
    // Nothing listens here; bind-then-drop guarantees a free port.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = api_for(addr);
    let err = api.vaults().await.expect_err("Expected a failure");
    assert!(matches!(err, ApiError::Network(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_stuck_request_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        // Accept and go silent; the client must give up on its own.
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let mut config = ApiConfig::new(&format!("http://{}/v1", addr), "tok").unwrap();
    config.request_timeout = Duration::from_millis(200);
    let api = DaemonApi::new(config).unwrap();

    let err = timeout(Duration::from_secs(5), api.vaults())
        .await
        .expect("Client did not time out")
        .expect_err("Expected a failure");
    assert_eq!(err, ApiError::Timeout);
}

// ============================================================================
// Streaming client
// ============================================================================

#[tokio::test]
async fn test_log_stream_survives_malformed_message() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("Failed to accept");
        let mut ws = accept_async(stream).await.expect("WebSocket upgrade failed");

        let first = r#"{"level": "info", "message": "first"}"#;
        let second = r#"{"level": "WARNING", "message": "second"}"#;
        ws.send(Message::Text(first.to_string())).await.unwrap();
        ws.send(Message::Text("not json at all".to_string()))
            .await
            .unwrap();
        ws.send(Message::Text(second.to_string())).await.unwrap();

        // Keep the socket open until the client has drained everything.
        tokio::time::sleep(Duration::from_millis(500)).await;
    });

    let config = ApiConfig::new(&format!("http://{}/v1", addr), "tok").unwrap();
    let mut subscription = subscribe::<LogItem>(&config, StreamTarget::DaemonLog)
        .await
        .expect("Subscribe failed");

    match next_event(&mut subscription).await {
        StreamEvent::Item(item) => {
            assert_eq!(item.level, LogLevel::Info);
            assert_eq!(item.message, "first");
        }
        other => panic!("Expected first item, got {:?}", other),
    }

    // The malformed message is reported, not fatal.
    assert!(matches!(
        next_event(&mut subscription).await,
        StreamEvent::DecodeFailed(_)
    ));

    match next_event(&mut subscription).await {
        StreamEvent::Item(item) => {
            assert_eq!(item.level, LogLevel::Warning);
            assert_eq!(item.message, "second");
        }
        other => panic!("Expected second item, got {:?}", other),
    }
}

#[tokio::test]
async fn test_subscription_close_ends_stream() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("Failed to accept");
        let mut ws = accept_async(stream).await.expect("WebSocket upgrade failed");
        // Trickle messages forever; the client side is what closes.
        loop {
            let line = r#"{"level": "debug", "message": "tick"}"#;
            if ws.send(Message::Text(line.to_string())).await.is_err() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    });

    let config = ApiConfig::new(&format!("http://{}/v1", addr), "tok").unwrap();
    let mut subscription = subscribe::<LogItem>(&config, StreamTarget::DaemonLog)
        .await
        .expect("Subscribe failed");

    subscription.close();
    // After close the channel drains and then ends.
    let result = timeout(Duration::from_secs(2), async {
        while subscription.recv().await.is_some() {}
    })
    .await;
    assert!(result.is_ok(), "Subscription did not end after close");
}
