//! Long-lived event subscriptions over the daemon's streaming transport.
//!
//! Each subscription decodes one JSON event per message and forwards it
//! over a channel. A malformed message is reported as a typed error and
//! the stream keeps running; only transport closure ends it. One
//! subscription per (entity, kind) is the caller's responsibility —
//! duplicates are not deduplicated here.

use client_core::{ApiError, VaultId};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{client::IntoClientRequest, http::HeaderValue, Error as WsError, Message},
};
use tracing::{debug, error};

use crate::http::{stream_url, ApiConfig, AUTH_HEADER};

/// Which stream to subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTarget {
    /// Live log lines of one vault.
    VaultLog(VaultId),
    /// Live history events of one vault.
    VaultHistory(VaultId),
    /// The daemon-wide log.
    DaemonLog,
}

impl StreamTarget {
    fn path(&self) -> String {
        match self {
            StreamTarget::VaultLog(id) => format!("vault/{}/logstream", id),
            StreamTarget::VaultHistory(id) => format!("vault/{}/historystream", id),
            StreamTarget::DaemonLog => "logstream".to_string(),
        }
    }
}

/// One event delivered by a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent<T> {
    Item(T),
    /// A single message failed to decode; the stream continues.
    DecodeFailed(String),
}

/// Handle to a running subscription.
///
/// Dropping (or `close`) aborts the read task and tears the socket down;
/// the caller ties this to dialog-open/login lifetime.
pub struct Subscription<T> {
    events: mpsc::UnboundedReceiver<StreamEvent<T>>,
    read_task: Option<JoinHandle<()>>,
}

impl<T> Subscription<T> {
    /// Next event, or `None` once the stream has closed.
    pub async fn recv(&mut self) -> Option<StreamEvent<T>> {
        self.events.recv().await
    }

    pub fn close(&mut self) {
        if let Some(task) = self.read_task.take() {
            task.abort();
        }
        self.events.close();
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(task) = self.read_task.take() {
            task.abort();
        }
    }
}

/// Open a subscription for `target`, decoding each message into `T`.
pub async fn subscribe<T>(
    config: &ApiConfig,
    target: StreamTarget,
) -> Result<Subscription<T>, ApiError>
where
    T: DeserializeOwned + Send + 'static,
{
    let url = stream_url(&config.base_url, &target.path())?;
    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| ApiError::Network(e.to_string()))?;
    let token = HeaderValue::from_str(&config.auth_token)
        .map_err(|e| ApiError::Network(format!("Invalid auth token: {}", e)))?;
    request.headers_mut().insert(AUTH_HEADER, token);

    let (ws_stream, _) = connect_async(request)
        .await
        .map_err(|e| ApiError::Network(e.to_string()))?;

    debug!("Subscribed to {}", url);

    let (event_tx, events) = mpsc::unbounded_channel();
    let (_write, read) = ws_stream.split();
    let read_task = tokio::spawn(async move {
        read_loop(url, read, event_tx).await;
    });

    Ok(Subscription {
        events,
        read_task: Some(read_task),
    })
}

async fn read_loop<T, S>(url: String, mut read: S, event_tx: mpsc::UnboundedSender<StreamEvent<T>>)
where
    T: DeserializeOwned,
    S: futures::Stream<Item = Result<Message, WsError>> + Unpin,
{
    loop {
        match read.next().await {
            Some(Ok(msg)) => {
                let data = match msg {
                    Message::Text(text) => text.as_bytes().to_vec(),
                    Message::Binary(data) => data.to_vec(),
                    Message::Ping(_) | Message::Pong(_) => continue,
                    Message::Close(_) => {
                        debug!("Stream {} closed by daemon", url);
                        break;
                    }
                    Message::Frame(_) => continue,
                };

                let event = match serde_json::from_slice::<T>(&data) {
                    Ok(item) => StreamEvent::Item(item),
                    // One bad message must not kill the stream.
                    Err(e) => StreamEvent::DecodeFailed(e.to_string()),
                };
                if event_tx.send(event).is_err() {
                    break;
                }
            }
            Some(Err(e)) => {
                match e {
                    WsError::ConnectionClosed | WsError::AlreadyClosed => {
                        debug!("Stream {} closed", url);
                    }
                    _ => {
                        error!("Stream error on {}: {}", url, e);
                    }
                }
                break;
            }
            None => {
                debug!("Stream {} ended", url);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_target_paths() {
        let id = VaultId::from("abc123");
        assert_eq!(
            StreamTarget::VaultLog(id.clone()).path(),
            "vault/abc123/logstream"
        );
        assert_eq!(
            StreamTarget::VaultHistory(id).path(),
            "vault/abc123/historystream"
        );
        assert_eq!(StreamTarget::DaemonLog.path(), "logstream");
    }
}
