//! Live sync channel: a persistent WebSocket subscription to catalog updates.
//!
//! The channel authenticates the connection with the session's bearer token,
//! parses incoming envelopes, and feeds full-snapshot replacements into the
//! [`CatalogStore`]. All failures are absorbed at this boundary: a malformed
//! frame is dropped and logged, a transport loss flips the connectivity flag
//! and ends the session. The last good snapshot always stays queryable.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──connect(token)──▶ Connecting ──handshake──▶ Connected
//!      ▲                               │                        │
//!      └────────────── failure ────────┴──── loss / teardown ───┘
//! ```
//!
//! A closed connection is terminal for the session: there is no automatic
//! retry, and the caller reconnects with a (possibly same) token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};
use url::Url;

use crate::models::Document;
use crate::store::CatalogStore;

/// Envelope kind that carries a full catalog snapshot.
pub const UPDATE_KIND: &str = "UPDATE";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Tagged message wrapper received over the live channel.
///
/// Only `UPDATE` envelopes are acted upon; any other kind is dropped and
/// logged locally, never raised to the caller.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Owns one live subscription and the right to mutate the catalog store.
///
/// Constructed around an explicitly shared store (no ambient state), then
/// consumed by [`connect`](SyncChannel::connect), which hands control of the
/// message loop to a background task and returns a [`SyncHandle`].
pub struct SyncChannel {
    store: Arc<CatalogStore>,
    state: ConnectionState,
    connected: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
}

impl SyncChannel {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self {
            store,
            state: ConnectionState::Disconnected,
            connected: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn begin_connect(&mut self) {
        self.state = ConnectionState::Connecting;
        self.connected.store(false, Ordering::SeqCst);
    }

    /// The only transition that marks the session live.
    fn handshake_complete(&mut self) {
        self.state = ConnectionState::Connected;
        self.connected.store(true, Ordering::SeqCst);
        info!("live channel connected");
    }

    /// Any loss, failure, or teardown lands here. The flag flips
    /// immediately; there is no grace period and nothing is buffered.
    fn connection_lost(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Open the channel, presenting `token` as a connection-time credential,
    /// and start processing updates in a background task.
    pub async fn connect(mut self, ws_url: &Url, token: &str) -> Result<SyncHandle> {
        self.begin_connect();

        let mut request_url = ws_url.clone();
        request_url.query_pairs_mut().append_pair("token", token);

        let (ws, _response) = match connect_async(request_url.as_str()).await {
            Ok(conn) => conn,
            Err(err) => {
                self.connection_lost();
                return Err(err).context("opening live update channel");
            }
        };
        self.handshake_complete();

        let connected = Arc::clone(&self.connected);
        let active = Arc::clone(&self.active);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (updates_tx, updates_rx) = watch::channel(0usize);
        let task = tokio::spawn(self.run(ws, shutdown_rx, updates_tx));

        Ok(SyncHandle {
            connected,
            active,
            shutdown: shutdown_tx,
            updates: updates_rx,
            task,
        })
    }

    async fn run(
        mut self,
        mut ws: WsStream,
        mut shutdown: watch::Receiver<bool>,
        updates: watch::Sender<usize>,
    ) {
        let mut applied = 0usize;
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!("teardown requested, leaving message loop");
                    break;
                }
                frame = ws.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if self.handle_frame(&text) {
                            applied += 1;
                            let _ = updates.send(applied);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("live channel closed by remote");
                        break;
                    }
                    Some(Ok(_)) => {
                        debug!("ignoring non-text frame");
                    }
                    Some(Err(err)) => {
                        warn!(error = %err, "live channel transport error");
                        break;
                    }
                }
            }
        }
        self.connection_lost();
    }

    /// Parse one text frame and apply it if it is a well-formed `UPDATE`.
    ///
    /// Returns whether a snapshot was applied. Every other outcome leaves
    /// the held snapshot untouched: an unparseable frame, an envelope of
    /// another kind, a document list that does not decode, or an update
    /// arriving after teardown was requested.
    fn handle_frame(&self, text: &str) -> bool {
        let envelope: Envelope = match serde_json::from_str(text) {
            Ok(env) => env,
            Err(err) => {
                warn!(error = %err, "dropping unparseable frame");
                return false;
            }
        };
        if envelope.kind != UPDATE_KIND {
            debug!(kind = %envelope.kind, "ignoring envelope");
            return false;
        }
        let documents: Vec<Document> = match serde_json::from_value(envelope.data) {
            Ok(docs) => docs,
            Err(err) => {
                warn!(error = %err, "dropping UPDATE with malformed document list");
                return false;
            }
        };
        // The underlying connection cannot abort an already-scheduled
        // callback, so teardown is enforced here, before the mutation.
        if !self.active.load(Ordering::SeqCst) {
            debug!("dropping in-flight update after teardown");
            return false;
        }
        info!(documents = documents.len(), "applying catalog snapshot");
        self.store.replace(documents);
        true
    }
}

/// Caller-side handle to a connected channel.
pub struct SyncHandle {
    connected: Arc<AtomicBool>,
    active: Arc<AtomicBool>,
    shutdown: watch::Sender<bool>,
    updates: watch::Receiver<usize>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Current connectivity flag. Stale-but-available catalog contents
    /// remain readable from the store regardless of this value.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Subscribe to applied-update notifications. The receiver observes a
    /// running count of applied snapshots and closes when the channel ends.
    pub fn updates(&self) -> watch::Receiver<usize> {
        self.updates.clone()
    }

    /// Tear the session down. The active flag is cleared before the loop is
    /// signalled, so no message callback can mutate the store afterwards,
    /// even one already in flight.
    pub async fn close(self) {
        self.active.store(false, Ordering::SeqCst);
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn channel() -> (SyncChannel, Arc<CatalogStore>) {
        let store = Arc::new(CatalogStore::new());
        (SyncChannel::new(Arc::clone(&store)), store)
    }

    fn update_frame(data: serde_json::Value) -> String {
        json!({ "type": "UPDATE", "data": data }).to_string()
    }

    #[test]
    fn transitions_follow_the_cycle() {
        let (mut ch, _store) = channel();
        assert_eq!(ch.state(), ConnectionState::Disconnected);
        assert!(!ch.is_connected());

        ch.begin_connect();
        assert_eq!(ch.state(), ConnectionState::Connecting);
        assert!(!ch.is_connected());

        ch.handshake_complete();
        assert_eq!(ch.state(), ConnectionState::Connected);
        assert!(ch.is_connected());

        ch.connection_lost();
        assert_eq!(ch.state(), ConnectionState::Disconnected);
        assert!(!ch.is_connected());
    }

    #[test]
    fn connect_failure_returns_to_disconnected() {
        let (mut ch, _store) = channel();
        ch.begin_connect();
        ch.connection_lost();
        assert_eq!(ch.state(), ConnectionState::Disconnected);
        assert!(!ch.is_connected());
    }

    #[test]
    fn update_envelope_replaces_snapshot() {
        let (ch, store) = channel();
        let frame = update_frame(json!([
            { "id": 1, "filename": "resume.pdf", "category": "Career" },
            { "id": 2, "filename": "taxes.pdf", "category": "Financial" }
        ]));
        assert!(ch.handle_frame(&frame));
        assert_eq!(store.len(), 2);
        assert_eq!(store.current()[0].filename, "resume.pdf");
    }

    #[test]
    fn empty_update_clears_the_catalog() {
        let (ch, store) = channel();
        assert!(ch.handle_frame(&update_frame(json!([{ "id": 1 }]))));
        assert!(ch.handle_frame(&update_frame(json!([]))));
        assert!(store.is_empty());
    }

    #[test]
    fn other_envelope_kinds_are_ignored() {
        let (ch, store) = channel();
        assert!(ch.handle_frame(&update_frame(json!([{ "id": 1 }]))));

        assert!(!ch.handle_frame(&json!({ "type": "PING" }).to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unparseable_frames_are_dropped() {
        let (ch, store) = channel();
        assert!(ch.handle_frame(&update_frame(json!([{ "id": 1 }]))));

        assert!(!ch.handle_frame("{not json"));
        assert!(!ch.handle_frame(""));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn malformed_document_list_never_partially_replaces() {
        let (ch, store) = channel();
        assert!(ch.handle_frame(&update_frame(json!([{ "id": 1 }, { "id": 2 }]))));

        // data is not an array of documents; the previous snapshot stays.
        assert!(!ch.handle_frame(&update_frame(json!("oops"))));
        assert!(!ch.handle_frame(&json!({ "type": "UPDATE" }).to_string()));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn updates_after_teardown_do_not_mutate() {
        let (ch, store) = channel();
        assert!(ch.handle_frame(&update_frame(json!([{ "id": 1 }]))));

        ch.active.store(false, Ordering::SeqCst);
        assert!(!ch.handle_frame(&update_frame(json!([{ "id": 2 }, { "id": 3 }]))));
        assert_eq!(store.len(), 1);
        assert_eq!(store.current()[0].id, 1);
    }

    #[test]
    fn unknown_document_fields_survive_the_channel() {
        let (ch, store) = channel();
        let frame = update_frame(json!([
            { "id": 1, "filename": "a.pdf", "tags": ["x"], "owner": "root" }
        ]));
        assert!(ch.handle_frame(&frame));
        let current = store.current();
        assert_eq!(current[0].extra["owner"], json!("root"));
        assert_eq!(current[0].tags_text().unwrap(), "x");
    }
}
