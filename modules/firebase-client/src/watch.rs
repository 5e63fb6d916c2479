//! SSE change feed for a database path.
//!
//! Firebase's REST streaming protocol is server-sent events: `put` and
//! `patch` frames carry data changes, `keep-alive` frames arrive every ~30s,
//! and `cancel`/`auth_revoked` mean the listener must re-establish the
//! connection. Watchers only care that *something* changed, so frames are
//! collapsed into [`WatchEvent::Changed`] notifications.

use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{FirebaseError, Result};
use crate::types::WatchEvent;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(64);

/// One decoded server-sent event from the change feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SseEvent {
    /// Data under the path was replaced or merged.
    Changed,
    /// Periodic no-op from the server.
    KeepAlive,
    /// The server is closing the stream (rules change, revoked auth).
    Cancelled,
}

/// Line-oriented SSE decoder.
///
/// Tracks the current `event:` name; a `data:` line completes the frame.
/// Firebase always sends the name before the payload, so no reassembly of
/// multi-line data is needed.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    event_name: Option<String>,
}

impl SseDecoder {
    pub(crate) fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        let line = line.trim_end_matches('\r');

        if let Some(name) = line.strip_prefix("event:") {
            self.event_name = Some(name.trim().to_string());
            return None;
        }

        if line.strip_prefix("data:").is_some() {
            return match self.event_name.take().as_deref() {
                Some("put") | Some("patch") => Some(SseEvent::Changed),
                Some("keep-alive") => Some(SseEvent::KeepAlive),
                Some("cancel") | Some("auth_revoked") => Some(SseEvent::Cancelled),
                other => {
                    debug!(event = ?other, "Ignoring unknown SSE event");
                    None
                }
            };
        }

        // Blank lines end a frame; comment lines (leading ':') are padding.
        if line.is_empty() {
            self.event_name = None;
        }
        None
    }
}

/// Open the event-stream request and verify the server accepted it.
pub(crate) async fn subscribe(http: &reqwest::Client, url: &str) -> Result<reqwest::Response> {
    let resp = http
        .get(url)
        .header("Accept", "text/event-stream")
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(FirebaseError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    Ok(resp)
}

/// Drive the watch until the receiver is dropped.
///
/// The initial response is consumed first; afterwards the connection is
/// re-established indefinitely with exponential backoff, so a watch survives
/// idle disconnects and server-side stream resets.
pub(crate) async fn run(
    http: reqwest::Client,
    url: String,
    initial: reqwest::Response,
    tx: mpsc::Sender<WatchEvent>,
) {
    let mut backoff = INITIAL_BACKOFF;

    if read_events(initial, &tx).await.is_err() {
        return;
    }

    loop {
        info!(delay_secs = backoff.as_secs(), "Re-establishing watch after delay");
        tokio::time::sleep(backoff).await;

        match subscribe(&http, &url).await {
            Ok(resp) => {
                backoff = INITIAL_BACKOFF;
                if read_events(resp, &tx).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                warn!(error = %e, "Watch reconnect failed");
                backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
            }
        }
    }
}

/// Read one connection's worth of events. Returns `Err(())` when the
/// receiver side is gone and the watch should stop entirely.
async fn read_events(
    resp: reqwest::Response,
    tx: &mpsc::Sender<WatchEvent>,
) -> std::result::Result<(), ()> {
    let mut body = resp.bytes_stream();
    let mut buffer = String::new();
    let mut decoder = SseDecoder::default();

    while let Some(chunk) = body.next().await {
        let chunk: Bytes = match chunk {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Watch stream interrupted");
                return Ok(());
            }
        };
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(pos) = buffer.find('\n') {
            let line: String = buffer.drain(..=pos).collect();
            match decoder.feed_line(line.trim_end_matches('\n')) {
                Some(SseEvent::Changed) => {
                    if tx.send(WatchEvent::Changed).await.is_err() {
                        info!("Watch receiver dropped, stopping");
                        return Err(());
                    }
                }
                Some(SseEvent::KeepAlive) => debug!("Watch keep-alive"),
                Some(SseEvent::Cancelled) => {
                    warn!("Server cancelled the watch, reconnecting");
                    return Ok(());
                }
                None => {}
            }
        }
    }

    info!("Watch stream ended, reconnecting");
    Ok(())
}
