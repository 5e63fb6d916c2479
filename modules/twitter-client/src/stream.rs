//! Filtered stream connection (`statuses/filter`).
//!
//! The endpoint delivers newline-delimited JSON statuses for as long as the
//! connection stays up; blank lines are keep-alives. Decoded statuses are
//! handed to the consumer over an mpsc channel, and the connection is
//! re-established with the backoff schedule Twitter documents (linear up to
//! one minute, then doubling up to sixteen minutes).

use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::{Result, TwitterError};
use crate::oauth::Credentials;
use crate::types::Status;

const DEFAULT_STREAM_URL: &str = "https://stream.twitter.com/1.1/statuses/filter.json";

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const LINEAR_BACKOFF_CEILING: Duration = Duration::from_secs(60);
const MAX_BACKOFF: Duration = Duration::from_secs(960);

/// Parameters for one filtered stream session.
#[derive(Debug, Clone)]
pub struct StreamFilter {
    /// Comma-separated track phrases.
    pub track: String,
    /// BCP 47 language restriction, e.g. `en`.
    pub language: String,
}

/// Filtered-stream client. One instance can open any number of sessions;
/// each `open` call spawns an independent connection task.
pub struct FilteredStream {
    credentials: Credentials,
    endpoint: String,
}

impl FilteredStream {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            endpoint: DEFAULT_STREAM_URL.to_string(),
        }
    }

    /// Open a session and receive its statuses.
    ///
    /// Connection and reconnection happen in a background task; the task
    /// exits once the returned receiver is dropped.
    pub fn open(&self, filter: StreamFilter) -> mpsc::Receiver<Status> {
        let (tx, rx) = mpsc::channel(256);
        let credentials = self.credentials.clone();
        let endpoint = self.endpoint.clone();

        tokio::spawn(async move {
            run_session(credentials, endpoint, filter, tx).await;
        });

        rx
    }
}

/// Connect, consume, reconnect — until the receiver goes away.
async fn run_session(
    credentials: Credentials,
    endpoint: String,
    filter: StreamFilter,
    tx: mpsc::Sender<Status>,
) {
    let http = match reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, "Could not build HTTP client for stream");
            return;
        }
    };

    let mut backoff = INITIAL_BACKOFF;

    loop {
        info!(track = %filter.track, "Connecting to filtered stream");

        match connect(&http, &credentials, &endpoint, &filter).await {
            Ok(resp) => {
                backoff = INITIAL_BACKOFF;
                if deliver_statuses(resp, &tx).await.is_err() {
                    return;
                }
                warn!("Filtered stream disconnected");
            }
            Err(e) => {
                warn!(error = %e, "Filtered stream connect failed");
            }
        }

        if tx.is_closed() {
            info!("Stream receiver dropped, ending session");
            return;
        }

        info!(delay_secs = backoff.as_secs(), "Reconnecting filtered stream after delay");
        tokio::time::sleep(backoff).await;
        backoff = if backoff < LINEAR_BACKOFF_CEILING {
            backoff + Duration::from_secs(1)
        } else {
            std::cmp::min(backoff * 2, MAX_BACKOFF)
        };
    }
}

/// Issue the signed POST and check the response status.
async fn connect(
    http: &reqwest::Client,
    credentials: &Credentials,
    endpoint: &str,
    filter: &StreamFilter,
) -> Result<reqwest::Response> {
    let params = [
        ("language", filter.language.as_str()),
        ("track", filter.track.as_str()),
    ];
    let authorization = credentials.authorization_header("POST", endpoint, &params)?;

    let resp = http
        .post(endpoint)
        .header("Authorization", authorization)
        .form(&params)
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(TwitterError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    Ok(resp)
}

/// Read one connection's worth of statuses. Returns `Err(())` once the
/// receiver is dropped and the whole session should end.
async fn deliver_statuses(
    resp: reqwest::Response,
    tx: &mpsc::Sender<Status>,
) -> std::result::Result<(), ()> {
    let mut body = resp.bytes_stream();
    let mut decoder = LineDecoder::default();

    while let Some(chunk) = body.next().await {
        let chunk: Bytes = match chunk {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Stream read error");
                return Ok(());
            }
        };

        for line in decoder.push(&chunk) {
            match serde_json::from_str::<Status>(&line) {
                Ok(status) => {
                    debug!(id = %status.id_str, "Stream status received");
                    if tx.send(status).await.is_err() {
                        info!("Stream receiver dropped");
                        return Err(());
                    }
                }
                Err(e) => {
                    // Limit notices, delete events and the like land here.
                    debug!(error = %e, payload = %line, "Skipping non-status stream message");
                }
            }
        }
    }

    Ok(())
}

/// Splits raw chunks into complete newline-terminated payload lines.
/// Blank lines (keep-alives) are swallowed.
#[derive(Debug, Default)]
struct LineDecoder {
    buffer: Vec<u8>,
}

impl LineDecoder {
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_complete_lines() {
        let mut decoder = LineDecoder::default();
        let lines = decoder.push(b"{\"a\":1}\r\n{\"b\":2}\r\n");
        assert_eq!(lines, vec!["{\"a\":1}", "{\"b\":2}"]);
    }

    #[test]
    fn holds_partial_lines_across_chunks() {
        let mut decoder = LineDecoder::default();
        assert!(decoder.push(b"{\"id_str\":").is_empty());
        let lines = decoder.push(b"\"7\"}\r\n");
        assert_eq!(lines, vec!["{\"id_str\":\"7\"}"]);
    }

    #[test]
    fn keep_alive_blank_lines_are_swallowed() {
        let mut decoder = LineDecoder::default();
        let lines = decoder.push(b"\r\n\r\n{\"a\":1}\r\n\r\n");
        assert_eq!(lines, vec!["{\"a\":1}"]);
    }

    #[test]
    fn decoded_lines_parse_as_statuses() {
        let mut decoder = LineDecoder::default();
        let payload = b"{\"id_str\":\"5\",\"created_at\":\"Sat Mar 10 12:00:00 +0000 2018\"}\r\n";
        let lines = decoder.push(payload);
        let status: Status = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(status.id_str, "5");
    }
}
