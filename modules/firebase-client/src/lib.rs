pub mod error;
pub mod types;
mod watch;

pub use error::{FirebaseError, Result};
pub use types::{TweetRecord, WatchEvent};

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

/// Minimal Firebase Realtime Database REST client.
///
/// Covers exactly what the listener needs: shallow key reads, `PUT`/`PATCH`
/// writes, and an SSE watch on a path. Auth is the database secret (or a
/// legacy token) passed via the `auth` query parameter.
pub struct FirebaseClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl FirebaseClient {
    pub fn new(base_url: &str, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn node_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    /// Read only the child keys under a path (`shallow=true`).
    ///
    /// A missing node reads as JSON `null` and yields an empty vec. Key
    /// order is whatever the server returns; callers must not rely on it.
    pub async fn shallow_keys(&self, path: &str) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(self.node_url(path))
            .query(&[("shallow", "true"), ("auth", self.token.as_str())])
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

        let value: Value = resp.json().await?;
        Ok(object_keys(&value))
    }

    /// Replace the data at a path (`PUT`).
    pub async fn set<T: Serialize>(&self, path: &str, data: &T) -> Result<()> {
        let resp = self
            .client
            .put(self.node_url(path))
            .query(&[("auth", &self.token)])
            .json(data)
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
        Ok(())
    }

    /// Merge the given children into a path (`PATCH`), leaving siblings alone.
    pub async fn update<T: Serialize>(&self, path: &str, data: &T) -> Result<()> {
        let resp = self
            .client
            .patch(self.node_url(path))
            .query(&[("auth", &self.token)])
            .json(data)
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
        Ok(())
    }

    /// Watch a path for changes.
    ///
    /// The initial subscription is established before this returns, so a
    /// bad URL or rejected auth surfaces here rather than inside the
    /// background task. After that the feed reconnects on its own; it stops
    /// only once the returned receiver is dropped.
    pub async fn watch(&self, path: &str) -> Result<mpsc::Receiver<WatchEvent>> {
        // Dedicated client: the default one is fine for point requests, but
        // the SSE connection must never hit a whole-request timeout.
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;

        let url = format!(
            "{}?auth={}",
            self.node_url(path),
            self.token
        );

        let initial = watch::subscribe(&http, &url).await?;
        tracing::info!(path, "Watch established");

        let (tx, rx) = mpsc::channel(16);
        tokio::spawn(watch::run(http, url, initial, tx));
        Ok(rx)
    }
}

/// Child keys of a JSON object; empty for `null` or any non-object.
fn object_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}
