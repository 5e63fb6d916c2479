use serde::{Deserialize, Serialize};

/// A recorded tweet as stored under `tweets/byId/<id>`.
///
/// `created_at` keeps the timestamp string exactly as the upstream API
/// delivered it; the database treats it as opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetRecord {
    #[serde(rename = "tweetId")]
    pub tweet_id: String,
    pub likes: i64,
    pub retweets: i64,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// A change notification from a watched database path.
///
/// The payload of the underlying server-sent event is intentionally not
/// surfaced: watchers re-read the path on every notification, so only the
/// arrival of the event matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    /// The contents under the watched path changed (`put` or `patch`).
    Changed,
}
