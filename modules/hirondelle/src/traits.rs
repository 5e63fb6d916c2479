// Write seam for recorded tweets.
//
// The consumer task only needs the two writes below, so they sit behind one
// trait: production uses FirebaseClient, tests use an in-memory mock. No
// network, no emulator.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use firebase_client::{FirebaseClient, TweetRecord};

#[async_trait]
pub trait TweetStore: Send + Sync {
    /// Persist the record under `tweets/byId/<id>`.
    async fn record_tweet(&self, record: &TweetRecord) -> Result<()>;

    /// Add `<id> = "true"` under `tweets/byKeyword/<keyword>`.
    async fn index_by_keyword(&self, keyword: &str, tweet_id: &str) -> Result<()>;
}

#[async_trait]
impl TweetStore for FirebaseClient {
    async fn record_tweet(&self, record: &TweetRecord) -> Result<()> {
        let path = format!("tweets/byId/{}", record.tweet_id);
        Ok(self.set(&path, record).await?)
    }

    async fn index_by_keyword(&self, keyword: &str, tweet_id: &str) -> Result<()> {
        let path = format!("tweets/byKeyword/{keyword}");
        let entry = HashMap::from([(tweet_id.to_string(), "true")]);
        Ok(self.update(&path, &entry).await?)
    }
}
