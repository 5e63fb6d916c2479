//! The keyword-watch control loop and the per-session tweet consumer.
//!
//! One control task waits for change notifications on the keyword path.
//! Each notification stops the running stream session (if any), re-reads
//! the keyword set, and opens a fresh filtered stream with a new consumer
//! task. At most one session exists at a time; the tracked-identifier
//! cache is shared across sessions so a keyword change never causes a
//! tweet to be recorded twice.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use firebase_client::{FirebaseClient, TweetRecord, WatchEvent};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use twitter_client::{FilteredStream, Status, StreamFilter};

use crate::dedup::DedupCache;
use crate::filter;
use crate::matcher::{self, Thresholds};
use crate::traits::TweetStore;

/// Database path whose child keys form the keyword set.
pub const KEYWORDS_PATH: &str = "keywords/byId";

/// Capacity of the tracked-identifier cache.
pub const TRACKED_CAPACITY: usize = 10_000;

/// Language restriction applied to every stream session.
const STREAM_LANGUAGE: &str = "en";

pub struct Listener {
    store: Arc<FirebaseClient>,
    stream: FilteredStream,
    thresholds: Thresholds,
    tracked: Arc<Mutex<DedupCache>>,
}

/// One live stream session: its shutdown signal and consumer task.
struct Session {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<Result<()>>,
}

impl Listener {
    pub fn new(store: Arc<FirebaseClient>, stream: FilteredStream, thresholds: Thresholds) -> Self {
        Self {
            store,
            stream,
            thresholds,
            tracked: Arc::new(Mutex::new(DedupCache::new(TRACKED_CAPACITY))),
        }
    }

    /// Run until the watch closes or a fatal store error occurs.
    ///
    /// Failure to establish the initial keyword watch is fatal, as is any
    /// failed keyword read or tweet write; all of them propagate out of
    /// here and end the process.
    pub async fn run(&self) -> Result<()> {
        let mut notifications = self
            .store
            .watch(KEYWORDS_PATH)
            .await
            .context("establishing keyword watch")?;

        let mut session: Option<Session> = None;

        loop {
            tokio::select! {
                event = notifications.recv() => match event {
                    Some(WatchEvent::Changed) => {
                        info!("Keyword change notification");
                        self.restart_session(&mut session).await?;
                    }
                    None => {
                        info!("Keyword watch closed, shutting down");
                        stop_session(&mut session).await?;
                        return Ok(());
                    }
                },
                result = session_finished(&mut session) => {
                    // The consumer ended on its own: a store failure is
                    // fatal, a closed stream just waits for the next
                    // keyword change to reconnect.
                    result?;
                    info!("Stream session ended, waiting for next keyword change");
                }
            }
        }
    }

    /// Stop the current session, re-read keywords, start a new session.
    async fn restart_session(&self, session: &mut Option<Session>) -> Result<()> {
        stop_session(session).await?;

        let keywords = self
            .store
            .shallow_keys(KEYWORDS_PATH)
            .await
            .context("fetching keywords")?;
        info!(?keywords, "Keyword set updated");

        if keywords.is_empty() {
            info!("No keywords configured, leaving stream down");
            return Ok(());
        }

        let track = filter::track_expression(&keywords);
        debug!(track = %track, "Opening filtered stream");

        let statuses = self.stream.open(StreamFilter {
            track,
            language: STREAM_LANGUAGE.to_string(),
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(consume(
            statuses,
            shutdown_rx,
            keywords,
            self.thresholds,
            Arc::clone(&self.store) as Arc<dyn TweetStore>,
            Arc::clone(&self.tracked),
        ));

        *session = Some(Session {
            shutdown: shutdown_tx,
            handle,
        });
        Ok(())
    }
}

/// Signal the session's consumer to stop and wait for it to finish.
/// An error the consumer hit before being stopped is still fatal.
async fn stop_session(session: &mut Option<Session>) -> Result<()> {
    if let Some(s) = session.take() {
        let _ = s.shutdown.send(true);
        s.handle.await.context("consumer task panicked")??;
        info!("Previous stream session stopped");
    }
    Ok(())
}

/// Resolves when the running consumer task finishes; pending while no
/// session is active.
async fn session_finished(session: &mut Option<Session>) -> Result<()> {
    match session {
        Some(s) => {
            let joined = (&mut s.handle).await;
            *session = None;
            joined.context("consumer task panicked")?
        }
        None => std::future::pending().await,
    }
}

/// Consume one session's statuses until shutdown or stream closure.
async fn consume(
    mut statuses: mpsc::Receiver<Status>,
    mut shutdown: watch::Receiver<bool>,
    keywords: Vec<String>,
    thresholds: Thresholds,
    store: Arc<dyn TweetStore>,
    tracked: Arc<Mutex<DedupCache>>,
) -> Result<()> {
    info!("Streaming tweets");

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                debug!("Session shutdown requested");
                return Ok(());
            }
            status = statuses.recv() => match status {
                Some(status) => {
                    handle_status(&status, &keywords, &thresholds, store.as_ref(), &tracked)
                        .await?;
                }
                None => return Ok(()),
            },
        }
    }
}

/// Apply the admission, dedup and attribution rules to one stream item and
/// persist it if they all pass.
///
/// Only retweets are considered, and all checks run against the embedded
/// original status. A status matching none of the keywords is skipped;
/// store write failures are fatal and propagate.
async fn handle_status(
    status: &Status,
    keywords: &[String],
    thresholds: &Thresholds,
    store: &dyn TweetStore,
    tracked: &Mutex<DedupCache>,
) -> Result<()> {
    let Some(original) = status.retweeted_status.as_deref() else {
        return Ok(());
    };

    if !matcher::admitted(original, thresholds) {
        return Ok(());
    }

    if tracked
        .lock()
        .expect("tracked-id lock poisoned")
        .contains(&original.id_str)
    {
        return Ok(());
    }

    let Some(keyword) = matcher::attribute_keyword(keywords, original) else {
        debug!(id = %original.id_str, "No keyword matched, skipping");
        return Ok(());
    };

    let record = TweetRecord {
        tweet_id: original.id_str.clone(),
        likes: original.favorite_count,
        retweets: original.retweet_count,
        created_at: original.created_at.clone(),
    };

    store.record_tweet(&record).await.context("recording tweet")?;
    store
        .index_by_keyword(keyword, &record.tweet_id)
        .await
        .context("indexing tweet by keyword")?;

    tracked
        .lock()
        .expect("tracked-id lock poisoned")
        .insert(record.tweet_id.clone());

    info!(
        id = %record.tweet_id,
        keyword,
        likes = record.likes,
        retweets = record.retweets,
        "Tweet recorded"
    );
    Ok(())
}
