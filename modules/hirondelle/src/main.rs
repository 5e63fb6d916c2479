use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use firebase_client::FirebaseClient;
use twitter_client::FilteredStream;

use hirondelle::config::Config;
use hirondelle::listener::Listener;
use hirondelle::matcher::Thresholds;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting listener");

    let config = Config::parse();
    config.log_redacted();

    let store = Arc::new(FirebaseClient::new(
        &config.firebase_url,
        config.token.clone(),
    ));
    let stream = FilteredStream::new(config.credentials());
    let thresholds = Thresholds {
        min_likes: config.likes,
        min_retweets: config.retweets,
    };

    Listener::new(store, stream, thresholds).run().await
}
