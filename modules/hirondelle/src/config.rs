use clap::Parser;
use twitter_client::Credentials;

/// Watches the keyword list in the database and records high-engagement
/// retweets that match those keywords.
#[derive(Debug, Parser)]
#[command(name = "hirondelle", about = "Keyword-driven tweet listener")]
pub struct Config {
    /// Minimum likes for a tweet
    #[arg(short = 'l', long)]
    pub likes: i64,

    /// Minimum retweets for a tweet
    #[arg(short = 'r', long)]
    pub retweets: i64,

    /// Firebase auth token
    #[arg(short = 't', long)]
    pub token: String,

    /// Firebase database URL
    #[arg(long, default_value = "https://hirondelle-e44d5.firebaseio.com/")]
    pub firebase_url: String,

    /// Consumer key for the Twitter API
    #[arg(long)]
    pub consumer_key: String,

    /// Consumer secret for the Twitter API
    #[arg(long)]
    pub consumer_secret: String,

    /// Access token for the Twitter API
    #[arg(long)]
    pub access_token: String,

    /// Secret access token for the Twitter API
    #[arg(long)]
    pub access_token_secret: String,
}

impl Config {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            consumer_key: self.consumer_key.clone(),
            consumer_secret: self.consumer_secret.clone(),
            access_token: self.access_token.clone(),
            access_token_secret: self.access_token_secret.clone(),
        }
    }

    /// Log the non-secret parts of the configuration.
    pub fn log_redacted(&self) {
        tracing::info!(
            likes = self.likes,
            retweets = self.retweets,
            firebase_url = %self.firebase_url,
            "Configuration loaded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_ARGS: &[&str] = &[
        "hirondelle",
        "--likes",
        "10",
        "--retweets",
        "5",
        "--token",
        "fb-secret",
        "--consumer-key",
        "ck",
        "--consumer-secret",
        "cs",
        "--access-token",
        "at",
        "--access-token-secret",
        "ats",
    ];

    #[test]
    fn parses_all_required_options() {
        let config = Config::try_parse_from(FULL_ARGS).unwrap();
        assert_eq!(config.likes, 10);
        assert_eq!(config.retweets, 5);
        assert_eq!(config.token, "fb-secret");
        assert_eq!(config.firebase_url, "https://hirondelle-e44d5.firebaseio.com/");

        let creds = config.credentials();
        assert_eq!(creds.consumer_key, "ck");
        assert_eq!(creds.access_token_secret, "ats");
    }

    #[test]
    fn short_flags_work() {
        let config = Config::try_parse_from([
            "hirondelle",
            "-l",
            "3",
            "-r",
            "2",
            "-t",
            "tok",
            "--consumer-key",
            "ck",
            "--consumer-secret",
            "cs",
            "--access-token",
            "at",
            "--access-token-secret",
            "ats",
        ])
        .unwrap();
        assert_eq!(config.likes, 3);
        assert_eq!(config.retweets, 2);
    }

    #[test]
    fn missing_required_option_is_an_error() {
        // Drop --access-token-secret and its value.
        let args = &FULL_ARGS[..FULL_ARGS.len() - 2];
        assert!(Config::try_parse_from(args).is_err());
    }
}
