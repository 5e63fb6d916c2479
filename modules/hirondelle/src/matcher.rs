//! Admission and keyword attribution for incoming statuses.

use twitter_client::Status;

/// Minimum engagement a retweeted status needs to be recorded.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub min_likes: i64,
    pub min_retweets: i64,
}

/// Both thresholds must be met; comparisons are inclusive.
pub fn admitted(original: &Status, thresholds: &Thresholds) -> bool {
    original.retweet_count >= thresholds.min_retweets
        && original.favorite_count >= thresholds.min_likes
}

/// Decide which configured keyword a status matched.
///
/// Hashtags are checked first, then user mentions; within each kind the
/// keyword list order breaks ties. Keywords are stored lowercase, so the
/// status side is lowercased for comparison.
pub fn attribute_keyword<'a>(keywords: &'a [String], original: &Status) -> Option<&'a str> {
    for keyword in keywords {
        if original
            .entities
            .hashtags
            .iter()
            .any(|h| h.text.to_lowercase() == *keyword)
        {
            return Some(keyword);
        }
    }

    for keyword in keywords {
        if original
            .entities
            .user_mentions
            .iter()
            .any(|m| m.screen_name.to_lowercase() == *keyword)
        {
            return Some(keyword);
        }
    }

    None
}
