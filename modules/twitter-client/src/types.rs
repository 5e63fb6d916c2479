use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Twitter's legacy timestamp format, e.g. `Wed Aug 27 13:08:45 +0000 2008`.
const CREATED_AT_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// A status from the streaming API (v1.1 wire shape).
///
/// Only the fields the listener consumes are modeled; everything else in
/// the payload is dropped at deserialization. A retweet carries the
/// original status nested under `retweeted_status`.
#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub id_str: String,
    pub created_at: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub retweet_count: i64,
    #[serde(default)]
    pub favorite_count: i64,
    #[serde(default)]
    pub entities: Entities,
    #[serde(default)]
    pub retweeted_status: Option<Box<Status>>,
}

impl Status {
    /// Parse the legacy `created_at` string into a UTC timestamp.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_str(&self.created_at, CREATED_AT_FORMAT)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub hashtags: Vec<Hashtag>,
    #[serde(default)]
    pub user_mentions: Vec<UserMention>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hashtag {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserMention {
    pub screen_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const RETWEET_JSON: &str = r#"{
        "id_str": "900000000000000001",
        "created_at": "Sat Mar 10 12:00:00 +0000 2018",
        "text": "RT @gopher: Generics when? #golang",
        "lang": "en",
        "retweet_count": 0,
        "favorite_count": 0,
        "entities": {
            "hashtags": [{"text": "golang", "indices": [28, 35]}],
            "user_mentions": [{"screen_name": "gopher", "id_str": "42", "indices": [3, 10]}]
        },
        "retweeted_status": {
            "id_str": "900000000000000000",
            "created_at": "Sat Mar 10 11:55:00 +0000 2018",
            "text": "Generics when? #golang",
            "retweet_count": 7,
            "favorite_count": 19,
            "entities": {
                "hashtags": [{"text": "golang", "indices": [15, 22]}],
                "user_mentions": []
            }
        }
    }"#;

    #[test]
    fn deserializes_a_retweet() {
        let status: Status = serde_json::from_str(RETWEET_JSON).unwrap();
        assert_eq!(status.id_str, "900000000000000001");

        let original = status.retweeted_status.expect("nested original status");
        assert_eq!(original.id_str, "900000000000000000");
        assert_eq!(original.retweet_count, 7);
        assert_eq!(original.favorite_count, 19);
        assert_eq!(original.entities.hashtags[0].text, "golang");
        assert!(original.retweeted_status.is_none());
    }

    #[test]
    fn plain_status_has_no_retweeted_status() {
        let status: Status = serde_json::from_str(
            r#"{"id_str": "1", "created_at": "Sat Mar 10 12:00:00 +0000 2018"}"#,
        )
        .unwrap();
        assert!(status.retweeted_status.is_none());
        assert!(status.entities.hashtags.is_empty());
    }

    #[test]
    fn parses_legacy_created_at() {
        let status: Status = serde_json::from_str(
            r#"{"id_str": "1", "created_at": "Wed Aug 27 13:08:45 +0000 2008"}"#,
        )
        .unwrap();
        let ts = status.created_at_utc().unwrap();
        assert_eq!(ts.to_rfc3339(), "2008-08-27T13:08:45+00:00");
    }

    #[test]
    fn garbage_created_at_is_none() {
        let status: Status =
            serde_json::from_str(r#"{"id_str": "1", "created_at": "not a date"}"#).unwrap();
        assert!(status.created_at_utc().is_none());
    }
}
