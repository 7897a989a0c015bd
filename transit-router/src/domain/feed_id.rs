//! Feed and stop identifier types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an invalid feed identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid feed id: {reason}")]
pub struct InvalidFeedId {
    reason: &'static str,
}

/// Identifier of a loaded timetable feed.
///
/// Several feeds can be loaded at once and may reuse the same stop and trip
/// ids, so every stop and trip is qualified by its feed. Feed ids are
/// non-empty and consist of ASCII letters, digits, `_` and `-`.
///
/// # Examples
///
/// ```
/// use transit_router::domain::FeedId;
///
/// let id = FeedId::parse("gtfs_0").unwrap();
/// assert_eq!(id.as_str(), "gtfs_0");
///
/// assert!(FeedId::parse("").is_err());
/// assert!(FeedId::parse("has space").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedId(String);

impl FeedId {
    /// Parse a feed id from a string.
    pub fn parse(s: &str) -> Result<Self, InvalidFeedId> {
        if s.is_empty() {
            return Err(InvalidFeedId {
                reason: "must not be empty",
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
        {
            return Err(InvalidFeedId {
                reason: "must be ASCII letters, digits, '_' or '-'",
            });
        }
        Ok(FeedId(s.to_string()))
    }

    /// The id used for the `index`-th feed file when none is given.
    pub fn numbered(index: usize) -> Self {
        FeedId(format!("gtfs_{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeedId({})", self.0)
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stop qualified by the feed it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StopKey {
    pub feed: FeedId,
    pub stop_id: String,
}

impl StopKey {
    pub fn new(feed: FeedId, stop_id: impl Into<String>) -> Self {
        Self {
            feed,
            stop_id: stop_id.into(),
        }
    }
}

impl fmt::Display for StopKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.feed, self.stop_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_ids() {
        assert!(FeedId::parse("a").is_ok());
        assert!(FeedId::parse("gtfs_0").is_ok());
        assert!(FeedId::parse("VBB-2024").is_ok());
    }

    #[test]
    fn reject_invalid_ids() {
        assert!(FeedId::parse("").is_err());
        assert!(FeedId::parse("a b").is_err());
        assert!(FeedId::parse("a/b").is_err());
        assert!(FeedId::parse("ä").is_err());
    }

    #[test]
    fn numbered_matches_parse() {
        assert_eq!(FeedId::numbered(3), FeedId::parse("gtfs_3").unwrap());
    }

    #[test]
    fn stop_key_display() {
        let key = StopKey::new(FeedId::parse("f").unwrap(), "S1");
        assert_eq!(key.to_string(), "f:S1");
    }

    #[test]
    fn stop_keys_order_by_feed_then_stop() {
        let a = StopKey::new(FeedId::parse("a").unwrap(), "Z");
        let b = StopKey::new(FeedId::parse("b").unwrap(), "A");
        assert!(a < b);
    }
}
