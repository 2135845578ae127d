//! Topic vocabulary and responder ids
//!
//! Both sets are fixed. Text coming from outside is turned into these types
//! only through [`crate::decode`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified topic of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    /// Weather conditions and forecasts
    Weather,
    /// Teams, games, athletes, scores
    Sports,
    /// Current events
    News,
    /// Markets and stock prices
    Stocks,
    /// Health and wellness
    Health,
}

impl Topic {
    /// Every topic, in vocabulary order
    pub const ALL: [Topic; 5] = [
        Topic::Weather,
        Topic::Sports,
        Topic::News,
        Topic::Stocks,
        Topic::Health,
    ];

    /// Returns the topic word
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Sports => "sports",
            Self::News => "news",
            Self::Stocks => "stocks",
            Self::Health => "health",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Id of a domain responder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponderId {
    /// Weather specialist
    Weather,
    /// Sports specialist
    Sports,
    /// News specialist
    News,
    /// Stock market specialist
    Stocks,
    /// Health specialist
    Health,
}

impl ResponderId {
    /// Every responder id
    pub const ALL: [ResponderId; 5] = [
        ResponderId::Weather,
        ResponderId::Sports,
        ResponderId::News,
        ResponderId::Stocks,
        ResponderId::Health,
    ];

    /// Returns the wire id
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Sports => "sports",
            Self::News => "news",
            Self::Stocks => "stocks",
            Self::Health => "health",
        }
    }

    /// Topic this responder covers
    #[must_use]
    pub fn topic(&self) -> Topic {
        match self {
            Self::Weather => Topic::Weather,
            Self::Sports => Topic::Sports,
            Self::News => Topic::News,
            Self::Stocks => Topic::Stocks,
            Self::Health => Topic::Health,
        }
    }

    /// Human-readable label used in prompts
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Weather => "Weather",
            Self::Sports => "Sports",
            Self::News => "News",
            Self::Stocks => "Stocks",
            Self::Health => "Health",
        }
    }
}

impl fmt::Display for ResponderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        for id in ResponderId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.as_str()));
        }
        assert_eq!(Topic::Stocks.to_string(), "stocks");
    }

    #[test]
    fn test_deserialize_lowercase() {
        let id: ResponderId = serde_json::from_str("\"health\"").unwrap();
        assert_eq!(id, ResponderId::Health);
        assert!(serde_json::from_str::<ResponderId>("\"Health\"").is_err());
    }
}
