//! Topic to responder routing

use crate::domain::{ResponderId, Topic};
use std::collections::HashMap;

/// Static topic → responder table with a fallback responder
#[derive(Debug, Clone)]
pub struct Router {
    table: HashMap<Topic, ResponderId>,
    default: ResponderId,
}

impl Router {
    /// One responder per topic; unmatched topics go to `default`
    #[must_use]
    pub fn new(default: ResponderId) -> Self {
        let table = Topic::ALL
            .into_iter()
            .map(|topic| (topic, Self::responder_for(topic)))
            .collect();
        Self { table, default }
    }

    fn responder_for(topic: Topic) -> ResponderId {
        match topic {
            Topic::Weather => ResponderId::Weather,
            Topic::Sports => ResponderId::Sports,
            Topic::News => ResponderId::News,
            Topic::Stocks => ResponderId::Stocks,
            Topic::Health => ResponderId::Health,
        }
    }

    /// Entry responder for a classified topic
    #[must_use]
    pub fn route(&self, topic: Option<Topic>) -> ResponderId {
        topic
            .and_then(|t| self.table.get(&t).copied())
            .unwrap_or(self.default)
    }

    /// Fallback responder
    #[must_use]
    pub fn default_responder(&self) -> ResponderId {
        self.default
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(ResponderId::News)
    }
}
