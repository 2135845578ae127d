//! Per-request execution state
//!
//! One [`ExecutionState`] exists per query. Nodes never mutate it; they
//! return a [`StatePatch`] and the engine replaces the state with
//! `state.merge(patch)`:
//! - map fields merge by key union, last write wins per key
//! - sequence fields append
//! - scalar fields override when the patch carries a value

use crate::domain::{ResponderId, Topic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Kind of a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryKind {
    /// Classifier output decoded into a topic
    TopicClassified,
    /// Router picked the entry responder
    Routed,
    /// A responder ran and produced an answer
    ResponderExecuted,
    /// Judge was consulted (or skipped) and the run continues to synthesis
    Evaluated,
    /// Judge asked for another responder and the request was accepted
    RerouteAccepted,
    /// A consultation cap forced completion without asking the judge
    HardStop,
    /// The global visit cap redirected the run to the synthesizer
    CapReached,
    /// Final answer produced
    Synthesized,
}

/// One audit-log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// What happened
    pub kind: HistoryKind,
    /// Responder involved, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responder_id: Option<ResponderId>,
    /// Free-form note
    pub note: String,
    /// When the entry was recorded
    pub at: DateTime<Utc>,
}

impl HistoryEntry {
    /// Create an entry not tied to a responder
    #[must_use]
    pub fn new(kind: HistoryKind, note: impl Into<String>) -> Self {
        Self {
            kind,
            responder_id: None,
            note: note.into(),
            at: Utc::now(),
        }
    }

    /// Create an entry tagged with a responder
    #[must_use]
    pub fn for_responder(kind: HistoryKind, responder: ResponderId, note: impl Into<String>) -> Self {
        Self {
            kind,
            responder_id: Some(responder),
            note: note.into(),
            at: Utc::now(),
        }
    }
}

/// Partial update returned by a node
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    /// New topic
    pub topic: Option<Topic>,
    /// New current responder
    pub current_responder: Option<ResponderId>,
    /// Answers to union into `responses`
    pub responses: HashMap<ResponderId, String>,
    /// New rerouting flag
    pub needs_rerouting: Option<bool>,
    /// Entries to append to `history`
    pub history: Vec<HistoryEntry>,
    /// Final answer
    pub final_response: Option<String>,
}

impl StatePatch {
    /// An empty patch
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the topic
    #[must_use]
    pub fn with_topic(mut self, topic: Topic) -> Self {
        self.topic = Some(topic);
        self
    }

    /// Set the current responder
    #[must_use]
    pub fn with_current_responder(mut self, responder: ResponderId) -> Self {
        self.current_responder = Some(responder);
        self
    }

    /// Record a responder answer
    #[must_use]
    pub fn with_response(mut self, responder: ResponderId, answer: impl Into<String>) -> Self {
        self.responses.insert(responder, answer.into());
        self
    }

    /// Set the rerouting flag
    #[must_use]
    pub fn with_needs_rerouting(mut self, needs_rerouting: bool) -> Self {
        self.needs_rerouting = Some(needs_rerouting);
        self
    }

    /// Append a history entry
    #[must_use]
    pub fn with_history(mut self, entry: HistoryEntry) -> Self {
        self.history.push(entry);
        self
    }

    /// Set the final answer
    #[must_use]
    pub fn with_final_response(mut self, response: impl Into<String>) -> Self {
        self.final_response = Some(response.into());
        self
    }
}

/// Mutable-by-replacement context of one query run
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionState {
    request_id: Uuid,
    query: String,
    topic: Option<Topic>,
    current_responder: Option<ResponderId>,
    responses: HashMap<ResponderId, String>,
    needs_rerouting: bool,
    history: Vec<HistoryEntry>,
    final_response: Option<String>,
}

impl ExecutionState {
    /// Fresh state for a query with a new request id
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self::with_request_id(query, Uuid::new_v4())
    }

    /// Fresh state with an explicit request id
    #[must_use]
    pub fn with_request_id(query: impl Into<String>, request_id: Uuid) -> Self {
        Self {
            request_id,
            query: query.into(),
            topic: None,
            current_responder: None,
            responses: HashMap::new(),
            needs_rerouting: false,
            history: Vec::new(),
            final_response: None,
        }
    }

    /// Apply a patch, producing the replacement state
    #[must_use]
    pub fn merge(mut self, patch: StatePatch) -> Self {
        if let Some(topic) = patch.topic {
            self.topic = Some(topic);
        }
        if let Some(responder) = patch.current_responder {
            self.current_responder = Some(responder);
        }
        self.responses.extend(patch.responses);
        if let Some(flag) = patch.needs_rerouting {
            self.needs_rerouting = flag;
        }
        self.history.extend(patch.history);
        if let Some(response) = patch.final_response {
            self.final_response = Some(response);
        }
        self
    }

    /// Request id
    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The query text
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Classified topic
    #[must_use]
    pub fn topic(&self) -> Option<Topic> {
        self.topic
    }

    /// Responder currently selected
    #[must_use]
    pub fn current_responder(&self) -> Option<ResponderId> {
        self.current_responder
    }

    /// Answers recorded so far
    #[must_use]
    pub fn responses(&self) -> &HashMap<ResponderId, String> {
        &self.responses
    }

    /// Answer of one responder
    #[must_use]
    pub fn response(&self, responder: ResponderId) -> Option<&str> {
        self.responses.get(&responder).map(String::as_str)
    }

    /// Whether the last evaluation asked for another responder
    #[must_use]
    pub fn needs_rerouting(&self) -> bool {
        self.needs_rerouting
    }

    /// Audit log
    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Final answer, once synthesized
    #[must_use]
    pub fn final_response(&self) -> Option<&str> {
        self.final_response.as_deref()
    }

    /// Number of times `responder` has run, counted from history
    #[must_use]
    pub fn consultation_count(&self, responder: ResponderId) -> usize {
        self.history
            .iter()
            .filter(|e| e.kind == HistoryKind::ResponderExecuted && e.responder_id == Some(responder))
            .count()
    }

    /// Total responder executions, counted from history
    #[must_use]
    pub fn total_consultations(&self) -> usize {
        self.history
            .iter()
            .filter(|e| e.kind == HistoryKind::ResponderExecuted && e.responder_id.is_some())
            .count()
    }

    /// Distinct responders that ran, in order of first execution
    #[must_use]
    pub fn consulted_in_order(&self) -> Vec<ResponderId> {
        let mut seen = Vec::new();
        for entry in &self.history {
            if entry.kind != HistoryKind::ResponderExecuted {
                continue;
            }
            if let Some(id) = entry.responder_id {
                if !seen.contains(&id) {
                    seen.push(id);
                }
            }
        }
        seen
    }

    /// Recorded answers ordered by first consultation
    #[must_use]
    pub fn ordered_answers(&self) -> Vec<(ResponderId, String)> {
        let mut order = self.consulted_in_order();
        // answers injected without a history entry go last, in id order
        let mut extra: Vec<ResponderId> = self
            .responses
            .keys()
            .filter(|id| !order.contains(id))
            .copied()
            .collect();
        extra.sort();
        order.extend(extra);

        order
            .into_iter()
            .filter_map(|id| self.responses.get(&id).map(|answer| (id, answer.clone())))
            .collect()
    }

    /// Whether the global visit cap fired during this run
    #[must_use]
    pub fn cap_reached(&self) -> bool {
        self.history.iter().any(|e| e.kind == HistoryKind::CapReached)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executed(id: ResponderId) -> HistoryEntry {
        HistoryEntry::for_responder(HistoryKind::ResponderExecuted, id, "answered")
    }

    #[test]
    fn test_scalars_override_only_when_set() {
        let state = ExecutionState::new("q")
            .merge(StatePatch::new().with_topic(Topic::Sports).with_needs_rerouting(true));
        assert_eq!(state.topic(), Some(Topic::Sports));
        assert!(state.needs_rerouting());

        let state = state.merge(StatePatch::new().with_current_responder(ResponderId::Sports));
        assert_eq!(state.topic(), Some(Topic::Sports));
        assert!(state.needs_rerouting());
        assert_eq!(state.current_responder(), Some(ResponderId::Sports));

        let state = state.merge(StatePatch::new().with_needs_rerouting(false));
        assert!(!state.needs_rerouting());
    }

    #[test]
    fn test_responses_union_last_write_wins() {
        let state = ExecutionState::new("q")
            .merge(StatePatch::new().with_response(ResponderId::Weather, "rain"))
            .merge(StatePatch::new().with_response(ResponderId::Sports, "3-1"))
            .merge(StatePatch::new().with_response(ResponderId::Weather, "sun"));

        assert_eq!(state.responses().len(), 2);
        assert_eq!(state.response(ResponderId::Weather), Some("sun"));
        assert_eq!(state.response(ResponderId::Sports), Some("3-1"));
    }

    #[test]
    fn test_history_appends() {
        let state = ExecutionState::new("q")
            .merge(StatePatch::new().with_history(executed(ResponderId::News)))
            .merge(StatePatch::new())
            .merge(
                StatePatch::new()
                    .with_history(executed(ResponderId::Stocks))
                    .with_history(executed(ResponderId::News)),
            );

        assert_eq!(state.history().len(), 3);
        assert_eq!(state.consultation_count(ResponderId::News), 2);
        assert_eq!(state.consultation_count(ResponderId::Stocks), 1);
        assert_eq!(state.consultation_count(ResponderId::Health), 0);
        assert_eq!(state.total_consultations(), 3);
    }

    #[test]
    fn test_counts_ignore_other_kinds() {
        let state = ExecutionState::new("q").merge(
            StatePatch::new()
                .with_history(HistoryEntry::for_responder(
                    HistoryKind::Routed,
                    ResponderId::Weather,
                    "entry",
                ))
                .with_history(HistoryEntry::for_responder(
                    HistoryKind::RerouteAccepted,
                    ResponderId::Weather,
                    "again",
                )),
        );
        assert_eq!(state.total_consultations(), 0);
    }

    #[test]
    fn test_ordered_answers_follow_first_consultation() {
        let state = ExecutionState::new("q")
            .merge(
                StatePatch::new()
                    .with_response(ResponderId::Weather, "w1")
                    .with_history(executed(ResponderId::Weather)),
            )
            .merge(
                StatePatch::new()
                    .with_response(ResponderId::Sports, "s1")
                    .with_history(executed(ResponderId::Sports)),
            )
            .merge(
                StatePatch::new()
                    .with_response(ResponderId::Weather, "w2")
                    .with_history(executed(ResponderId::Weather)),
            );

        assert_eq!(
            state.consulted_in_order(),
            vec![ResponderId::Weather, ResponderId::Sports]
        );
        assert_eq!(
            state.ordered_answers(),
            vec![
                (ResponderId::Weather, "w2".to_string()),
                (ResponderId::Sports, "s1".to_string()),
            ]
        );
    }

    #[test]
    fn test_history_kind_wire_name() {
        assert_eq!(
            serde_json::to_string(&HistoryKind::ResponderExecuted).unwrap(),
            "\"responder-executed\""
        );
    }

    #[test]
    fn test_history_entry_wire_shape() {
        let entry = HistoryEntry::for_responder(HistoryKind::Routed, ResponderId::Stocks, "topic stocks");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["responderId"], "stocks");
        assert!(json.get("responder_id").is_none());

        let json = serde_json::to_value(HistoryEntry::new(HistoryKind::Synthesized, "1")).unwrap();
        assert!(json.get("responderId").is_none());
    }
}
