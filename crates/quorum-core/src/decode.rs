//! Defensive decoding of collaborator text
//!
//! Classifier and judge replies are untrusted. Every place where such text
//! turns into a routing decision goes through this module, and every
//! function here has an explicit fallback for input it does not recognize.

use crate::domain::{ResponderId, Topic};

/// Words the judge may use to say the answer is complete
const COMPLETE_WORDS: &[&str] = &["complete", "completed", "done", "sufficient"];

/// Outcome of decoding a judge reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgement {
    /// The judge considers the current answer sufficient
    Complete,
    /// The judge suggests consulting this responder next
    Reroute(ResponderId),
    /// Nothing recognizable; callers treat this as complete
    Unrecognized,
}

/// Trim, strip wrapping quotes and backticks and trailing punctuation, and
/// ASCII case-fold.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '.' | '!' | '?' | ',' | ';' | ':')
    })
    .to_ascii_lowercase()
}

/// Topic named in classifier output. The earliest occurrence of any topic
/// word wins; `None` when no topic word appears.
#[must_use]
pub fn parse_topic(raw: &str) -> Option<Topic> {
    let text = normalize(raw);
    Topic::ALL
        .iter()
        .filter_map(|topic| text.find(topic.as_str()).map(|pos| (pos, *topic)))
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, topic)| topic)
}

/// Responder id named by `raw`, accepting the `weatheragent`,
/// `weather_agent` and `weather agent` spellings.
#[must_use]
pub fn parse_responder_id(raw: &str) -> Option<ResponderId> {
    let text = normalize(raw);
    let stem = ["agent", "responder"]
        .iter()
        .find_map(|suffix| text.strip_suffix(*suffix))
        .map(|s| s.trim_end_matches(|c: char| c == '_' || c == '-' || c.is_whitespace()))
        .unwrap_or(text.as_str());

    ResponderId::ALL.into_iter().find(|id| id.as_str() == stem)
}

/// Decode a judge reply. Only an exact completion word or an exact
/// responder id (or alias) is acted upon.
#[must_use]
pub fn parse_judgement(raw: &str) -> Judgement {
    let text = normalize(raw);
    if COMPLETE_WORDS.contains(&text.as_str()) {
        return Judgement::Complete;
    }
    match parse_responder_id(&text) {
        Some(id) => Judgement::Reroute(id),
        None => Judgement::Unrecognized,
    }
}
