//! Final answer synthesis

use crate::collaborators::{SynthesisBackend, SynthesisRequest};
use crate::error::{Error, Result};
use crate::state::{ExecutionState, HistoryEntry, HistoryKind, StatePatch};
use std::sync::Arc;
use tracing::debug;

/// Produces `final_response` from the recorded answers
#[derive(Clone)]
pub struct Synthesizer {
    backend: Arc<dyn SynthesisBackend>,
}

impl Synthesizer {
    /// Synthesizer delegating multi-answer merges to `backend`
    #[must_use]
    pub fn new(backend: Arc<dyn SynthesisBackend>) -> Self {
        Self { backend }
    }

    /// Build the final answer.
    ///
    /// A single answer is passed through verbatim without calling the
    /// backend. Several answers go to the backend in first-consultation
    /// order.
    ///
    /// # Errors
    /// [`Error::Synthesis`] when there is nothing to synthesize, when the
    /// backend fails, or when it returns an empty answer
    pub async fn synthesize(&self, state: &ExecutionState) -> Result<StatePatch> {
        let mut answers = state.ordered_answers();

        let response = match answers.len() {
            0 => return Err(Error::Synthesis("no responder answers recorded".to_string())),
            1 => {
                let (id, answer) = answers.remove(0);
                debug!(request_id = %state.request_id(), responder = %id, "Single answer, passing through");
                answer
            }
            n => {
                debug!(request_id = %state.request_id(), answers = n, "Merging answers");
                let merged = self
                    .backend
                    .synthesize(SynthesisRequest {
                        query: state.query().to_string(),
                        answers,
                    })
                    .await?;
                if merged.trim().is_empty() {
                    return Err(Error::Synthesis("empty synthesis output".to_string()));
                }
                merged
            }
        };

        let sources = state.responses().len();
        Ok(StatePatch::new()
            .with_final_response(response)
            .with_history(HistoryEntry::new(
                HistoryKind::Synthesized,
                format!("{sources} answer(s)"),
            )))
    }
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::MockSynthesisBackend;
    use crate::domain::ResponderId;

    fn with_answer(state: ExecutionState, id: ResponderId, answer: &str) -> ExecutionState {
        state.merge(
            StatePatch::new()
                .with_response(id, answer)
                .with_history(HistoryEntry::for_responder(
                    HistoryKind::ResponderExecuted,
                    id,
                    "answered",
                )),
        )
    }

    #[tokio::test]
    async fn test_single_answer_passthrough() {
        let mut backend = MockSynthesisBackend::new();
        backend.expect_synthesize().times(0);

        let raw = "  Seattle: 12°C, light rain.\n";
        let state = with_answer(ExecutionState::new("weather?"), ResponderId::Weather, raw);
        let patch = Synthesizer::new(Arc::new(backend))
            .synthesize(&state)
            .await
            .unwrap();

        assert_eq!(patch.final_response.as_deref(), Some(raw));
    }

    #[tokio::test]
    async fn test_multiple_answers_in_consultation_order() {
        let mut backend = MockSynthesisBackend::new();
        backend
            .expect_synthesize()
            .withf(|req| {
                req.query == "q"
                    && req.answers
                        == vec![
                            (ResponderId::Stocks, "up".to_string()),
                            (ResponderId::News, "merger".to_string()),
                        ]
            })
            .times(1)
            .returning(|_| Ok("merged".to_string()));

        let state = with_answer(ExecutionState::new("q"), ResponderId::Stocks, "up");
        let state = with_answer(state, ResponderId::News, "merger");
        let patch = Synthesizer::new(Arc::new(backend))
            .synthesize(&state)
            .await
            .unwrap();

        assert_eq!(patch.final_response.as_deref(), Some("merged"));
        assert_eq!(patch.history[0].kind, HistoryKind::Synthesized);
    }

    #[tokio::test]
    async fn test_no_answers_is_error() {
        let backend = MockSynthesisBackend::new();
        let err = Synthesizer::new(Arc::new(backend))
            .synthesize(&ExecutionState::new("q"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Synthesis(_)));
    }

    #[tokio::test]
    async fn test_blank_backend_output_is_error() {
        let mut backend = MockSynthesisBackend::new();
        backend
            .expect_synthesize()
            .returning(|_| Ok("   ".to_string()));

        let state = with_answer(ExecutionState::new("q"), ResponderId::Stocks, "up");
        let state = with_answer(state, ResponderId::Health, "sleep");
        let err = Synthesizer::new(Arc::new(backend))
            .synthesize(&state)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Synthesis(_)));
    }
}
