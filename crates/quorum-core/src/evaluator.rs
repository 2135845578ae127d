//! Completeness evaluation
//!
//! Runs after every responder execution and decides between another
//! consultation and synthesis. Two caps bound the loop no matter what the
//! judge says:
//! - total responder executions in the run
//! - executions of any single responder
//!
//! Judge output can only end a run early. A reroute is accepted only when
//! it names a different, known responder that is still under its own cap.

use crate::collaborators::{Judge, JudgeRequest};
use crate::decode::{parse_judgement, Judgement};
use crate::domain::ResponderId;
use crate::error::Result;
use crate::state::{ExecutionState, HistoryEntry, HistoryKind, StatePatch};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Applies the anti-recursion policy around a [`Judge`]
#[derive(Clone)]
pub struct CompletenessEvaluator {
    judge: Arc<dyn Judge>,
    max_total: usize,
    max_per_responder: usize,
}

impl CompletenessEvaluator {
    /// Evaluator with explicit caps
    #[must_use]
    pub fn new(judge: Arc<dyn Judge>, max_total: usize, max_per_responder: usize) -> Self {
        Self {
            judge,
            max_total,
            max_per_responder,
        }
    }

    /// Decide whether to consult another responder.
    ///
    /// The returned patch always sets `needs_rerouting`. On an accepted
    /// reroute it also sets the next `current_responder`.
    ///
    /// # Errors
    /// Propagates judge failures as [`crate::Error::Evaluation`]
    pub async fn evaluate(&self, state: &ExecutionState) -> Result<StatePatch> {
        let Some(current) = state.current_responder() else {
            warn!(request_id = %state.request_id(), "No current responder at evaluation");
            return Ok(complete("no current responder"));
        };

        let total = state.total_consultations();
        let this_count = state.consultation_count(current);

        if total >= self.max_total || this_count >= self.max_per_responder {
            info!(
                request_id = %state.request_id(),
                responder = %current,
                consultations = total,
                responder_consultations = this_count,
                "Consultation cap reached, skipping judge"
            );
            return Ok(StatePatch::new()
                .with_needs_rerouting(false)
                .with_history(HistoryEntry::for_responder(
                    HistoryKind::HardStop,
                    current,
                    format!("{total} consultations total, {this_count} for {current}"),
                )));
        }

        let request = JudgeRequest {
            query: state.query().to_string(),
            current_responder: current,
            current_answer: state.response(current).unwrap_or_default().to_string(),
            consulted: state.consulted_in_order(),
        };
        let verdict = self.judge.evaluate(request).await?;
        let judgement = parse_judgement(&verdict);
        debug!(request_id = %state.request_id(), ?judgement, "Judge replied");

        match judgement {
            Judgement::Complete => Ok(complete("judge: complete")),
            Judgement::Unrecognized => Ok(complete("judge reply not recognized")),
            Judgement::Reroute(next) if next == current => {
                Ok(complete(format!("judge re-suggested {current}")))
            }
            Judgement::Reroute(next) if state.consultation_count(next) >= self.max_per_responder => {
                Ok(complete(format!("{next} already at its consultation cap")))
            }
            Judgement::Reroute(next) => Ok(reroute(current, next)),
        }
    }
}

fn complete(note: impl Into<String>) -> StatePatch {
    StatePatch::new()
        .with_needs_rerouting(false)
        .with_history(HistoryEntry::new(HistoryKind::Evaluated, note))
}

fn reroute(from: ResponderId, to: ResponderId) -> StatePatch {
    StatePatch::new()
        .with_needs_rerouting(true)
        .with_current_responder(to)
        .with_history(HistoryEntry::for_responder(
            HistoryKind::RerouteAccepted,
            to,
            format!("after {from}"),
        ))
}

impl std::fmt::Debug for CompletenessEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletenessEvaluator")
            .field("max_total", &self.max_total)
            .field("max_per_responder", &self.max_per_responder)
            .finish_non_exhaustive()
    }
}
