use super::*;
use crate::domain::ResponderId;
use crate::error::Error;
use crate::event_bus::{EventBus, WorkflowEvent};
use crate::state::{ExecutionState, HistoryEntry, HistoryKind, StatePatch};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Appends a note and counts its runs
struct Mark {
    label: &'static str,
    runs: AtomicUsize,
}

impl Mark {
    fn new(label: &'static str) -> Arc<Self> {
        Arc::new(Self {
            label,
            runs: AtomicUsize::new(0),
        })
    }

    fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Node for Mark {
    async fn run(&self, _state: &ExecutionState) -> crate::Result<StatePatch> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(StatePatch::new().with_history(HistoryEntry::new(HistoryKind::Evaluated, self.label)))
    }
}

/// Records an answer from one responder
struct Answer(ResponderId, &'static str);

#[async_trait]
impl Node for Answer {
    async fn run(&self, _state: &ExecutionState) -> crate::Result<StatePatch> {
        Ok(StatePatch::new()
            .with_current_responder(self.0)
            .with_response(self.0, self.1)
            .with_history(HistoryEntry::for_responder(
                HistoryKind::ResponderExecuted,
                self.0,
                "answered",
            )))
    }
}

struct Finish;

#[async_trait]
impl Node for Finish {
    async fn run(&self, state: &ExecutionState) -> crate::Result<StatePatch> {
        let text = state
            .ordered_answers()
            .into_iter()
            .map(|(_, answer)| answer)
            .collect::<Vec<_>>()
            .join(" | ");
        Ok(StatePatch::new().with_final_response(text))
    }
}

struct Fail;

#[async_trait]
impl Node for Fail {
    async fn run(&self, _state: &ExecutionState) -> crate::Result<StatePatch> {
        Err(Error::Synthesis("backend unavailable".to_string()))
    }
}

struct Slow;

#[async_trait]
impl Node for Slow {
    async fn run(&self, _state: &ExecutionState) -> crate::Result<StatePatch> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(StatePatch::new())
    }
}

fn always(branch: Branch) -> BranchFn {
    Arc::new(move |_: &ExecutionState| branch)
}

fn engine(max_visits: usize) -> GraphEngine {
    GraphEngine::new(max_visits, Duration::from_secs(5))
}

fn linear(middle: Arc<dyn Node>) -> GraphDefinition {
    GraphBuilder::new()
        .add_node("start", Arc::new(Answer(ResponderId::Weather, "rain")))
        .add_node("middle", middle)
        .add_node("finish", Arc::new(Finish))
        .add_edge("start", "middle")
        .add_edge("middle", "finish")
        .add_edge("finish", END)
        .set_entry("start")
        .set_finalizer("finish")
        .build()
        .unwrap()
}

// --- builder validation ---

#[test]
fn test_build_valid_graph() {
    let graph = linear(Mark::new("m"));
    assert_eq!(graph.entry(), "start");
    assert_eq!(graph.finalizer(), "finish");
    assert_eq!(graph.node_ids(), vec!["finish", "middle", "start"]);
}

#[test]
fn test_build_rejects_missing_entry_and_finalizer() {
    let err = GraphBuilder::new()
        .add_node("a", Mark::new("a"))
        .add_edge("a", END)
        .build()
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("no entry node"));
    assert!(text.contains("no finalizer node"));
}

#[test]
fn test_build_rejects_dangling_target() {
    let err = GraphBuilder::new()
        .add_node("a", Mark::new("a"))
        .add_edge("a", "ghost")
        .set_entry("a")
        .set_finalizer("a")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Graph(ref m) if m.contains("ghost")));
}

#[test]
fn test_build_rejects_incomplete_branch_table() {
    let err = GraphBuilder::new()
        .add_node("a", Mark::new("a"))
        .add_node("b", Mark::new("b"))
        .add_edge("a", "b")
        .add_conditional_edges("b", always(Branch::Reroute), [(Branch::Reroute, "a")])
        .set_entry("a")
        .set_finalizer("b")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("Complete"));
}

#[test]
fn test_build_rejects_two_outgoing_definitions() {
    let err = GraphBuilder::new()
        .add_node("a", Mark::new("a"))
        .add_edge("a", END)
        .add_edge("a", END)
        .set_entry("a")
        .set_finalizer("a")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("more than one"));
}

#[test]
fn test_build_rejects_node_without_edge() {
    let err = GraphBuilder::new()
        .add_node("a", Mark::new("a"))
        .add_node("b", Mark::new("b"))
        .add_edge("a", END)
        .set_entry("a")
        .set_finalizer("a")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("'b' has no outgoing edge"));
}

#[test]
fn test_build_rejects_unreachable_node() {
    let err = GraphBuilder::new()
        .add_node("a", Mark::new("a"))
        .add_node("island", Mark::new("i"))
        .add_edge("a", END)
        .add_edge("island", END)
        .set_entry("a")
        .set_finalizer("a")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("'island' is unreachable"));
}

#[test]
fn test_build_rejects_cycle_without_exit() {
    let err = GraphBuilder::new()
        .add_node("a", Mark::new("a"))
        .add_node("b", Mark::new("b"))
        .add_edge("a", "b")
        .add_edge("b", "a")
        .set_entry("a")
        .set_finalizer("b")
        .build()
        .unwrap_err();
    assert!(err.to_string().contains(END));
}

#[test]
fn test_build_rejects_reserved_id() {
    let err = GraphBuilder::new()
        .add_node(END, Mark::new("x"))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("reserved"));
}

#[test]
fn test_resolve_next_follows_branch() {
    let graph = GraphBuilder::new()
        .add_node("a", Mark::new("a"))
        .add_node("b", Mark::new("b"))
        .add_conditional_edges(
            "a",
            Arc::new(|s: &ExecutionState| {
                if s.needs_rerouting() {
                    Branch::Reroute
                } else {
                    Branch::Complete
                }
            }),
            [(Branch::Reroute, "a"), (Branch::Complete, "b")],
        )
        .add_edge("b", END)
        .set_entry("a")
        .set_finalizer("b")
        .build()
        .unwrap();

    let idle = ExecutionState::new("q");
    let looping = idle.clone().merge(StatePatch::new().with_needs_rerouting(true));
    assert_eq!(graph.resolve_next("a", &idle).unwrap(), Target::node("b"));
    assert_eq!(graph.resolve_next("a", &looping).unwrap(), Target::node("a"));
    assert_eq!(graph.resolve_next("b", &idle).unwrap(), Target::End);
    assert!(graph.resolve_next("zzz", &idle).is_err());
}

// --- execution ---

#[tokio::test]
async fn test_execute_linear() {
    let middle = Mark::new("middle ran");
    let graph = linear(middle.clone());

    let state = engine(16)
        .execute(&graph, ExecutionState::new("q"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(middle.runs(), 1);
    assert_eq!(state.final_response(), Some("rain"));
    assert!(!state.cap_reached());
}

#[tokio::test]
async fn test_cap_jumps_to_finalizer() {
    let looper = Mark::new("loop");
    let graph = GraphBuilder::new()
        .add_node("start", Arc::new(Answer(ResponderId::Sports, "2-0")))
        .add_node("loop", looper.clone())
        .add_node("finish", Arc::new(Finish))
        .add_edge("start", "loop")
        .add_conditional_edges(
            "loop",
            always(Branch::Reroute),
            [(Branch::Reroute, "loop"), (Branch::Complete, "finish")],
        )
        .add_edge("finish", END)
        .set_entry("start")
        .set_finalizer("finish")
        .build()
        .unwrap();

    let bus = EventBus::new(64);
    let mut rx = bus.subscribe();
    let state = engine(6)
        .with_event_bus(bus)
        .execute(&graph, ExecutionState::new("q"), &CancellationToken::new())
        .await
        .unwrap();

    // start + 5 loops, then the finalizer
    assert_eq!(looper.runs(), 5);
    assert!(state.cap_reached());
    assert_eq!(state.final_response(), Some("2-0"));

    let mut saw_cap = false;
    while let Ok(event) = rx.try_recv() {
        if let WorkflowEvent::CapReached { visits, .. } = event {
            assert_eq!(visits, 6);
            saw_cap = true;
        }
    }
    assert!(saw_cap);
}

#[tokio::test]
async fn test_node_error_is_tagged() {
    let graph = linear(Arc::new(Fail));
    let initial = ExecutionState::new("q");
    let request_id = initial.request_id();

    let err = engine(16)
        .execute(&graph, initial, &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        Error::NodeFailed {
            node,
            request_id: id,
            source,
        } => {
            assert_eq!(node, "middle");
            assert_eq!(id, request_id);
            assert!(matches!(*source, Error::Synthesis(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_node_timeout() {
    let graph = linear(Arc::new(Slow));
    let err = GraphEngine::new(16, Duration::from_secs(2))
        .execute(&graph, ExecutionState::new("q"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.node(), Some("middle"));
    assert!(matches!(err.root(), Error::Timeout(2000)));
}

#[tokio::test]
async fn test_cancel_before_start() {
    let start = Mark::new("start");
    let graph = GraphBuilder::new()
        .add_node("start", start.clone())
        .add_edge("start", END)
        .set_entry("start")
        .set_finalizer("start")
        .build()
        .unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = engine(16)
        .execute(&graph, ExecutionState::new("q"), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(start.runs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_node() {
    let graph = linear(Arc::new(Slow));
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let err = GraphEngine::new(16, Duration::from_secs(60))
        .execute(&graph, ExecutionState::new("q"), &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}
