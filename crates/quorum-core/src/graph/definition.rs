//! Graph definition and construction-time validation
//!
//! A [`GraphDefinition`] can only be obtained from [`GraphBuilder::build`],
//! so every graph the engine sees has resolvable edges and a reachable end.

use crate::error::{Error, Result};
use crate::state::{ExecutionState, StatePatch};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// Terminal sentinel node id
pub const END: &str = "__end__";

/// One workflow step
#[async_trait]
pub trait Node: Send + Sync {
    /// Compute a partial update from the current state
    async fn run(&self, state: &ExecutionState) -> Result<StatePatch>;
}

/// Edge destination
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Another node
    Node(String),
    /// The terminal sentinel
    End,
}

impl Target {
    /// Target for a node id, mapping [`END`] to [`Target::End`]
    #[must_use]
    pub fn node(id: impl Into<String>) -> Self {
        let id = id.into();
        if id == END {
            Target::End
        } else {
            Target::Node(id)
        }
    }
}

impl From<&str> for Target {
    fn from(id: &str) -> Self {
        Target::node(id)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Node(id) => f.write_str(id),
            Target::End => f.write_str(END),
        }
    }
}

/// Keys a conditional edge can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    /// Consult another responder
    Reroute,
    /// Move on
    Complete,
}

impl Branch {
    /// Every branch key; conditional tables must cover all of them
    pub const ALL: [Branch; 2] = [Branch::Reroute, Branch::Complete];
}

/// Branch selector evaluated on the merged state
pub type BranchFn = Arc<dyn Fn(&ExecutionState) -> Branch + Send + Sync>;

#[derive(Clone)]
enum Edge {
    Static(Target),
    Conditional {
        select: BranchFn,
        table: HashMap<Branch, Target>,
    },
}

impl Edge {
    fn targets(&self) -> Vec<&Target> {
        match self {
            Edge::Static(target) => vec![target],
            Edge::Conditional { table, .. } => table.values().collect(),
        }
    }
}

/// Builder for [`GraphDefinition`]
///
/// Problems are collected while building and reported together by
/// [`build`](Self::build).
#[derive(Default)]
pub struct GraphBuilder {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    entry: Option<String>,
    finalizer: Option<String>,
    problems: Vec<String>,
}

impl GraphBuilder {
    /// Empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node
    #[must_use]
    pub fn add_node(mut self, id: impl Into<String>, node: Arc<dyn Node>) -> Self {
        let id = id.into();
        if id == END {
            self.problems.push(format!("'{END}' is reserved"));
        } else if self.nodes.insert(id.clone(), node).is_some() {
            self.problems.push(format!("node '{id}' added twice"));
        }
        self
    }

    /// Add an unconditional edge
    #[must_use]
    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<Target>) -> Self {
        let from = from.into();
        self.insert_edge(from, Edge::Static(to.into()));
        self
    }

    /// Add a conditional edge; `table` must map every [`Branch`]
    #[must_use]
    pub fn add_conditional_edges<I, T>(
        mut self,
        from: impl Into<String>,
        select: BranchFn,
        table: I,
    ) -> Self
    where
        I: IntoIterator<Item = (Branch, T)>,
        T: Into<Target>,
    {
        let from = from.into();
        let table = table.into_iter().map(|(b, t)| (b, t.into())).collect();
        self.insert_edge(from, Edge::Conditional { select, table });
        self
    }

    /// Set the entry node
    #[must_use]
    pub fn set_entry(mut self, id: impl Into<String>) -> Self {
        self.entry = Some(id.into());
        self
    }

    /// Set the node the engine jumps to when the visit cap is hit
    #[must_use]
    pub fn set_finalizer(mut self, id: impl Into<String>) -> Self {
        self.finalizer = Some(id.into());
        self
    }

    fn insert_edge(&mut self, from: String, edge: Edge) {
        if self.edges.contains_key(&from) {
            self.problems
                .push(format!("node '{from}' has more than one outgoing definition"));
        } else {
            self.edges.insert(from, edge);
        }
    }

    /// Validate and freeze the graph.
    ///
    /// # Errors
    /// [`Error::Graph`] listing every problem found
    pub fn build(self) -> Result<GraphDefinition> {
        let mut problems = self.problems;

        let entry = match self.entry {
            Some(id) if self.nodes.contains_key(&id) => Some(id),
            Some(id) => {
                problems.push(format!("entry '{id}' is not a node"));
                None
            }
            None => {
                problems.push("no entry node".to_string());
                None
            }
        };
        let finalizer = match self.finalizer {
            Some(id) if self.nodes.contains_key(&id) => Some(id),
            Some(id) => {
                problems.push(format!("finalizer '{id}' is not a node"));
                None
            }
            None => {
                problems.push("no finalizer node".to_string());
                None
            }
        };

        let mut ids: Vec<&String> = self.nodes.keys().collect();
        ids.sort();
        for id in ids {
            match self.edges.get(id) {
                None => problems.push(format!("node '{id}' has no outgoing edge")),
                Some(Edge::Conditional { table, .. }) => {
                    for branch in Branch::ALL {
                        if !table.contains_key(&branch) {
                            problems.push(format!("node '{id}' has no target for {branch:?}"));
                        }
                    }
                }
                Some(Edge::Static(_)) => {}
            }
        }

        let mut sources: Vec<&String> = self.edges.keys().collect();
        sources.sort();
        for from in sources {
            if !self.nodes.contains_key(from) {
                problems.push(format!("edge from unknown node '{from}'"));
            }
            for target in self.edges[from].targets() {
                if let Target::Node(to) = target {
                    if !self.nodes.contains_key(to) {
                        problems.push(format!("edge '{from}' -> '{to}' targets unknown node"));
                    }
                }
            }
        }

        if let (Some(entry), Some(finalizer)) = (&entry, &finalizer) {
            if problems.is_empty() {
                problems.extend(reachability_problems(&self.edges, entry, finalizer));
            }
        }

        match (entry, finalizer) {
            (Some(entry), Some(finalizer)) if problems.is_empty() => Ok(GraphDefinition {
                nodes: self.nodes,
                edges: self.edges,
                entry,
                finalizer,
            }),
            _ => Err(Error::Graph(problems.join("; "))),
        }
    }
}

/// Every node reachable from entry, the finalizer included, and END
/// reachable from each of them.
fn reachability_problems(
    edges: &HashMap<String, Edge>,
    entry: &str,
    finalizer: &str,
) -> Vec<String> {
    let mut problems = Vec::new();

    let mut reachable: HashSet<&str> = HashSet::new();
    let mut queue = VecDeque::from([entry]);
    while let Some(id) = queue.pop_front() {
        if !reachable.insert(id) {
            continue;
        }
        if let Some(edge) = edges.get(id) {
            for target in edge.targets() {
                if let Target::Node(next) = target {
                    queue.push_back(next.as_str());
                }
            }
        }
    }

    let mut unreachable: Vec<&str> = edges
        .keys()
        .map(String::as_str)
        .filter(|id| !reachable.contains(id))
        .collect();
    unreachable.sort_unstable();
    for id in unreachable {
        problems.push(format!("node '{id}' is unreachable from entry"));
    }
    if !reachable.contains(finalizer) {
        problems.push(format!("finalizer '{finalizer}' is unreachable from entry"));
    }

    // walk backwards from END
    let mut reaches_end: HashSet<&str> = HashSet::new();
    let mut changed = true;
    while changed {
        changed = false;
        for (id, edge) in edges {
            if reaches_end.contains(id.as_str()) {
                continue;
            }
            let done = edge.targets().into_iter().any(|t| match t {
                Target::End => true,
                Target::Node(next) => reaches_end.contains(next.as_str()),
            });
            if done {
                reaches_end.insert(id.as_str());
                changed = true;
            }
        }
    }

    let mut stuck: Vec<&str> = reachable
        .iter()
        .copied()
        .filter(|id| !reaches_end.contains(id))
        .collect();
    stuck.sort_unstable();
    for id in stuck {
        problems.push(format!("'{END}' is unreachable from node '{id}'"));
    }

    problems
}

/// Validated, immutable workflow graph
pub struct GraphDefinition {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    entry: String,
    finalizer: String,
}

impl GraphDefinition {
    /// Entry node id
    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Finalizer node id
    #[must_use]
    pub fn finalizer(&self) -> &str {
        &self.finalizer
    }

    /// Node by id
    #[must_use]
    pub fn node(&self, id: &str) -> Option<Arc<dyn Node>> {
        self.nodes.get(id).cloned()
    }

    /// All node ids, sorted
    #[must_use]
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Where to go after `from`, given the merged state.
    ///
    /// # Errors
    /// [`Error::Graph`] if `from` has no outgoing edge, which a built graph
    /// never allows
    pub fn resolve_next(&self, from: &str, state: &ExecutionState) -> Result<Target> {
        match self.edges.get(from) {
            Some(Edge::Static(target)) => Ok(target.clone()),
            Some(Edge::Conditional { select, table }) => {
                let branch = select(state);
                table
                    .get(&branch)
                    .cloned()
                    .ok_or_else(|| Error::Graph(format!("node '{from}' has no target for {branch:?}")))
            }
            None => Err(Error::Graph(format!("node '{from}' has no outgoing edge"))),
        }
    }
}

impl fmt::Debug for GraphDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphDefinition")
            .field("nodes", &self.node_ids())
            .field("entry", &self.entry)
            .field("finalizer", &self.finalizer)
            .finish_non_exhaustive()
    }
}
