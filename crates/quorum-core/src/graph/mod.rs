//! Graph definition and execution
//!
//! A [`GraphDefinition`] is built once through [`GraphBuilder`], which
//! rejects misconfigured graphs up front. [`GraphEngine`] then drives one
//! [`ExecutionState`](crate::state::ExecutionState) at a time through it.

/// Nodes, edges and the validating builder.
pub mod definition;
/// The sequential executor.
pub mod engine;

pub use definition::{Branch, BranchFn, GraphBuilder, GraphDefinition, Node, Target, END};
pub use engine::GraphEngine;

#[cfg(test)]
mod tests;
