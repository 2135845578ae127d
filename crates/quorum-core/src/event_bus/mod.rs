//! EventBus - broadcast notifications about workflow runs.
//!
//! Subscribers (log sinks, dashboards, the HTTP layer) observe runs through
//! this channel. The engine never reads it back.

/// Broadcast channel wrapper.
pub mod bus;
/// Event definitions.
pub mod types;

pub use bus::EventBus;
pub use types::WorkflowEvent;

#[cfg(test)]
mod tests;
