//! Server module for Quorum
//!
//! # Module Structure
//!
//! - `config`: configuration structures
//! - `loader`: layered loading from embedded defaults, files and environment
//! - `providers`: LLM provider resolution
//! - `init`: workflow assembly and the HTTP run loop

pub mod config;
mod init;
mod loader;
mod providers;

pub use init::{build_workflow, run};
pub use loader::load_config;
pub use providers::resolve_llm_provider;
