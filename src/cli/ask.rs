//! One-shot question answering from the terminal

use anyhow::{bail, Context, Result};
use quorum_core::UserFriendlyError;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::api::QueryResponse;

pub async fn run(query: &str, json: bool) -> Result<()> {
    let query = query.trim();
    if query.is_empty() {
        bail!("query must not be empty");
    }

    let config = crate::server::load_config()?;
    let workflow = crate::server::build_workflow(&config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    match workflow.answer(query, &cancel).await {
        Ok(outcome) => {
            if json {
                let body = QueryResponse::new(query, outcome);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&body).context("Failed to encode outcome")?
                );
            } else {
                let topic = outcome.topic.map_or("unclassified", |t| t.as_str());
                let agents: Vec<&str> = outcome.agents_consulted.iter().map(|a| a.as_str()).collect();
                println!("Topic:  {topic}");
                println!("Agents: {}", agents.join(", "));
                if outcome.cap_reached {
                    println!("(stopped at the visit cap)");
                }
                println!();
                println!("{}", outcome.response);
            }
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "Query failed");
            eprintln!("{}", e.user_message());
            if let Some(hint) = e.suggestion() {
                eprintln!("Hint: {hint}");
            }
            bail!("query failed")
        }
    }
}
