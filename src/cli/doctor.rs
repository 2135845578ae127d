//! Configuration and provider diagnostics

use std::time::Duration;

pub async fn run() -> anyhow::Result<()> {
    println!("🩺 Quorum Doctor\n");

    print!("Loading configuration... ");
    let config = match crate::server::load_config() {
        Ok(config) => {
            println!("✅");
            config
        }
        Err(e) => {
            println!("❌ {e:#}");
            anyhow::bail!("configuration could not be loaded");
        }
    };

    let mut all_ok = true;

    print!("Validating workflow limits... ");
    match config.workflow.validate() {
        Ok(()) => println!(
            "✅ visits ≤ {}, consultations ≤ {} ({} per responder)",
            config.workflow.max_node_visits,
            config.workflow.max_total_consultations,
            config.workflow.max_consultations_per_responder
        ),
        Err(e) => {
            println!("❌ {e}");
            all_ok = false;
        }
    }

    print!("Resolving LLM provider '{}'... ", config.llm.provider);
    let provider = match crate::server::resolve_llm_provider(&config.llm) {
        Ok(provider) => {
            println!("✅ {} ({})", provider.name(), provider.default_model());
            Some(provider)
        }
        Err(e) => {
            println!("❌ {e:#}");
            all_ok = false;
            None
        }
    };

    if let Some(provider) = provider {
        print!("Sending probe completion... ");
        let probe = provider.probe(config.llm.model.clone());
        match tokio::time::timeout(Duration::from_secs(30), probe).await {
            Ok(Ok(response)) => println!("✅ model {}", response.model),
            Ok(Err(e)) => {
                println!("❌ {e}");
                all_ok = false;
            }
            Err(_) => {
                println!("❌ no reply within 30s");
                all_ok = false;
            }
        }
    }

    println!();
    if all_ok {
        println!("✅ All checks passed! Ready to run Quorum.");
        Ok(())
    } else {
        println!("⚠️  Some checks failed. Please fix the issues above.");
        anyhow::bail!("doctor found problems")
    }
}
