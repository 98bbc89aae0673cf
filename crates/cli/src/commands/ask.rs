//! `salesrag ask`: answer one question from the terminal.

use super::load_config;
use salesrag_core::answer::AskResponse;
use salesrag_core::retrieval::AccessRole;
use std::path::Path;

pub async fn run(
    path: Option<&Path>,
    question: &str,
    role: Option<&str>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    let runtime = salesrag_engine::build_runtime(&config).await?;
    let role = AccessRole::from_header(role);

    let response = runtime.engine.ask(question, &role).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match response {
        AskResponse::Rejected { error } => {
            eprintln!("  [Error] {error}");
        }
        AskResponse::Answered(result) => {
            println!("{}", result.answer);
            if let (Some(model), Some(usage)) = (result.model_used, result.token_usage) {
                eprintln!(
                    "\n  intent: {} | model: {model} | tokens: {} ({} prompt, {} completion)",
                    result.intent, usage.total, usage.prompt, usage.completion
                );
            } else {
                eprintln!("\n  intent: {}", result.intent);
            }
        }
    }

    Ok(())
}
