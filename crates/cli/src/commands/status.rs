//! `salesrag status`: show configuration, store counts and provider health.

use super::{config_file, load_config};
use salesrag_core::provider::Provider;
use salesrag_core::store::{OrderStore, VectorStore};
use salesrag_engine::Stores;
use std::path::Path;

pub async fn run(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;

    println!("salesrag status");
    println!("===============");
    println!("  Provider:     {}", config.default_provider);
    println!("  Primary:      {}", config.llm.primary_model);
    println!("  Fallback:     {}", config.llm.fallback_model);
    println!("  Temperature:  {}", config.llm.temperature);
    println!(
        "  Embedding:    {:?} ({}, {} dims)",
        config.embedding.backend, config.embedding.model, config.embedding.dimensions
    );
    println!(
        "  Retrieval:    top_k={} threshold={} gap={}",
        config.retrieval.top_k, config.retrieval.relative_threshold, config.retrieval.gap_margin
    );
    println!("  Token budget: {}", config.guard.max_context_tokens);
    println!(
        "  Storage:      {:?} ({})",
        config.storage.backend, config.storage.database_url
    );
    println!("  Gateway:      {}:{}", config.gateway.host, config.gateway.port);
    println!(
        "  API key:      {}",
        if config.has_api_key() { "set" } else { "missing" }
    );

    match Stores::from_config(&config).await {
        Ok(stores) => {
            println!("\n  Chunks:       {}", stores.vectors.count().await?);
            println!("  Orders:       {}", stores.orders.count().await?);
        }
        Err(e) => println!("\n  ⚠️  Store unavailable: {e}"),
    }

    let router = salesrag_providers::build_from_config(&config);
    match router.completion_chain(&config.llm.primary_model, &config.llm.fallback_model) {
        Ok(chain) => match chain.health_check().await {
            Ok(true) => println!("  Completion:   ✅ reachable"),
            Ok(false) => println!("  Completion:   ⚠️  no model endpoint reachable"),
            Err(e) => println!("  Completion:   ⚠️  {e}"),
        },
        Err(e) => println!("  Completion:   ⚠️  {e}"),
    }

    let config_path = config_file(path);
    if config_path.exists() {
        println!("\n  ✅ Config file found at {}", config_path.display());
    } else {
        println!("\n  ⚠️  No config file; run `salesrag init` first");
    }

    Ok(())
}
