//! `salesrag serve`: start the HTTP API server.

use super::load_config;
use std::path::Path;

pub async fn run(
    path: Option<&Path>,
    port_override: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(path)?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let runtime = salesrag_engine::build_runtime(&config).await?;

    println!("salesrag gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Models:    {} -> {}", config.llm.primary_model, config.llm.fallback_model);

    salesrag_gateway::start(config, runtime).await?;

    Ok(())
}
