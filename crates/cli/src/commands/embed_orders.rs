//! `salesrag embed-orders`: index every stored order in the vector store.

use super::load_config;
use std::path::Path;

pub async fn run(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    let runtime = salesrag_engine::build_runtime(&config).await?;
    let indexed = runtime.orders.index_all().await?;

    println!("Indexed {indexed} orders");
    Ok(())
}
