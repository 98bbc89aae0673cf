//! `salesrag load-text`: ingest the source document.

use super::load_config;
use std::path::{Path, PathBuf};

pub async fn run(
    path: Option<&Path>,
    source: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(path)?;
    if let Some(source) = source {
        config.ingest.source_path = source.display().to_string();
    }

    tracing::info!(source = %config.ingest.source_path, "Loading source text");
    let runtime = salesrag_engine::build_runtime(&config).await?;
    let inserted = runtime
        .ingestor
        .load_file(Path::new(&config.ingest.source_path))
        .await?;

    println!("Inserted {inserted} chunks");
    Ok(())
}
