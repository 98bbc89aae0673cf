//! `salesrag load-orders`: create sales orders from a JSON file.

use super::load_config;
use salesrag_core::error::Error;
use salesrag_core::order::NewSalesOrder;
use std::path::Path;

/// The file holds a JSON array of orders. Invalid orders are reported and
/// skipped; any other failure stops the load.
pub async fn run(path: Option<&Path>, file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|e| format!("Cannot read {}: {e}", file.display()))?;
    let orders: Vec<NewSalesOrder> = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid order file {}: {e}", file.display()))?;

    tracing::info!(file = %file.display(), count = orders.len(), "Loading sales orders");
    let runtime = salesrag_engine::build_runtime(&config).await?;

    let mut created = 0;
    let mut skipped = 0;
    for order in &orders {
        match runtime.orders.create(order).await {
            Ok(row) => {
                created += 1;
                println!(
                    "  ✅ {} net value {} {}",
                    row.sales_order_number,
                    row.net_value,
                    row.currency.as_deref().unwrap_or("")
                );
            }
            Err(Error::Order(e)) => {
                skipped += 1;
                println!("  ⚠️  Skipped {}: {e}", order.sales_order_number);
            }
            Err(e) => return Err(e.into()),
        }
    }

    println!("Created {created} orders, skipped {skipped}");
    Ok(())
}
