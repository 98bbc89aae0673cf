//! Sales-order intake: validate, price, store and index new orders.
//!
//! Every item needs a positive quantity (`KWMENG`) and net price (`NETPR`).
//! The order value (`NETWR`) is the sum of quantity × price, less a 5%
//! discount when that sum exceeds 10,000.

use crate::ingest::TextIngestor;
use salesrag_core::error::{OrderError, Result};
use salesrag_core::order::NewSalesOrder;
use salesrag_core::retrieval::SalesOrderRow;
use salesrag_core::store::OrderStore;
use std::sync::Arc;
use tracing::{debug, info};

/// Gross totals strictly above this receive the discount.
pub const DISCOUNT_THRESHOLD: f64 = 10_000.0;

pub const DISCOUNT_RATE: f64 = 0.05;

/// Source tag of order documents in the vector store.
pub const ORDER_SOURCE: &str = "sales_orders";

/// The computed value of a validated order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderPricing {
    pub gross: f64,
    pub discount: f64,
    pub net_value: f64,
}

/// Validate `order` and compute its net value.
pub fn price_order(order: &NewSalesOrder) -> std::result::Result<OrderPricing, OrderError> {
    if order.sales_order_number.trim().is_empty() {
        return Err(OrderError::MissingOrderNumber);
    }
    if order.items.is_empty() {
        return Err(OrderError::NoItems);
    }

    let mut gross = 0.0;
    for (index, item) in order.items.iter().enumerate() {
        let quantity = positive(item.quantity).ok_or_else(|| OrderError::InvalidQuantity {
            position: item.label(index),
        })?;
        let price = positive(item.net_price).ok_or_else(|| OrderError::InvalidPrice {
            position: item.label(index),
        })?;
        gross += quantity * price;
    }

    let discount = if gross > DISCOUNT_THRESHOLD {
        gross * DISCOUNT_RATE
    } else {
        0.0
    };

    Ok(OrderPricing {
        gross,
        discount,
        net_value: gross - discount,
    })
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// The reporting row for a priced order.
///
/// A single-item order carries that item's text, quantity and price. A
/// multi-item order lists the item texts and totals the quantity; it has no
/// single unit price.
pub fn order_row(order: &NewSalesOrder, pricing: &OrderPricing) -> SalesOrderRow {
    let mut row = SalesOrderRow::new(order.sales_order_number.trim(), pricing.net_value);
    row.customer_name = order.customer_name.clone();
    row.currency = order.currency.clone();

    match order.items.as_slice() {
        [item] => {
            row.item_text = item.item_text.clone();
            row.quantity = item.quantity;
            row.net_price = item.net_price;
        }
        items => {
            let texts: Vec<&str> = items
                .iter()
                .filter_map(|i| i.item_text.as_deref())
                .collect();
            row.item_text = (!texts.is_empty()).then(|| texts.join("; "));
            row.quantity = Some(items.iter().filter_map(|i| i.quantity).sum());
        }
    }
    row
}

/// Plain-text rendering of an order row, one field per line, for embedding.
pub fn render_order_document(row: &SalesOrderRow) -> String {
    let mut lines = vec![format!("Sales Order {}", row.sales_order_number)];
    if let Some(customer) = &row.customer_name {
        lines.push(format!("Customer {customer}"));
    }
    match &row.currency {
        Some(currency) => lines.push(format!("Total value {} {currency}", row.net_value)),
        None => lines.push(format!("Total value {}", row.net_value)),
    }
    if let Some(item) = &row.item_text {
        lines.push(format!("Item {item}"));
    }
    if let Some(quantity) = row.quantity {
        lines.push(format!("Quantity {quantity}"));
    }
    if let Some(price) = row.net_price {
        lines.push(format!("Price {price}"));
    }
    lines.join("\n")
}

/// Creates orders in the order store and mirrors them into the vector store.
pub struct OrderIntake {
    store: Arc<dyn OrderStore>,
    indexer: Arc<TextIngestor>,
    index_on_create: bool,
}

impl OrderIntake {
    pub fn new(store: Arc<dyn OrderStore>, indexer: Arc<TextIngestor>) -> Self {
        Self {
            store,
            indexer,
            index_on_create: true,
        }
    }

    /// Whether [`create`](Self::create) also embeds the new order.
    pub fn with_index_on_create(mut self, enabled: bool) -> Self {
        self.index_on_create = enabled;
        self
    }

    /// Validate, price and store one order. Invalid orders store nothing.
    pub async fn create(&self, order: &NewSalesOrder) -> Result<SalesOrderRow> {
        let pricing = price_order(order)?;
        if pricing.discount > 0.0 {
            info!(
                order = %order.sales_order_number,
                gross = pricing.gross,
                discount = pricing.discount,
                "Discount applied"
            );
        }

        let row = order_row(order, &pricing);
        self.store.upsert(&row).await?;

        if self.index_on_create {
            self.indexer
                .load_document(&render_order_document(&row), ORDER_SOURCE)
                .await?;
        }

        info!(
            order = %row.sales_order_number,
            net_value = row.net_value,
            indexed = self.index_on_create,
            "Sales order stored"
        );
        Ok(row)
    }

    /// Embed every stored order as a text document. Returns how many were
    /// indexed. Running it twice stores each document twice.
    pub async fn index_all(&self) -> Result<usize> {
        let rows = self.store.list().await?;
        for row in &rows {
            self.indexer
                .load_document(&render_order_document(row), ORDER_SOURCE)
                .await?;
            debug!(order = %row.sales_order_number, "Indexed order");
        }
        info!(count = rows.len(), "Indexed stored orders");
        Ok(rows.len())
    }
}
