//! Sales-order creation payloads.
//!
//! Field names follow the same SAP columns as [`SalesOrderRow`]; the order
//! net value (`NETWR`) is never accepted from the caller, it is computed from
//! the items.
//!
//! [`SalesOrderRow`]: crate::retrieval::SalesOrderRow

use serde::{Deserialize, Serialize};

/// One line of a new sales order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Item number within the order, e.g. `"000010"`.
    #[serde(rename = "POSNR", default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,

    #[serde(rename = "ARKTX", default, skip_serializing_if = "Option::is_none")]
    pub item_text: Option<String>,

    #[serde(rename = "KWMENG", default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,

    #[serde(rename = "NETPR", default, skip_serializing_if = "Option::is_none")]
    pub net_price: Option<f64>,
}

impl OrderItem {
    pub fn new(item_text: impl Into<String>, quantity: f64, net_price: f64) -> Self {
        Self {
            position: None,
            item_text: Some(item_text.into()),
            quantity: Some(quantity),
            net_price: Some(net_price),
        }
    }

    /// The label used in validation messages: the item number if given,
    /// otherwise the 1-based line index.
    pub fn label(&self, index: usize) -> String {
        self.position
            .clone()
            .unwrap_or_else(|| (index + 1).to_string())
    }
}

/// A sales order as submitted for creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSalesOrder {
    #[serde(rename = "SalesOrderNumber", default)]
    pub sales_order_number: String,

    #[serde(rename = "CustomerName", default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    #[serde(rename = "WAERK", default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(rename = "Items", default)]
    pub items: Vec<OrderItem>,
}
