//! Retrieval domain types: intents, vector hits, sales-order rows and the
//! requester's access role.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Retrieval strategy derived once per question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Exact lookup of referenced sales orders only.
    Structured,
    /// Semantic search over the document corpus only.
    Vector,
    /// Both paths, merged.
    Hybrid,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Structured => "structured",
            Intent::Vector => "vector",
            Intent::Hybrid => "hybrid",
        }
    }

    /// Whether this intent consults the vector store.
    pub fn uses_vector(&self) -> bool {
        matches!(self, Intent::Vector | Intent::Hybrid)
    }

    /// Whether this intent consults the order store.
    pub fn uses_structured(&self) -> bool {
        matches!(self, Intent::Structured | Intent::Hybrid)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structured" => Ok(Intent::Structured),
            "vector" => Ok(Intent::Vector),
            "hybrid" => Ok(Intent::Hybrid),
            other => Err(format!("unknown intent '{other}'")),
        }
    }
}

/// One candidate match from the vector store.
///
/// `score` is a cosine similarity in [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorHit {
    pub content: String,
    pub score: f32,
}

impl VectorHit {
    pub fn new(content: impl Into<String>, score: f32) -> Self {
        Self {
            content: content.into(),
            score,
        }
    }
}

/// A sales-order record as exposed by the order store's reporting view.
///
/// Field names on the wire follow the SAP view columns so the context dump
/// reads the same way analysts see the data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesOrderRow {
    #[serde(rename = "SalesOrderNumber")]
    pub sales_order_number: String,

    #[serde(rename = "CustomerName", default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    /// Net value of the order.
    #[serde(rename = "NETWR")]
    pub net_value: f64,

    #[serde(rename = "WAERK", default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    /// Item description.
    #[serde(rename = "ARKTX", default, skip_serializing_if = "Option::is_none")]
    pub item_text: Option<String>,

    /// Ordered quantity.
    #[serde(rename = "KWMENG", default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,

    /// Net price per unit.
    #[serde(rename = "NETPR", default, skip_serializing_if = "Option::is_none")]
    pub net_price: Option<f64>,
}

impl SalesOrderRow {
    /// Minimal row with just an order number and net value.
    pub fn new(sales_order_number: impl Into<String>, net_value: f64) -> Self {
        Self {
            sales_order_number: sales_order_number.into(),
            customer_name: None,
            net_value,
            currency: None,
            item_text: None,
            quantity: None,
            net_price: None,
        }
    }
}

/// The requester's declared role. Supplied externally and trusted as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessRole {
    /// Sees only orders below the high-value threshold.
    #[default]
    SalesRep,
    /// Sees only orders at or above the high-value threshold.
    RiskManager,
    /// Full access.
    Finance,
    /// Any other label. Full access.
    Other(String),
}

impl AccessRole {
    /// Parse an optional header value; absent or blank means the default role.
    pub fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") => AccessRole::default(),
            Some(v) => v.parse().unwrap_or_default(),
        }
    }

    /// The canonical label for logs and audit records.
    pub fn label(&self) -> &str {
        match self {
            AccessRole::SalesRep => "SALES_REP",
            AccessRole::RiskManager => "RISK_MANAGER",
            AccessRole::Finance => "FINANCE",
            AccessRole::Other(label) => label,
        }
    }

    /// Whether a row with the given net value is visible to this role.
    pub fn admits(&self, net_value: f64, high_value_threshold: f64) -> bool {
        match self {
            AccessRole::SalesRep => net_value < high_value_threshold,
            AccessRole::RiskManager => net_value >= high_value_threshold,
            AccessRole::Finance | AccessRole::Other(_) => true,
        }
    }
}

impl FromStr for AccessRole {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(match trimmed.to_ascii_uppercase().as_str() {
            "SALES_REP" => AccessRole::SalesRep,
            "RISK_MANAGER" => AccessRole::RiskManager,
            "FINANCE" => AccessRole::Finance,
            _ => AccessRole::Other(trimmed.to_string()),
        })
    }
}

impl fmt::Display for AccessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
