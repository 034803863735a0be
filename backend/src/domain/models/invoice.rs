//! Invoice documents and the report shapes derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub product_id: String,
    /// Positive unit count.
    pub quantity: i64,
    pub unit_price: f64,
    /// Display-name snapshot taken at sale time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// quantity × unit_price. Always recomputed server-side; any value the
    /// client sends is discarded.
    #[serde(default)]
    pub total_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<InvoiceItem>,
    /// Sum of line totals, recomputed server-side at write time.
    #[serde(default)]
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceRequest {
    /// Caller-assigned id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub items: Vec<InvoiceItem>,
}

/// Single-record summary over a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceReport {
    pub total_invoices: i64,
    pub total_amount: f64,
    pub total_product_units: i64,
}

/// Revenue per distinct product over a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSalesReport {
    pub product_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    pub total_sold: i64,
    pub revenue: f64,
}

/// Revenue per calendar day or month bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesByPeriod {
    /// "2024-06-06" for day grouping, "2024-06" for month grouping.
    pub period: String,
    pub revenue: f64,
    pub quantity: i64,
}
