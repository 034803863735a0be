//! Handlers for invoices and the sales reports.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tracing::info;

use crate::domain::models::invoice::{
    CreateInvoiceRequest, Invoice, InvoiceReport, ProductSalesReport, SalesByPeriod,
};
use crate::error::AppError;
use crate::rest::{ApiResponse, AppState, IdQuery};

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub group: Option<String>,
}

impl DateRangeQuery {
    /// Parse the `YYYY-MM-DD` bounds. Both instants are midnights; the range
    /// scan compares inclusively against the `to` midnight.
    fn parse_range(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
        let (Some(from), Some(to)) = (&self.from, &self.to) else {
            return Err(AppError::Validation(
                "Missing from or to query param".to_string(),
            ));
        };
        let from = NaiveDate::parse_from_str(from, "%Y-%m-%d")
            .map_err(|_| AppError::Validation("Invalid from date".to_string()))?;
        let to = NaiveDate::parse_from_str(to, "%Y-%m-%d")
            .map_err(|_| AppError::Validation("Invalid to date".to_string()))?;
        Ok((
            from.and_time(NaiveTime::MIN).and_utc(),
            to.and_time(NaiveTime::MIN).and_utc(),
        ))
    }
}

pub async fn create_invoice(
    State(state): State<AppState>,
    Json(request): Json<CreateInvoiceRequest>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    info!("POST /api/invoices - {} items", request.items.len());
    let invoice = state.invoice_service.create(request).await?;
    Ok(Json(ApiResponse::success("Invoice created", invoice)))
}

pub async fn list_invoices(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Invoice>>>, AppError> {
    info!("GET /api/invoices");
    let invoices = state.invoice_service.list().await?;
    Ok(Json(ApiResponse::success("Invoices", invoices)))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<Invoice>>, AppError> {
    let id = query.require()?;
    info!("GET /api/invoices/detail - id: {}", id);
    let invoice = state.invoice_service.get(&id).await?;
    Ok(Json(ApiResponse::success("Invoice found", invoice)))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = query.require()?;
    info!("DELETE /api/invoices - id: {}", id);
    state.invoice_service.delete(&id).await?;
    Ok(Json(ApiResponse::success("Invoice deleted", ())))
}

pub async fn invoice_summary(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<InvoiceReport>>, AppError> {
    info!("GET /api/invoices/summary - query: {:?}", query);
    let (from, to) = query.parse_range()?;
    let report = state.invoice_service.summary(from, to).await?;
    Ok(Json(ApiResponse::success("Invoice summary", report)))
}

pub async fn product_sales_report(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<ProductSalesReport>>>, AppError> {
    info!("GET /api/invoices/report/products - query: {:?}", query);
    let (from, to) = query.parse_range()?;
    let report = state.invoice_service.product_sales(from, to).await?;
    Ok(Json(ApiResponse::success("Product sales report", report)))
}

pub async fn sales_by_period_report(
    State(state): State<AppState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<SalesByPeriod>>>, AppError> {
    info!("GET /api/invoices/report/grouped - query: {:?}", query);
    let group = query
        .group
        .clone()
        .ok_or_else(|| AppError::Validation("Missing group query param".to_string()))?;
    let (from, to) = query.parse_range()?;
    let report = state
        .invoice_service
        .sales_by_period(from, to, &group)
        .await?;
    Ok(Json(ApiResponse::success("Sales by period", report)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(from: Option<&str>, to: Option<&str>) -> DateRangeQuery {
        DateRangeQuery {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
            group: None,
        }
    }

    #[test]
    fn parse_range_requires_both_bounds() {
        assert!(range(Some("2024-06-01"), None).parse_range().is_err());
        assert!(range(None, Some("2024-06-30")).parse_range().is_err());
    }

    #[test]
    fn parse_range_rejects_bad_dates() {
        assert!(range(Some("06/01/2024"), Some("2024-06-30"))
            .parse_range()
            .is_err());
        assert!(range(Some("2024-06-01"), Some("2024-13-01"))
            .parse_range()
            .is_err());
    }

    #[test]
    fn parse_range_yields_midnights() {
        let (from, to) = range(Some("2024-06-01"), Some("2024-06-30"))
            .parse_range()
            .unwrap();
        assert_eq!(from.to_rfc3339(), "2024-06-01T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2024-06-30T00:00:00+00:00");
    }
}
