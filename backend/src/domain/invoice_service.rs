//! Invoice service: write-time total recomputation and the report scans.
//!
//! Reports load the date-range slice and aggregate in memory; the ranges
//! involved are small (a shop's day or month of sales) and keeping the math
//! here keeps the storage layer free of report shapes.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::models::invoice::{
    CreateInvoiceRequest, Invoice, InvoiceReport, ProductSalesReport, SalesByPeriod,
};
use crate::error::AppError;
use crate::storage::invoice_repository::InvoiceRepository;

pub const GROUP_DAY: &str = "day";
pub const GROUP_MONTH: &str = "month";

fn new_invoice_id() -> String {
    format!("invoice::{}", Utc::now().timestamp_micros())
}

#[derive(Clone)]
pub struct InvoiceService {
    repository: InvoiceRepository,
}

impl InvoiceService {
    pub fn new(repository: InvoiceRepository) -> Self {
        Self { repository }
    }

    /// Persist a new invoice. Line totals and the invoice total are always
    /// recomputed here; whatever the client sent for them is discarded.
    pub async fn create(&self, request: CreateInvoiceRequest) -> Result<Invoice, AppError> {
        if request.items.is_empty() {
            return Err(AppError::Validation(
                "Invoice must contain at least one item".to_string(),
            ));
        }

        let mut items = request.items;
        let mut total_amount = 0.0;
        for item in &mut items {
            if item.quantity <= 0 {
                return Err(AppError::Validation(format!(
                    "Quantity must be positive for product {}",
                    item.product_id
                )));
            }
            item.total_price = item.quantity as f64 * item.unit_price;
            total_amount += item.total_price;
        }

        let invoice = Invoice {
            id: request.id.unwrap_or_else(new_invoice_id),
            created_at: Utc::now(),
            items,
            total_amount,
        };
        self.repository.insert(&invoice).await?;
        Ok(invoice)
    }

    pub async fn get(&self, id: &str) -> Result<Invoice, AppError> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Invoice>, AppError> {
        Ok(self.repository.list().await?)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.repository.delete(id).await? {
            return Err(AppError::NotFound("Invoice not found".to_string()));
        }
        Ok(())
    }

    /// One summary record over the inclusive date range.
    pub async fn summary(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<InvoiceReport, AppError> {
        let invoices = self.repository.find_by_date_range(from, to).await?;
        let mut report = InvoiceReport::default();
        for invoice in &invoices {
            report.total_invoices += 1;
            report.total_amount += invoice.total_amount;
            for item in &invoice.items {
                report.total_product_units += item.quantity;
            }
        }
        Ok(report)
    }

    /// Units and revenue per distinct product over the range. Order of the
    /// returned rows is unspecified.
    pub async fn product_sales(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ProductSalesReport>, AppError> {
        let invoices = self.repository.find_by_date_range(from, to).await?;
        let mut by_product: HashMap<String, ProductSalesReport> = HashMap::new();
        for invoice in &invoices {
            for item in &invoice.items {
                let entry = by_product
                    .entry(item.product_id.clone())
                    .or_insert_with(|| ProductSalesReport {
                        product_id: item.product_id.clone(),
                        product_name: item.product_name.clone(),
                        total_sold: 0,
                        revenue: 0.0,
                    });
                entry.total_sold += item.quantity;
                entry.revenue += item.total_price;
                if entry.product_name.is_none() {
                    entry.product_name = item.product_name.clone();
                }
            }
        }
        Ok(by_product.into_values().collect())
    }

    /// Revenue bucketed by calendar day or month. The group name is
    /// validated before any scan happens.
    pub async fn sales_by_period(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        group: &str,
    ) -> Result<Vec<SalesByPeriod>, AppError> {
        let pattern = match group {
            GROUP_DAY => "%Y-%m-%d",
            GROUP_MONTH => "%Y-%m",
            _ => {
                return Err(AppError::Validation(
                    "Group must be 'day' or 'month'".to_string(),
                ))
            }
        };

        let invoices = self.repository.find_by_date_range(from, to).await?;
        let mut by_period: HashMap<String, SalesByPeriod> = HashMap::new();
        for invoice in &invoices {
            let period = invoice.created_at.format(pattern).to_string();
            let entry = by_period
                .entry(period.clone())
                .or_insert_with(|| SalesByPeriod {
                    period,
                    revenue: 0.0,
                    quantity: 0,
                });
            entry.revenue += invoice.total_amount;
            for item in &invoice.items {
                entry.quantity += item.quantity;
            }
        }
        let mut periods: Vec<SalesByPeriod> = by_period.into_values().collect();
        periods.sort_by(|a, b| a.period.cmp(&b.period));
        Ok(periods)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::invoice::InvoiceItem;
    use crate::storage::DbConnection;
    use chrono::{Duration, TimeZone};

    async fn service() -> (InvoiceService, InvoiceRepository) {
        let db = DbConnection::init_test().await.expect("init test db");
        let repository = InvoiceRepository::new(db);
        (InvoiceService::new(repository.clone()), repository)
    }

    fn item(product_id: &str, quantity: i64, unit_price: f64) -> InvoiceItem {
        InvoiceItem {
            product_id: product_id.to_string(),
            quantity,
            unit_price,
            product_name: None,
            // Deliberately wrong; the service must overwrite it.
            total_price: 9999.0,
        }
    }

    #[tokio::test]
    async fn create_recomputes_totals_and_discards_client_values() {
        let (service, _) = service().await;
        let invoice = service
            .create(CreateInvoiceRequest {
                id: None,
                items: vec![item("p1", 2, 10_000.0), item("p2", 3, 5_000.0)],
            })
            .await
            .unwrap();

        assert_eq!(invoice.items[0].total_price, 20_000.0);
        assert_eq!(invoice.items[1].total_price, 15_000.0);
        assert_eq!(invoice.total_amount, 35_000.0);

        let stored = service.get(&invoice.id).await.unwrap();
        assert_eq!(stored.total_amount, 35_000.0);
    }

    #[tokio::test]
    async fn create_rejects_empty_and_nonpositive_quantities() {
        let (service, _) = service().await;
        let empty = service
            .create(CreateInvoiceRequest {
                id: None,
                items: Vec::new(),
            })
            .await;
        assert!(matches!(empty, Err(AppError::Validation(_))));

        let zero = service
            .create(CreateInvoiceRequest {
                id: None,
                items: vec![item("p1", 0, 10.0)],
            })
            .await;
        assert!(matches!(zero, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn delete_missing_invoice_is_not_found() {
        let (service, _) = service().await;
        assert!(matches!(
            service.delete("invoice::0").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn summary_counts_invoices_amount_and_units() {
        let (service, _) = service().await;
        service
            .create(CreateInvoiceRequest {
                id: None,
                items: vec![item("p1", 2, 10.0)],
            })
            .await
            .unwrap();
        service
            .create(CreateInvoiceRequest {
                id: None,
                items: vec![item("p1", 1, 10.0), item("p2", 4, 2.5)],
            })
            .await
            .unwrap();

        let from = Utc::now() - Duration::days(1);
        let to = Utc::now() + Duration::days(1);
        let report = service.summary(from, to).await.unwrap();
        assert_eq!(report.total_invoices, 2);
        assert_eq!(report.total_amount, 40.0);
        assert_eq!(report.total_product_units, 7);
    }

    #[tokio::test]
    async fn summary_excludes_invoices_outside_the_range() {
        let (service, repository) = service().await;
        let old = Invoice {
            id: "invoice::1".to_string(),
            created_at: Utc.with_ymd_and_hms(2020, 1, 1, 12, 0, 0).unwrap(),
            items: vec![item("p1", 1, 10.0)],
            total_amount: 10.0,
        };
        repository.insert(&old).await.unwrap();
        service
            .create(CreateInvoiceRequest {
                id: None,
                items: vec![item("p1", 1, 10.0)],
            })
            .await
            .unwrap();

        let from = Utc::now() - Duration::days(1);
        let to = Utc::now() + Duration::days(1);
        let report = service.summary(from, to).await.unwrap();
        assert_eq!(report.total_invoices, 1);
    }

    #[tokio::test]
    async fn product_sales_groups_by_product() {
        let (service, _) = service().await;
        service
            .create(CreateInvoiceRequest {
                id: None,
                items: vec![item("p1", 2, 10.0), item("p2", 1, 100.0)],
            })
            .await
            .unwrap();
        service
            .create(CreateInvoiceRequest {
                id: None,
                items: vec![item("p1", 3, 10.0)],
            })
            .await
            .unwrap();

        let from = Utc::now() - Duration::days(1);
        let to = Utc::now() + Duration::days(1);
        let mut rows = service.product_sales(from, to).await.unwrap();
        rows.sort_by(|a, b| a.product_id.cmp(&b.product_id));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].product_id, "p1");
        assert_eq!(rows[0].total_sold, 5);
        assert_eq!(rows[0].revenue, 50.0);
        assert_eq!(rows[1].product_id, "p2");
        assert_eq!(rows[1].total_sold, 1);
        assert_eq!(rows[1].revenue, 100.0);
    }

    #[tokio::test]
    async fn sales_by_period_buckets_by_day_and_month() {
        let (service, repository) = service().await;
        for (id, day, amount) in [
            ("invoice::1", 5, 10.0),
            ("invoice::2", 5, 20.0),
            ("invoice::3", 6, 40.0),
        ] {
            let invoice = Invoice {
                id: id.to_string(),
                created_at: Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap(),
                items: vec![InvoiceItem {
                    product_id: "p1".to_string(),
                    quantity: 1,
                    unit_price: amount,
                    product_name: None,
                    total_price: amount,
                }],
                total_amount: amount,
            };
            repository.insert(&invoice).await.unwrap();
        }

        let from = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();

        let by_day = service.sales_by_period(from, to, GROUP_DAY).await.unwrap();
        assert_eq!(by_day.len(), 2);
        assert_eq!(by_day[0].period, "2024-06-05");
        assert_eq!(by_day[0].revenue, 30.0);
        assert_eq!(by_day[0].quantity, 2);
        assert_eq!(by_day[1].period, "2024-06-06");
        assert_eq!(by_day[1].revenue, 40.0);

        let by_month = service
            .sales_by_period(from, to, GROUP_MONTH)
            .await
            .unwrap();
        assert_eq!(by_month.len(), 1);
        assert_eq!(by_month[0].period, "2024-06");
        assert_eq!(by_month[0].revenue, 70.0);
        assert_eq!(by_month[0].quantity, 3);
    }

    #[tokio::test]
    async fn sales_by_period_rejects_unknown_group() {
        let (service, _) = service().await;
        let result = service
            .sales_by_period(Utc::now(), Utc::now(), "week")
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
