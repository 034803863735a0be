//! Invoice storage. Reports read through `find_by_date_range`; all
//! aggregation happens in the service.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::invoice::{Invoice, InvoiceItem};
use crate::storage::db::DbConnection;

#[derive(Clone)]
pub struct InvoiceRepository {
    db: DbConnection,
}

impl InvoiceRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, invoice: &Invoice) -> Result<()> {
        sqlx::query("INSERT INTO invoices (id, created_at, items, total_amount) VALUES (?, ?, ?, ?)")
            .bind(&invoice.id)
            .bind(invoice.created_at)
            .bind(serde_json::to_string(&invoice.items)?)
            .bind(invoice.total_amount)
            .execute(self.db.pool())
            .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Invoice>> {
        let row = sqlx::query("SELECT * FROM invoices WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(row_to_invoice).transpose()
    }

    pub async fn list(&self) -> Result<Vec<Invoice>> {
        let rows = sqlx::query("SELECT * FROM invoices ORDER BY created_at DESC")
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(row_to_invoice).collect()
    }

    /// Returns whether a row was actually deleted.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Inclusive range scan on `created_at`.
    pub async fn find_by_date_range(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Invoice>> {
        let rows = sqlx::query("SELECT * FROM invoices WHERE created_at >= ? AND created_at <= ?")
            .bind(from)
            .bind(to)
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(row_to_invoice).collect()
    }
}

fn row_to_invoice(row: &SqliteRow) -> Result<Invoice> {
    let items: Vec<InvoiceItem> = serde_json::from_str(&row.try_get::<String, _>("items")?)?;
    Ok(Invoice {
        id: row.try_get("id")?,
        created_at: row.try_get("created_at")?,
        items,
        total_amount: row.try_get("total_amount")?,
    })
}
