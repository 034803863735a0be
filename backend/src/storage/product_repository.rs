use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::domain::models::product::{Product, UpdateProductRequest};
use crate::storage::db::DbConnection;

#[derive(Clone)]
pub struct ProductRepository {
    db: DbConnection,
}

impl ProductRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, description, image_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    pub async fn get_all(&self) -> Result<Vec<Product>> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY created_at DESC")
            .fetch_all(self.db.pool())
            .await?;
        rows.iter().map(row_to_product).collect()
    }

    /// Partial update; only supplied fields are written, `updated_at` always.
    /// Returns the stored record, or None when the id matches nothing.
    pub async fn update(&self, request: &UpdateProductRequest) -> Result<Option<Product>> {
        let Some(_current) = self.get_by_id(&request.id).await? else {
            return Ok(None);
        };

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE products SET ");
        let mut sets = qb.separated(", ");
        if let Some(name) = &request.name {
            sets.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(price) = request.price {
            sets.push("price = ").push_bind_unseparated(price);
        }
        if let Some(description) = &request.description {
            sets.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(image_url) = &request.image_url {
            sets.push("image_url = ")
                .push_bind_unseparated(image_url.clone());
        }
        sets.push("updated_at = ").push_bind_unseparated(Utc::now());
        qb.push(" WHERE id = ").push_bind(request.id.clone());
        qb.build().execute(self.db.pool()).await?;

        self.get_by_id(&request.id).await
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_product(row: &SqliteRow) -> Result<Product> {
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        price: row.try_get("price")?,
        description: row.try_get("description")?,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
