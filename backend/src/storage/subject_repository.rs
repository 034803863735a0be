//! Subject storage with the shared sparse-update policy: only supplied
//! fields are written, except `is_active` and `updated_at` which are always
//! written; a supplied name rewrites `name_normalized` in the same statement.

use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::domain::models::subject::{Subject, UpdateSubjectRequest};
use crate::storage::db::DbConnection;
use crate::storage::order_clause;
use crate::text::normalize_text;

const SORT_FIELDS: &[&str] = &["name", "code", "created_at", "updated_at"];

#[derive(Debug, Clone, Default)]
pub struct SubjectListFilter {
    pub page: i64,
    pub limit: i64,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Clone)]
pub struct SubjectRepository {
    db: DbConnection,
}

impl SubjectRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, subject: &Subject) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subjects (id, name, code, name_normalized, description,
                                  is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&subject.id)
        .bind(&subject.name)
        .bind(&subject.code)
        .bind(&subject.name_normalized)
        .bind(&subject.description)
        .bind(subject.is_active)
        .bind(subject.created_at)
        .bind(subject.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Subject>> {
        let row = sqlx::query("SELECT * FROM subjects WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(row_to_subject).transpose()
    }

    /// Sparse update. A request carrying no fields at all skips the write
    /// entirely (not even `updated_at` moves). Returns None when the id
    /// matches nothing.
    pub async fn update(&self, request: &UpdateSubjectRequest) -> Result<Option<Subject>> {
        let Some(current) = self.get_by_id(&request.id).await? else {
            return Ok(None);
        };
        if request.is_empty() {
            return Ok(Some(current));
        }

        let is_active = request.is_active.unwrap_or(current.is_active);
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE subjects SET ");
        let mut sets = qb.separated(", ");
        if let Some(name) = &request.name {
            sets.push("name = ").push_bind_unseparated(name.clone());
            sets.push("name_normalized = ")
                .push_bind_unseparated(normalize_text(name));
        }
        if let Some(code) = &request.code {
            sets.push("code = ").push_bind_unseparated(code.clone());
        }
        if let Some(description) = &request.description {
            sets.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        sets.push("is_active = ").push_bind_unseparated(is_active);
        sets.push("updated_at = ")
            .push_bind_unseparated(chrono::Utc::now());
        qb.push(" WHERE id = ").push_bind(request.id.clone());
        qb.build().execute(self.db.pool()).await?;

        self.get_by_id(&request.id).await
    }

    pub async fn list(&self, filter: &SubjectListFilter) -> Result<(Vec<Subject>, i64)> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM subjects");
        push_filters(&mut qb, filter);
        qb.push(order_clause(
            filter.sort_field.as_deref(),
            filter.sort_order.as_deref(),
            SORT_FIELDS,
        ));
        if filter.limit > 0 {
            let page = filter.page.max(1);
            qb.push(" LIMIT ")
                .push_bind(filter.limit)
                .push(" OFFSET ")
                .push_bind((page - 1) * filter.limit);
        }
        let rows = qb.build().fetch_all(self.db.pool()).await?;
        let subjects = rows.iter().map(row_to_subject).collect::<Result<Vec<_>>>()?;

        let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM subjects");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build()
            .fetch_one(self.db.pool())
            .await?
            .try_get(0)?;

        Ok((subjects, total))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(qb: &mut QueryBuilder<Sqlite>, filter: &SubjectListFilter) {
    let mut prefix = " WHERE ";
    if let Some(keyword) = &filter.keyword {
        qb.push(prefix)
            .push("name_normalized LIKE ")
            .push_bind(format!("%{}%", normalize_text(keyword)));
        prefix = " AND ";
    }
    if let Some(is_active) = filter.is_active {
        qb.push(prefix).push("is_active = ").push_bind(is_active);
        prefix = " AND ";
    }
    let _ = prefix;
}

fn row_to_subject(row: &SqliteRow) -> Result<Subject> {
    Ok(Subject {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        code: row.try_get("code")?,
        name_normalized: row.try_get("name_normalized")?,
        description: row.try_get("description")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
