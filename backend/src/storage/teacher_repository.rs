use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::domain::models::teacher::{Teacher, UpdateTeacherRequest};
use crate::storage::db::DbConnection;
use crate::storage::order_clause;
use crate::text::normalize_text;

const SORT_FIELDS: &[&str] = &["name", "email", "created_at", "updated_at"];

#[derive(Debug, Clone, Default)]
pub struct TeacherListFilter {
    pub page: i64,
    pub limit: i64,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
    /// Keep teachers that can teach at least one of these subjects.
    pub subject_ids: Vec<String>,
}

#[derive(Clone)]
pub struct TeacherRepository {
    db: DbConnection,
}

impl TeacherRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, teacher: &Teacher) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO teachers (id, name, name_normalized, email, phone, date_of_birth,
                                  address, subject_ids, avatar_url, is_active,
                                  created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&teacher.id)
        .bind(&teacher.name)
        .bind(&teacher.name_normalized)
        .bind(&teacher.email)
        .bind(&teacher.phone)
        .bind(teacher.date_of_birth)
        .bind(&teacher.address)
        .bind(serde_json::to_string(&teacher.subject_ids)?)
        .bind(&teacher.avatar_url)
        .bind(teacher.is_active)
        .bind(teacher.created_at)
        .bind(teacher.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Teacher>> {
        let row = sqlx::query("SELECT * FROM teachers WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(row_to_teacher).transpose()
    }

    /// Sparse update; `is_active` and `updated_at` are written even when the
    /// request carries nothing else. Returns None when the id matches nothing.
    pub async fn update(&self, request: &UpdateTeacherRequest) -> Result<Option<Teacher>> {
        let Some(current) = self.get_by_id(&request.id).await? else {
            return Ok(None);
        };

        let is_active = request.is_active.unwrap_or(current.is_active);
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE teachers SET ");
        let mut sets = qb.separated(", ");
        if let Some(name) = &request.name {
            sets.push("name = ").push_bind_unseparated(name.clone());
            sets.push("name_normalized = ")
                .push_bind_unseparated(normalize_text(name));
        }
        if let Some(email) = &request.email {
            sets.push("email = ").push_bind_unseparated(email.clone());
        }
        if let Some(phone) = &request.phone {
            sets.push("phone = ").push_bind_unseparated(phone.clone());
        }
        if let Some(date_of_birth) = request.date_of_birth {
            sets.push("date_of_birth = ")
                .push_bind_unseparated(date_of_birth);
        }
        if let Some(address) = &request.address {
            sets.push("address = ")
                .push_bind_unseparated(address.clone());
        }
        if let Some(subject_ids) = &request.subject_ids {
            sets.push("subject_ids = ")
                .push_bind_unseparated(serde_json::to_string(subject_ids)?);
        }
        if let Some(avatar_url) = &request.avatar_url {
            sets.push("avatar_url = ")
                .push_bind_unseparated(avatar_url.clone());
        }
        sets.push("is_active = ").push_bind_unseparated(is_active);
        sets.push("updated_at = ").push_bind_unseparated(Utc::now());
        qb.push(" WHERE id = ").push_bind(request.id.clone());
        qb.build().execute(self.db.pool()).await?;

        self.get_by_id(&request.id).await
    }

    pub async fn list(&self, filter: &TeacherListFilter) -> Result<(Vec<Teacher>, i64)> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM teachers");
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
        let teachers = rows.iter().map(row_to_teacher).collect::<Result<Vec<_>>>()?;

        let mut count_qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM teachers");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build()
            .fetch_one(self.db.pool())
            .await?
            .try_get(0)?;

        Ok((teachers, total))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM teachers WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(qb: &mut QueryBuilder<Sqlite>, filter: &TeacherListFilter) {
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
    if !filter.subject_ids.is_empty() {
        // subject_ids is a JSON array column; match any overlap.
        qb.push(prefix)
            .push("EXISTS (SELECT 1 FROM json_each(teachers.subject_ids) WHERE json_each.value IN (");
        let mut vals = qb.separated(", ");
        for subject_id in &filter.subject_ids {
            vals.push_bind(subject_id.clone());
        }
        qb.push("))");
        prefix = " AND ";
    }
    let _ = prefix;
}

fn row_to_teacher(row: &SqliteRow) -> Result<Teacher> {
    let subject_ids: String = row.try_get("subject_ids")?;
    Ok(Teacher {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        name_normalized: row.try_get("name_normalized")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        date_of_birth: row.try_get("date_of_birth")?,
        address: row.try_get("address")?,
        subject_ids: serde_json::from_str(&subject_ids)?,
        avatar_url: row.try_get("avatar_url")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
