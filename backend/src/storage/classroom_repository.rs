use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::domain::models::classroom::{Classroom, UpdateClassroomRequest};
use crate::storage::db::DbConnection;
use crate::storage::order_clause;
use crate::text::normalize_text;

const SORT_FIELDS: &[&str] = &["name", "grade", "school_year", "created_at", "updated_at"];

#[derive(Debug, Clone, Default)]
pub struct ClassroomListFilter {
    pub page: i64,
    pub limit: i64,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
    pub school_year: Option<String>,
}

#[derive(Clone)]
pub struct ClassroomRepository {
    db: DbConnection,
}

impl ClassroomRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, classroom: &Classroom) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO classrooms (id, name, grade, description, school_year,
                                    name_normalized, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&classroom.id)
        .bind(&classroom.name)
        .bind(classroom.grade)
        .bind(&classroom.description)
        .bind(&classroom.school_year)
        .bind(&classroom.name_normalized)
        .bind(classroom.is_active)
        .bind(classroom.created_at)
        .bind(classroom.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Classroom>> {
        let row = sqlx::query("SELECT * FROM classrooms WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(row_to_classroom).transpose()
    }

    /// Sparse update; `is_active` and `updated_at` are written even when the
    /// request carries nothing else. Returns None when the id matches nothing.
    pub async fn update(&self, request: &UpdateClassroomRequest) -> Result<Option<Classroom>> {
        let Some(current) = self.get_by_id(&request.id).await? else {
            return Ok(None);
        };

        let is_active = request.is_active.unwrap_or(current.is_active);
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE classrooms SET ");
        let mut sets = qb.separated(", ");
        if let Some(name) = &request.name {
            sets.push("name = ").push_bind_unseparated(name.clone());
            sets.push("name_normalized = ")
                .push_bind_unseparated(normalize_text(name));
        }
        if let Some(grade) = request.grade {
            sets.push("grade = ").push_bind_unseparated(grade);
        }
        if let Some(description) = &request.description {
            sets.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(school_year) = &request.school_year {
            sets.push("school_year = ")
                .push_bind_unseparated(school_year.clone());
        }
        sets.push("is_active = ").push_bind_unseparated(is_active);
        sets.push("updated_at = ").push_bind_unseparated(Utc::now());
        qb.push(" WHERE id = ").push_bind(request.id.clone());
        qb.build().execute(self.db.pool()).await?;

        self.get_by_id(&request.id).await
    }

    pub async fn list(&self, filter: &ClassroomListFilter) -> Result<(Vec<Classroom>, i64)> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM classrooms");
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
        let classrooms = rows
            .iter()
            .map(row_to_classroom)
            .collect::<Result<Vec<_>>>()?;

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM classrooms");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build()
            .fetch_one(self.db.pool())
            .await?
            .try_get(0)?;

        Ok((classrooms, total))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM classrooms WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(qb: &mut QueryBuilder<Sqlite>, filter: &ClassroomListFilter) {
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
    if let Some(school_year) = &filter.school_year {
        qb.push(prefix)
            .push("school_year = ")
            .push_bind(school_year.clone());
        prefix = " AND ";
    }
    let _ = prefix;
}

fn row_to_classroom(row: &SqliteRow) -> Result<Classroom> {
    Ok(Classroom {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        grade: row.try_get("grade")?,
        description: row.try_get("description")?,
        school_year: row.try_get("school_year")?,
        name_normalized: row.try_get("name_normalized")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
