use anyhow::Result;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::domain::models::schedule::{Schedule, UpdateScheduleRequest};
use crate::storage::db::DbConnection;
use crate::storage::order_clause;

const SORT_FIELDS: &[&str] = &["academic_year", "semester", "week", "created_at", "updated_at"];

#[derive(Debug, Clone, Default)]
pub struct ScheduleListFilter {
    pub page: i64,
    pub limit: i64,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub classroom_id: Option<String>,
    pub academic_year: Option<String>,
    pub semester: Option<i64>,
    pub week: Option<i64>,
}

#[derive(Clone)]
pub struct ScheduleRepository {
    db: DbConnection,
}

impl ScheduleRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, schedule: &Schedule) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO schedules (id, classroom_id, academic_year, semester, week,
                                   days, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&schedule.id)
        .bind(&schedule.classroom_id)
        .bind(&schedule.academic_year)
        .bind(schedule.semester)
        .bind(schedule.week)
        .bind(serde_json::to_string(&schedule.days)?)
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<Schedule>> {
        let row = sqlx::query("SELECT * FROM schedules WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(row_to_schedule).transpose()
    }

    /// One schedule per (classroom, academic year, semester, week) slot.
    pub async fn find_by_classroom_week(
        &self,
        classroom_id: &str,
        academic_year: &str,
        semester: i64,
        week: i64,
    ) -> Result<Option<Schedule>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM schedules
            WHERE classroom_id = ? AND academic_year = ? AND semester = ? AND week = ?
            "#,
        )
        .bind(classroom_id)
        .bind(academic_year)
        .bind(semester)
        .bind(week)
        .fetch_optional(self.db.pool())
        .await?;
        row.as_ref().map(row_to_schedule).transpose()
    }

    /// Sparse update. The caller rejects empty requests before reaching here,
    /// so `updated_at` always moves. Returns None when the id matches nothing.
    pub async fn update(&self, request: &UpdateScheduleRequest) -> Result<Option<Schedule>> {
        let Some(_current) = self.get_by_id(&request.id).await? else {
            return Ok(None);
        };

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE schedules SET ");
        let mut sets = qb.separated(", ");
        if let Some(classroom_id) = &request.classroom_id {
            sets.push("classroom_id = ")
                .push_bind_unseparated(classroom_id.clone());
        }
        if let Some(academic_year) = &request.academic_year {
            sets.push("academic_year = ")
                .push_bind_unseparated(academic_year.clone());
        }
        if let Some(semester) = request.semester {
            sets.push("semester = ").push_bind_unseparated(semester);
        }
        if let Some(week) = request.week {
            sets.push("week = ").push_bind_unseparated(week);
        }
        if let Some(days) = &request.days {
            sets.push("days = ")
                .push_bind_unseparated(serde_json::to_string(days)?);
        }
        sets.push("updated_at = ").push_bind_unseparated(Utc::now());
        qb.push(" WHERE id = ").push_bind(request.id.clone());
        qb.build().execute(self.db.pool()).await?;

        self.get_by_id(&request.id).await
    }

    pub async fn list(&self, filter: &ScheduleListFilter) -> Result<(Vec<Schedule>, i64)> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM schedules");
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
        let schedules = rows
            .iter()
            .map(row_to_schedule)
            .collect::<Result<Vec<_>>>()?;

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM schedules");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build()
            .fetch_one(self.db.pool())
            .await?
            .try_get(0)?;

        Ok((schedules, total))
    }

    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_filters(qb: &mut QueryBuilder<Sqlite>, filter: &ScheduleListFilter) {
    let mut prefix = " WHERE ";
    if let Some(classroom_id) = &filter.classroom_id {
        qb.push(prefix)
            .push("classroom_id = ")
            .push_bind(classroom_id.clone());
        prefix = " AND ";
    }
    if let Some(academic_year) = &filter.academic_year {
        qb.push(prefix)
            .push("academic_year = ")
            .push_bind(academic_year.clone());
        prefix = " AND ";
    }
    if let Some(semester) = filter.semester {
        qb.push(prefix).push("semester = ").push_bind(semester);
        prefix = " AND ";
    }
    if let Some(week) = filter.week {
        qb.push(prefix).push("week = ").push_bind(week);
        prefix = " AND ";
    }
    let _ = prefix;
}

fn row_to_schedule(row: &SqliteRow) -> Result<Schedule> {
    let days: String = row.try_get("days")?;
    Ok(Schedule {
        id: row.try_get("id")?,
        classroom_id: row.try_get("classroom_id")?,
        academic_year: row.try_get("academic_year")?,
        semester: row.try_get("semester")?,
        week: row.try_get("week")?,
        days: serde_json::from_str(&days)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
