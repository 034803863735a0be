//! Handlers for weekly schedules.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::domain::models::schedule::{
    CreateScheduleRequest, Schedule, UpdateScheduleRequest,
};
use crate::error::AppError;
use crate::ids::new_object_id;
use crate::rest::{ApiResponse, AppState, IdQuery, ListPage};
use crate::storage::schedule_repository::ScheduleListFilter;

#[derive(Debug, Deserialize)]
pub struct ScheduleListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub classroom_id: Option<String>,
    pub academic_year: Option<String>,
    pub semester: Option<i64>,
    pub week: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleWeekQuery {
    pub classroom_id: Option<String>,
    pub academic_year: Option<String>,
    pub semester: Option<i64>,
    pub week: Option<i64>,
}

pub async fn create_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Json<ApiResponse<Schedule>>, AppError> {
    info!(
        "POST /api/schedules - classroom: {}, {} S{} W{}",
        request.classroom_id, request.academic_year, request.semester, request.week
    );
    if request.classroom_id.trim().is_empty() {
        return Err(AppError::Validation("Classroom id is required".to_string()));
    }

    let now = Utc::now();
    let schedule = Schedule {
        id: new_object_id(),
        classroom_id: request.classroom_id,
        academic_year: request.academic_year,
        semester: request.semester,
        week: request.week,
        days: request.days,
        created_at: now,
        updated_at: now,
    };
    state.schedule_repository.insert(&schedule).await?;
    Ok(Json(ApiResponse::success("Schedule created", schedule)))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    Json(request): Json<UpdateScheduleRequest>,
) -> Result<Json<ApiResponse<Schedule>>, AppError> {
    info!("PUT /api/schedules - id: {}", request.id);
    if request.is_empty() {
        return Err(AppError::Validation("No data to update".to_string()));
    }
    let schedule = state
        .schedule_repository
        .update(&request)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;
    Ok(Json(ApiResponse::success("Schedule updated", schedule)))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<Schedule>>, AppError> {
    let id = query.require()?;
    info!("GET /api/schedules/detail - id: {}", id);
    let schedule = state
        .schedule_repository
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;
    Ok(Json(ApiResponse::success("Schedule found", schedule)))
}

pub async fn get_schedule_by_week(
    State(state): State<AppState>,
    Query(query): Query<ScheduleWeekQuery>,
) -> Result<Json<ApiResponse<Schedule>>, AppError> {
    info!("GET /api/schedules/by-week - query: {:?}", query);
    let (Some(classroom_id), Some(academic_year), Some(semester), Some(week)) = (
        query.classroom_id,
        query.academic_year,
        query.semester,
        query.week,
    ) else {
        return Err(AppError::Validation(
            "classroom_id, academic_year, semester and week are required".to_string(),
        ));
    };

    let schedule = state
        .schedule_repository
        .find_by_classroom_week(&classroom_id, &academic_year, semester, week)
        .await?
        .ok_or_else(|| AppError::NotFound("Schedule not found".to_string()))?;
    Ok(Json(ApiResponse::success("Schedule found", schedule)))
}

pub async fn list_schedules(
    State(state): State<AppState>,
    Query(query): Query<ScheduleListQuery>,
) -> Result<Json<ApiResponse<ListPage<Schedule>>>, AppError> {
    info!("GET /api/schedules - query: {:?}", query);
    let filter = ScheduleListFilter {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(0),
        sort_field: query.sort_field,
        sort_order: query.sort_order,
        classroom_id: query.classroom_id,
        academic_year: query.academic_year,
        semester: query.semester,
        week: query.week,
    };
    let (items, total) = state.schedule_repository.list(&filter).await?;
    Ok(Json(ApiResponse::success(
        "Schedules",
        ListPage { items, total },
    )))
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = query.require()?;
    info!("DELETE /api/schedules - id: {}", id);
    if !state.schedule_repository.delete(&id).await? {
        return Err(AppError::NotFound("Schedule not found".to_string()));
    }
    Ok(Json(ApiResponse::success("Schedule deleted", ())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::schedule::{ScheduleDay, SchedulePeriod};
    use crate::rest::test_state;

    fn create_request(classroom_id: &str, week: i64) -> CreateScheduleRequest {
        CreateScheduleRequest {
            classroom_id: classroom_id.to_string(),
            academic_year: "2024-2025".to_string(),
            semester: 1,
            week,
            days: vec![ScheduleDay {
                day_of_week: 1,
                morning: vec![SchedulePeriod {
                    period: 1,
                    subject_id: "math".to_string(),
                    teacher_id: "t1".to_string(),
                    classroom_id: None,
                    start_time: None,
                    end_time: None,
                    note: None,
                    is_active: true,
                }],
                afternoon: Vec::new(),
            }],
        }
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let state = test_state().await;
        let created = create_schedule(State(state.clone()), Json(create_request("c1", 1)))
            .await
            .unwrap();
        let schedule = created.0.data.unwrap();

        let result = update_schedule(
            State(state),
            Json(UpdateScheduleRequest {
                id: schedule.id,
                ..Default::default()
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn by_week_finds_the_exact_slot() {
        let state = test_state().await;
        create_schedule(State(state.clone()), Json(create_request("c1", 1)))
            .await
            .unwrap();
        create_schedule(State(state.clone()), Json(create_request("c1", 2)))
            .await
            .unwrap();

        let found = get_schedule_by_week(
            State(state),
            Query(ScheduleWeekQuery {
                classroom_id: Some("c1".to_string()),
                academic_year: Some("2024-2025".to_string()),
                semester: Some(1),
                week: Some(2),
            }),
        )
        .await
        .unwrap();
        let schedule = found.0.data.unwrap();
        assert_eq!(schedule.week, 2);
        assert_eq!(schedule.days.len(), 1);
    }

    #[tokio::test]
    async fn days_grid_round_trips_through_storage() {
        let state = test_state().await;
        let created = create_schedule(State(state.clone()), Json(create_request("c1", 1)))
            .await
            .unwrap();
        let schedule = created.0.data.unwrap();

        let fetched = get_schedule(
            State(state),
            Query(IdQuery {
                id: Some(schedule.id.clone()),
            }),
        )
        .await
        .unwrap();
        let stored = fetched.0.data.unwrap();
        assert_eq!(stored.days, schedule.days);
        assert_eq!(stored.days[0].morning[0].subject_id, "math");
    }
}
