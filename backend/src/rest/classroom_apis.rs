//! Handlers for classrooms.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::domain::models::classroom::{
    Classroom, CreateClassroomRequest, UpdateClassroomRequest,
};
use crate::error::AppError;
use crate::ids::new_object_id;
use crate::rest::{ApiResponse, AppState, IdQuery, ListPage};
use crate::storage::classroom_repository::ClassroomListFilter;
use crate::text::normalize_text;

#[derive(Debug, Deserialize)]
pub struct ClassroomListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
    pub school_year: Option<String>,
}

pub async fn create_classroom(
    State(state): State<AppState>,
    Json(request): Json<CreateClassroomRequest>,
) -> Result<Json<ApiResponse<Classroom>>, AppError> {
    info!("POST /api/classrooms - name: {}", request.name);
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let now = Utc::now();
    let classroom = Classroom {
        id: new_object_id(),
        name_normalized: normalize_text(&request.name),
        name: request.name,
        grade: request.grade,
        description: request.description,
        school_year: request.school_year,
        is_active: request.is_active,
        created_at: now,
        updated_at: now,
    };
    state.classroom_repository.insert(&classroom).await?;
    Ok(Json(ApiResponse::success("Classroom created", classroom)))
}

pub async fn update_classroom(
    State(state): State<AppState>,
    Json(request): Json<UpdateClassroomRequest>,
) -> Result<Json<ApiResponse<Classroom>>, AppError> {
    info!("PUT /api/classrooms - id: {}", request.id);
    let classroom = state
        .classroom_repository
        .update(&request)
        .await?
        .ok_or_else(|| AppError::NotFound("Classroom not found".to_string()))?;
    Ok(Json(ApiResponse::success("Classroom updated", classroom)))
}

pub async fn get_classroom(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<Classroom>>, AppError> {
    let id = query.require()?;
    info!("GET /api/classrooms/detail - id: {}", id);
    let classroom = state
        .classroom_repository
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Classroom not found".to_string()))?;
    Ok(Json(ApiResponse::success("Classroom found", classroom)))
}

pub async fn list_classrooms(
    State(state): State<AppState>,
    Query(query): Query<ClassroomListQuery>,
) -> Result<Json<ApiResponse<ListPage<Classroom>>>, AppError> {
    info!("GET /api/classrooms - query: {:?}", query);
    let filter = ClassroomListFilter {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(0),
        sort_field: query.sort_field,
        sort_order: query.sort_order,
        keyword: query.keyword,
        is_active: query.is_active,
        school_year: query.school_year,
    };
    let (items, total) = state.classroom_repository.list(&filter).await?;
    Ok(Json(ApiResponse::success(
        "Classrooms",
        ListPage { items, total },
    )))
}

pub async fn delete_classroom(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = query.require()?;
    info!("DELETE /api/classrooms - id: {}", id);
    if !state.classroom_repository.delete(&id).await? {
        return Err(AppError::NotFound("Classroom not found".to_string()));
    }
    Ok(Json(ApiResponse::success("Classroom deleted", ())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::test_state;

    fn create_request(name: &str, school_year: Option<&str>) -> CreateClassroomRequest {
        CreateClassroomRequest {
            name: name.to_string(),
            grade: Some(12),
            description: None,
            school_year: school_year.map(str::to_string),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn empty_update_still_bumps_updated_at() {
        let state = test_state().await;
        let created = create_classroom(
            State(state.clone()),
            Json(create_request("12A1", Some("2024-2025"))),
        )
        .await
        .unwrap();
        let classroom = created.0.data.unwrap();

        let updated = update_classroom(
            State(state),
            Json(UpdateClassroomRequest {
                id: classroom.id.clone(),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        let updated = updated.0.data.unwrap();
        assert!(updated.updated_at > classroom.updated_at);
        // is_active was rewritten to its stored value, not zeroed.
        assert!(updated.is_active);
    }

    #[tokio::test]
    async fn description_only_update_leaves_other_fields_alone() {
        let state = test_state().await;
        let created = create_classroom(
            State(state.clone()),
            Json(create_request("12A1", Some("2024-2025"))),
        )
        .await
        .unwrap();
        let classroom = created.0.data.unwrap();

        let updated = update_classroom(
            State(state),
            Json(UpdateClassroomRequest {
                id: classroom.id.clone(),
                description: Some("Phòng 204".to_string()),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        let updated = updated.0.data.unwrap();
        assert_eq!(updated.description.as_deref(), Some("Phòng 204"));
        assert_eq!(updated.name, classroom.name);
        assert_eq!(updated.grade, classroom.grade);
        assert_eq!(updated.school_year, classroom.school_year);
        assert!(updated.updated_at > classroom.updated_at);
        assert!(updated.is_active);
    }

    #[tokio::test]
    async fn list_filters_by_school_year() {
        let state = test_state().await;
        create_classroom(
            State(state.clone()),
            Json(create_request("12A1", Some("2024-2025"))),
        )
        .await
        .unwrap();
        create_classroom(
            State(state.clone()),
            Json(create_request("11B2", Some("2023-2024"))),
        )
        .await
        .unwrap();

        let page = list_classrooms(
            State(state),
            Query(ClassroomListQuery {
                page: None,
                limit: None,
                sort_field: None,
                sort_order: None,
                keyword: None,
                is_active: None,
                school_year: Some("2024-2025".to_string()),
            }),
        )
        .await
        .unwrap();
        let page = page.0.data.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "12A1");
    }
}
