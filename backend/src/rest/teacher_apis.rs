//! Handlers for teachers.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::domain::models::teacher::{CreateTeacherRequest, Teacher, UpdateTeacherRequest};
use crate::error::AppError;
use crate::ids::new_object_id;
use crate::rest::{ApiResponse, AppState, IdQuery, ListPage};
use crate::storage::teacher_repository::TeacherListFilter;
use crate::text::normalize_text;

#[derive(Debug, Deserialize)]
pub struct TeacherListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
    /// Comma-separated subject ids; teachers matching any are kept.
    pub subject_ids: Option<String>,
}

pub async fn create_teacher(
    State(state): State<AppState>,
    Json(request): Json<CreateTeacherRequest>,
) -> Result<Json<ApiResponse<Teacher>>, AppError> {
    info!("POST /api/teachers - name: {}", request.name);
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let now = Utc::now();
    let teacher = Teacher {
        id: new_object_id(),
        name_normalized: normalize_text(&request.name),
        name: request.name,
        email: request.email,
        phone: request.phone,
        date_of_birth: request.date_of_birth,
        address: request.address,
        subject_ids: request.subject_ids,
        avatar_url: request.avatar_url,
        is_active: request.is_active,
        created_at: now,
        updated_at: now,
    };
    state.teacher_repository.insert(&teacher).await?;
    Ok(Json(ApiResponse::success("Teacher created", teacher)))
}

pub async fn update_teacher(
    State(state): State<AppState>,
    Json(request): Json<UpdateTeacherRequest>,
) -> Result<Json<ApiResponse<Teacher>>, AppError> {
    info!("PUT /api/teachers - id: {}", request.id);
    let teacher = state
        .teacher_repository
        .update(&request)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".to_string()))?;
    Ok(Json(ApiResponse::success("Teacher updated", teacher)))
}

pub async fn get_teacher(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<Teacher>>, AppError> {
    let id = query.require()?;
    info!("GET /api/teachers/detail - id: {}", id);
    let teacher = state
        .teacher_repository
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Teacher not found".to_string()))?;
    Ok(Json(ApiResponse::success("Teacher found", teacher)))
}

pub async fn list_teachers(
    State(state): State<AppState>,
    Query(query): Query<TeacherListQuery>,
) -> Result<Json<ApiResponse<ListPage<Teacher>>>, AppError> {
    info!("GET /api/teachers - query: {:?}", query);
    let subject_ids = query
        .subject_ids
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    let filter = TeacherListFilter {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(0),
        sort_field: query.sort_field,
        sort_order: query.sort_order,
        keyword: query.keyword,
        is_active: query.is_active,
        subject_ids,
    };
    let (items, total) = state.teacher_repository.list(&filter).await?;
    Ok(Json(ApiResponse::success(
        "Teachers",
        ListPage { items, total },
    )))
}

pub async fn delete_teacher(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = query.require()?;
    info!("DELETE /api/teachers - id: {}", id);
    if !state.teacher_repository.delete(&id).await? {
        return Err(AppError::NotFound("Teacher not found".to_string()));
    }
    Ok(Json(ApiResponse::success("Teacher deleted", ())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::test_state;

    fn create_request(name: &str, subject_ids: Vec<String>) -> CreateTeacherRequest {
        CreateTeacherRequest {
            name: name.to_string(),
            email: None,
            phone: None,
            date_of_birth: None,
            address: None,
            subject_ids,
            avatar_url: None,
            is_active: true,
        }
    }

    fn list_query(subject_ids: Option<&str>) -> TeacherListQuery {
        TeacherListQuery {
            page: None,
            limit: None,
            sort_field: None,
            sort_order: None,
            keyword: None,
            is_active: None,
            subject_ids: subject_ids.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn list_filters_by_subject_membership() {
        let state = test_state().await;
        create_teacher(
            State(state.clone()),
            Json(create_request("Cô Toán", vec!["math".to_string()])),
        )
        .await
        .unwrap();
        create_teacher(
            State(state.clone()),
            Json(create_request("Thầy Văn", vec!["literature".to_string()])),
        )
        .await
        .unwrap();

        let page = list_teachers(State(state), Query(list_query(Some("math,physics"))))
            .await
            .unwrap();
        let page = page.0.data.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Cô Toán");
    }

    #[tokio::test]
    async fn update_replaces_subject_list_wholesale() {
        let state = test_state().await;
        let created = create_teacher(
            State(state.clone()),
            Json(create_request("Cô Lý", vec!["physics".to_string()])),
        )
        .await
        .unwrap();
        let teacher = created.0.data.unwrap();

        let updated = update_teacher(
            State(state),
            Json(UpdateTeacherRequest {
                id: teacher.id.clone(),
                subject_ids: Some(vec!["chemistry".to_string()]),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            updated.0.data.unwrap().subject_ids,
            vec!["chemistry".to_string()]
        );
    }
}
