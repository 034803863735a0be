//! Handlers for subjects.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::domain::models::subject::{CreateSubjectRequest, Subject, UpdateSubjectRequest};
use crate::error::AppError;
use crate::ids::new_object_id;
use crate::rest::{ApiResponse, AppState, IdQuery, ListPage};
use crate::storage::subject_repository::SubjectListFilter;
use crate::text::normalize_text;

#[derive(Debug, Deserialize)]
pub struct SubjectListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
    pub keyword: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn create_subject(
    State(state): State<AppState>,
    Json(request): Json<CreateSubjectRequest>,
) -> Result<Json<ApiResponse<Subject>>, AppError> {
    info!("POST /api/subjects - name: {}", request.name);
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }

    let now = Utc::now();
    let subject = Subject {
        id: new_object_id(),
        name_normalized: normalize_text(&request.name),
        name: request.name,
        code: request.code,
        description: request.description,
        is_active: request.is_active,
        created_at: now,
        updated_at: now,
    };
    state.subject_repository.insert(&subject).await?;
    Ok(Json(ApiResponse::success("Subject created", subject)))
}

pub async fn update_subject(
    State(state): State<AppState>,
    Json(request): Json<UpdateSubjectRequest>,
) -> Result<Json<ApiResponse<Subject>>, AppError> {
    info!("PUT /api/subjects - id: {}", request.id);
    let subject = state
        .subject_repository
        .update(&request)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;
    Ok(Json(ApiResponse::success("Subject updated", subject)))
}

pub async fn get_subject(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<Subject>>, AppError> {
    let id = query.require()?;
    info!("GET /api/subjects/detail - id: {}", id);
    let subject = state
        .subject_repository
        .get_by_id(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subject not found".to_string()))?;
    Ok(Json(ApiResponse::success("Subject found", subject)))
}

pub async fn list_subjects(
    State(state): State<AppState>,
    Query(query): Query<SubjectListQuery>,
) -> Result<Json<ApiResponse<ListPage<Subject>>>, AppError> {
    info!("GET /api/subjects - query: {:?}", query);
    let filter = SubjectListFilter {
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(0),
        sort_field: query.sort_field,
        sort_order: query.sort_order,
        keyword: query.keyword,
        is_active: query.is_active,
    };
    let (items, total) = state.subject_repository.list(&filter).await?;
    Ok(Json(ApiResponse::success(
        "Subjects",
        ListPage { items, total },
    )))
}

pub async fn delete_subject(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let id = query.require()?;
    info!("DELETE /api/subjects - id: {}", id);
    if !state.subject_repository.delete(&id).await? {
        return Err(AppError::NotFound("Subject not found".to_string()));
    }
    Ok(Json(ApiResponse::success("Subject deleted", ())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rest::test_state;

    fn create_request(name: &str) -> CreateSubjectRequest {
        CreateSubjectRequest {
            name: name.to_string(),
            code: None,
            description: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn empty_update_skips_the_write() {
        let state = test_state().await;
        let created = create_subject(State(state.clone()), Json(create_request("Toán")))
            .await
            .unwrap();
        let subject = created.0.data.unwrap();

        let updated = update_subject(
            State(state.clone()),
            Json(UpdateSubjectRequest {
                id: subject.id.clone(),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        // Nothing was supplied, so not even updated_at moved.
        assert_eq!(updated.0.data.unwrap().updated_at, subject.updated_at);
    }

    #[tokio::test]
    async fn keyword_list_is_accent_insensitive() {
        let state = test_state().await;
        create_subject(State(state.clone()), Json(create_request("Vật Lý")))
            .await
            .unwrap();
        create_subject(State(state.clone()), Json(create_request("Hóa Học")))
            .await
            .unwrap();

        let page = list_subjects(
            State(state),
            Query(SubjectListQuery {
                page: None,
                limit: None,
                sort_field: None,
                sort_order: None,
                keyword: Some("vat ly".to_string()),
                is_active: None,
            }),
        )
        .await
        .unwrap();
        let page = page.0.data.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Vật Lý");
    }
}
