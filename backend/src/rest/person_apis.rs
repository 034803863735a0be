//! Handlers for the person graph endpoints.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::models::person::{
    CreatePersonRequest, FamilyInfo, Person, UpdatePersonRequest,
};
use crate::error::AppError;
use crate::ids::is_valid_object_id;
use crate::rest::{ApiResponse, AppState, IdQuery};

const DEFAULT_SEARCH_LIMIT: i64 = 20;

fn require_object_id(id: &str) -> Result<(), AppError> {
    if !is_valid_object_id(id) {
        return Err(AppError::Validation("Invalid ID format".to_string()));
    }
    Ok(())
}

pub async fn create_person(
    State(state): State<AppState>,
    Json(request): Json<CreatePersonRequest>,
) -> Result<Json<ApiResponse<Person>>, AppError> {
    info!("POST /api/persons - name: {}", request.name);
    let person = state.person_service.create(request).await?;
    Ok(Json(ApiResponse::success("Person created", person)))
}

pub async fn update_person(
    State(state): State<AppState>,
    Json(request): Json<UpdatePersonRequest>,
) -> Result<Json<ApiResponse<Person>>, AppError> {
    info!("PUT /api/persons - id: {}", request.id);
    require_object_id(&request.id)?;
    let person = state.person_service.update(request).await?;
    Ok(Json(ApiResponse::success("Person updated", person)))
}

pub async fn get_person(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<Person>>, AppError> {
    let id = query.require()?;
    info!("GET /api/persons - id: {}", id);
    require_object_id(&id)?;
    let person = state.person_service.get(&id).await?;
    Ok(Json(ApiResponse::success("Person found", person)))
}

#[derive(Debug, serde::Serialize)]
pub struct DeletedPerson {
    pub person_id: String,
}

pub async fn delete_person(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<DeletedPerson>>, AppError> {
    let id = query.require()?;
    info!("DELETE /api/persons - id: {}", id);
    require_object_id(&id)?;
    state.person_service.delete(&id).await?;
    Ok(Json(ApiResponse::success(
        "Person deleted",
        DeletedPerson { person_id: id },
    )))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub limit: Option<i64>,
}

pub async fn search_persons(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<Person>>>, AppError> {
    info!("GET /api/persons/search - query: {:?}", query);
    let keyword = query.keyword.unwrap_or_default();
    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1);
    let persons = state.person_service.search(&keyword, limit).await?;
    Ok(Json(ApiResponse::success("Search results", persons)))
}

pub async fn get_family_info(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<FamilyInfo>>, AppError> {
    let id = query.require()?;
    info!("GET /api/persons/family - id: {}", id);
    require_object_id(&id)?;
    let info = state.person_service.family_info(&id).await?;
    Ok(Json(ApiResponse::success("Family info", info)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::person::GENDER_MALE;
    use crate::rest::test_state;

    #[tokio::test]
    async fn create_then_get_round_trip() {
        let state = test_state().await;
        let request = CreatePersonRequest {
            name: "Nguyễn Văn A".to_string(),
            alias: None,
            gender: GENDER_MALE.to_string(),
            birth_date: None,
            birth_year_can_chi: None,
            death_date: None,
            death_year_can_chi: None,
            image_url: None,
            father_id: None,
            mother_id: None,
            spouse_ids: Vec::new(),
            children_ids: Vec::new(),
        };
        let created = create_person(State(state.clone()), Json(request))
            .await
            .unwrap();
        let id = created.0.data.as_ref().unwrap().id.clone();

        let fetched = get_person(State(state), Query(IdQuery { id: Some(id.clone()) }))
            .await
            .unwrap();
        assert_eq!(fetched.0.data.unwrap().id, id);
    }

    #[tokio::test]
    async fn malformed_id_is_rejected() {
        let state = test_state().await;
        let result = get_person(
            State(state),
            Query(IdQuery {
                id: Some("not-an-id".to_string()),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn missing_id_is_rejected() {
        let state = test_state().await;
        let result = delete_person(State(state), Query(IdQuery { id: None })).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
