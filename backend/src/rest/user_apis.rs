//! Login and account management handlers.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::domain::models::user::{CreateUserRequest, LoginRequest, LoginResponse, User};
use crate::error::AppError;
use crate::rest::{ApiResponse, AppState};

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    info!("POST /login - username: {}", request.username);
    let response = state.user_service.login(request).await?;
    Ok(Json(ApiResponse::success("Login successful", response)))
}

pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    info!("POST /api/users - username: {}", request.username);
    let user = state.user_service.create(request).await?;
    Ok(Json(ApiResponse::success("User created", user)))
}

#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    info!("GET /api/users - role: {:?}", query.role);
    let users = state.user_service.list(query.role.as_deref()).await?;
    Ok(Json(ApiResponse::success("Users", users)))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePersonLinkRequest {
    pub id: String,
    pub person_id: String,
}

pub async fn update_person_link(
    State(state): State<AppState>,
    Json(request): Json<UpdatePersonLinkRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    info!("PUT /api/users/person - id: {}", request.id);
    state
        .user_service
        .update_person_link(&request.id, &request.person_id)
        .await?;
    Ok(Json(ApiResponse::success("Person link updated", ())))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub id: String,
    pub old_password: String,
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    info!("PUT /api/users/password - id: {}", request.id);
    state
        .user_service
        .change_password(&request.id, &request.old_password, &request.new_password)
        .await?;
    Ok(Json(ApiResponse::success("Password changed", ())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::user::ROLE_MEMBER;
    use crate::rest::test_state;

    #[tokio::test]
    async fn create_then_login() {
        let state = test_state().await;
        create_user(
            State(state.clone()),
            Json(CreateUserRequest {
                username: "an".to_string(),
                password: "pw123".to_string(),
                email: None,
                role: ROLE_MEMBER.to_string(),
                person_id: None,
            }),
        )
        .await
        .unwrap();

        let response = login(
            State(state),
            Json(LoginRequest {
                username: "an".to_string(),
                password: "pw123".to_string(),
            }),
        )
        .await
        .unwrap();
        let data = response.0.data.unwrap();
        assert_eq!(data.role, ROLE_MEMBER);
        assert!(!data.token.is_empty());
    }

    #[tokio::test]
    async fn person_link_for_missing_user_is_not_found() {
        let state = test_state().await;
        let result = update_person_link(
            State(state),
            Json(UpdatePersonLinkRequest {
                id: "user::0".to_string(),
                person_id: "p1".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
