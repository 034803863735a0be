//! Account management and login.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::auth::{hash_password, issue_token, verify_password};
use crate::config::Config;
use crate::domain::models::user::{
    CreateUserRequest, LoginRequest, LoginResponse, User, ROLE_ADMIN,
};
use crate::error::AppError;
use crate::storage::user_repository::UserRepository;

fn new_user_id() -> String {
    format!("user::{}", Utc::now().timestamp_millis())
}

#[derive(Clone)]
pub struct UserService {
    repository: UserRepository,
    config: Arc<Config>,
}

impl UserService {
    pub fn new(repository: UserRepository, config: Arc<Config>) -> Self {
        Self { repository, config }
    }

    pub async fn create(&self, request: CreateUserRequest) -> Result<User, AppError> {
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Err(AppError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        if self.repository.username_exists(&request.username).await? {
            return Err(AppError::Validation("Username already exists".to_string()));
        }

        let user = User {
            id: new_user_id(),
            username: request.username,
            password_hash: hash_password(&request.password)?,
            email: request.email,
            role: request.role,
            person_id: request.person_id,
            created_at: Utc::now(),
        };
        self.repository.insert(&user).await?;
        Ok(user)
    }

    /// Bad username and bad password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        let user = self
            .repository
            .find_by_username(&request.username)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash) {
            return Err(AppError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }

        let token = issue_token(
            &self.config.jwt_secret,
            &user.id,
            &user.role,
            user.person_id.clone(),
        )?;
        Ok(LoginResponse {
            id: user.id,
            role: user.role,
            person_id: user.person_id,
            token,
        })
    }

    pub async fn list(&self, role: Option<&str>) -> Result<Vec<User>, AppError> {
        Ok(self.repository.list_by_role(role).await?)
    }

    pub async fn update_person_link(&self, user_id: &str, person_id: &str) -> Result<(), AppError> {
        if !self.repository.update_person_id(user_id, person_id).await? {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        if new_password.is_empty() {
            return Err(AppError::Validation("New password is required".to_string()));
        }
        let user = self
            .repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !verify_password(old_password, &user.password_hash) {
            return Err(AppError::Unauthorized(
                "Old password is incorrect".to_string(),
            ));
        }

        let hash = hash_password(new_password)?;
        self.repository.update_password_hash(user_id, &hash).await?;
        Ok(())
    }

    /// Make sure the configured admin account exists. Safe to run on every
    /// startup.
    pub async fn seed_admin(&self) -> Result<(), AppError> {
        if self
            .repository
            .username_exists(&self.config.admin_username)
            .await?
        {
            return Ok(());
        }

        let user = User {
            id: new_user_id(),
            username: self.config.admin_username.clone(),
            password_hash: hash_password(&self.config.admin_password)?,
            email: None,
            role: ROLE_ADMIN.to_string(),
            person_id: None,
            created_at: Utc::now(),
        };
        self.repository.insert(&user).await?;
        info!("Seeded admin user '{}'", user.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::decode_token;
    use crate::domain::models::user::ROLE_MEMBER;
    use crate::storage::DbConnection;

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            port: 0,
            database_url: String::new(),
            jwt_secret: "test-secret".to_string(),
            admin_username: "admin".to_string(),
            admin_password: "admin123".to_string(),
        })
    }

    async fn service() -> UserService {
        let db = DbConnection::init_test().await.expect("init test db");
        UserService::new(UserRepository::new(db), test_config())
    }

    fn create_request(username: &str, password: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            password: password.to_string(),
            email: None,
            role: ROLE_MEMBER.to_string(),
            person_id: None,
        }
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let service = service().await;
        service.create(create_request("an", "pw123")).await.unwrap();
        let result = service.create(create_request("an", "other")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn login_issues_decodable_token() {
        let service = service().await;
        service
            .create(create_request("binh", "secret-pw"))
            .await
            .unwrap();

        let response = service
            .login(LoginRequest {
                username: "binh".to_string(),
                password: "secret-pw".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.role, ROLE_MEMBER);

        let claims = decode_token("test-secret", &response.token).unwrap();
        assert_eq!(claims.sub, response.id);
        assert_eq!(claims.role, ROLE_MEMBER);
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_unauthorized() {
        let service = service().await;
        service
            .create(create_request("chi", "right-pw"))
            .await
            .unwrap();

        let result = service
            .login(LoginRequest {
                username: "chi".to_string(),
                password: "wrong-pw".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));

        let result = service
            .login(LoginRequest {
                username: "nobody".to_string(),
                password: "right-pw".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn change_password_verifies_the_old_one() {
        let service = service().await;
        let user = service
            .create(create_request("dung", "old-pw"))
            .await
            .unwrap();

        let wrong = service.change_password(&user.id, "not-it", "new-pw").await;
        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));

        service
            .change_password(&user.id, "old-pw", "new-pw")
            .await
            .unwrap();
        service
            .login(LoginRequest {
                username: "dung".to_string(),
                password: "new-pw".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn seed_admin_is_idempotent() {
        let service = service().await;
        service.seed_admin().await.unwrap();
        service.seed_admin().await.unwrap();

        let admins = service.list(Some(ROLE_ADMIN)).await.unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].username, "admin");
    }
}
