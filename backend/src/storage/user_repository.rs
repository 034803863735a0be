use anyhow::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::domain::models::user::User;
use crate::storage::db::DbConnection;

#[derive(Clone)]
pub struct UserRepository {
    db: DbConnection,
}

impl UserRepository {
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    pub async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, username, password_hash, email, role, person_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.role)
        .bind(&user.person_id)
        .bind(user.created_at)
        .execute(self.db.pool())
        .await?;
        Ok(())
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        row.as_ref().map(row_to_user).transpose()
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(self.db.pool())
            .await?;
        Ok(row.0 > 0)
    }

    /// List users, optionally restricted to one role.
    pub async fn list_by_role(&self, role: Option<&str>) -> Result<Vec<User>> {
        let rows = match role {
            Some(role) => {
                sqlx::query("SELECT * FROM users WHERE role = ? ORDER BY username")
                    .bind(role)
                    .fetch_all(self.db.pool())
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM users ORDER BY username")
                    .fetch_all(self.db.pool())
                    .await?
            }
        };
        rows.iter().map(row_to_user).collect()
    }

    pub async fn update_person_id(&self, id: &str, person_id: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET person_id = ? WHERE id = ?")
            .bind(person_id)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_password_hash(&self, id: &str, password_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        email: row.try_get("email")?,
        role: row.try_get("role")?,
        person_id: row.try_get("person_id")?,
        created_at: row.try_get("created_at")?,
    })
}
