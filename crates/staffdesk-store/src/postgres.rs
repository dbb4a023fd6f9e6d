//! PostgreSQL implementation of the credential store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use staffdesk_auth::password::PasswordHasher;
use staffdesk_auth::store::{CredentialStore, NewUser};
use staffdesk_core::error::{AppError, ErrorKind};
use staffdesk_core::result::AppResult;
use staffdesk_entity::token::RefreshTokenRecord;
use staffdesk_entity::user::User;

/// Credential store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
    hasher: PasswordHasher,
}

impl PgCredentialStore {
    /// Create a new store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            hasher: PasswordHasher::new(),
        }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn verify_password(&self, email: &str, password: &str) -> AppResult<bool> {
        let hash: Option<String> =
            sqlx::query_scalar("SELECT password_hash FROM users WHERE LOWER(email) = LOWER($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to load password hash", e)
                })?;

        match hash {
            Some(hash) => self.hasher.verify(password, &hash),
            None => Ok(false),
        }
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
            })
    }

    async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        let password_hash = self.hasher.hash(&new_user.password)?;
        let id = Uuid::new_v4();

        let created = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (id, email, username, employee_id, password_hash, role_names)
               VALUES ($1, $2, $3, $4, $5, $6)
               RETURNING *"#,
        )
        .bind(id)
        .bind(&new_user.email)
        .bind(&new_user.email)
        .bind(&new_user.employee_id)
        .bind(&password_hash)
        .bind(vec!["employee".to_string()])
        .fetch_one(&self.pool)
        .await;

        match created {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                let mut fields = BTreeMap::new();
                fields.insert(
                    "email".to_string(),
                    vec!["An account with this email already exists".to_string()],
                );
                Err(AppError::validation_fields(fields))
            }
            Err(e) => Err(AppError::with_source(
                ErrorKind::Database,
                "Failed to create user",
                e,
            )),
        }
    }

    async fn find_by_refresh_token(&self, token: &str) -> AppResult<Option<User>> {
        // Keyed lookup over the unique token index.
        sqlx::query_as::<_, User>(
            r#"SELECT u.* FROM users u
               JOIN refresh_tokens rt ON rt.user_id = u.id
               WHERE rt.token = $1"#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to resolve refresh token", e)
        })
    }

    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        sqlx::query(
            r#"INSERT INTO refresh_tokens (user_id, token, issued_at)
               VALUES ($1, $2, NOW())
               ON CONFLICT (user_id)
               DO UPDATE SET token = EXCLUDED.token, issued_at = EXCLUDED.issued_at"#,
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to store refresh token", e)
        })?;

        Ok(())
    }

    async fn current_refresh_token(&self, user_id: Uuid) -> AppResult<Option<RefreshTokenRecord>> {
        sqlx::query_as::<_, RefreshTokenRecord>(
            "SELECT user_id, token, issued_at FROM refresh_tokens WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load refresh token", e))
    }

    async fn touch_last_login(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to record login time", e)
            })?;

        Ok(())
    }
}
