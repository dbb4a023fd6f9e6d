//! In-memory credential store.
//!
//! Backs the test suite and ephemeral single-process deployments. All state
//! lives behind one lock so account and token maps can never diverge.

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use staffdesk_core::error::AppError;
use staffdesk_core::result::AppResult;
use staffdesk_entity::token::RefreshTokenRecord;
use staffdesk_entity::user::User;

use crate::password::PasswordHasher;

use super::{CredentialStore, NewUser};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    by_email: HashMap<String, Uuid>,
    token_owner: HashMap<String, Uuid>,
    current_token: HashMap<Uuid, RefreshTokenRecord>,
}

/// Credential store keeping every record in process memory.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    hasher: PasswordHasher,
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> AppError {
        AppError::internal("Credential store lock poisoned")
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn verify_password(&self, email: &str, password: &str) -> AppResult<bool> {
        let hash = {
            let inner = self.inner.read().map_err(|_| Self::poisoned())?;
            inner
                .by_email
                .get(&email.to_lowercase())
                .and_then(|id| inner.users.get(id))
                .map(|u| u.password_hash.clone())
        };

        match hash {
            Some(hash) => self.hasher.verify(password, &hash),
            None => Ok(false),
        }
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner
            .by_email
            .get(&email.to_lowercase())
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn create_user(&self, new_user: NewUser) -> AppResult<User> {
        let password_hash = self.hasher.hash(&new_user.password)?;

        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        let key = new_user.email.to_lowercase();

        if inner.by_email.contains_key(&key) {
            let mut fields = BTreeMap::new();
            fields.insert(
                "email".to_string(),
                vec!["An account with this email already exists".to_string()],
            );
            return Err(AppError::validation_fields(fields));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email.clone(),
            username: new_user.email,
            employee_id: new_user.employee_id,
            password_hash,
            role_names: vec!["employee".to_string()],
            created_at: Utc::now(),
            last_login_at: None,
        };

        inner.by_email.insert(key, user.id);
        inner.users.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_by_refresh_token(&self, token: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner
            .token_owner
            .get(token)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }

    async fn store_refresh_token(&self, user_id: Uuid, token: &str) -> AppResult<()> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;

        if !inner.users.contains_key(&user_id) {
            return Err(AppError::not_found("Account not found"));
        }

        let record = RefreshTokenRecord {
            user_id,
            token: token.to_string(),
            issued_at: Utc::now(),
        };

        if let Some(previous) = inner.current_token.insert(user_id, record) {
            inner.token_owner.remove(&previous.token);
        }
        inner.token_owner.insert(token.to_string(), user_id);

        Ok(())
    }

    async fn current_refresh_token(&self, user_id: Uuid) -> AppResult<Option<RefreshTokenRecord>> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner.current_token.get(&user_id).cloned())
    }

    async fn touch_last_login(&self, user_id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }
}
