//! Durable storage for the client session document.

use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::warn;

use staffdesk_core::error::AppError;
use staffdesk_core::result::AppResult;

use crate::session::StoredSession;

/// Persistence for the agent's single session slot.
///
/// The whole session is read and written as one document, so `clear`
/// removes every field or none.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Loads the stored session, if one exists.
    async fn load(&self) -> AppResult<Option<StoredSession>>;

    /// Replaces the stored session.
    async fn store(&self, session: &StoredSession) -> AppResult<()>;

    /// Removes the stored session. Clearing an empty slot is a no-op.
    async fn clear(&self) -> AppResult<()>;
}

/// Session storage backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    /// Creates storage over the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStorage for FileSessionStorage {
    async fn load(&self) -> AppResult<Option<StoredSession>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::with_source(
                    staffdesk_core::error::ErrorKind::Internal,
                    format!("Failed to read session file: {e}"),
                    e,
                ));
            }
        };

        match serde_json::from_str(&contents) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // An unreadable session document is treated as absent.
                warn!(path = %self.path.display(), error = %e, "Discarding corrupt session file");
                Ok(None)
            }
        }
    }

    async fn store(&self, session: &StoredSession) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let contents = serde_json::to_string_pretty(session)?;
        tokio::fs::write(&self.path, contents).await?;

        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                staffdesk_core::error::ErrorKind::Internal,
                format!("Failed to clear session file: {e}"),
                e,
            )),
        }
    }
}

/// Session storage kept in process memory.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    inner: RwLock<Option<StoredSession>>,
}

impl MemorySessionStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStorage for MemorySessionStorage {
    async fn load(&self) -> AppResult<Option<StoredSession>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| AppError::internal("Session storage lock poisoned"))?;
        Ok(inner.clone())
    }

    async fn store(&self, session: &StoredSession) -> AppResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| AppError::internal("Session storage lock poisoned"))?;
        *inner = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> AppResult<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| AppError::internal("Session storage lock poisoned"))?;
        *inner = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_session() -> StoredSession {
        StoredSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: Utc::now(),
            user: None,
        }
    }

    #[tokio::test]
    async fn file_storage_roundtrip_and_idempotent_clear() {
        let path = std::env::temp_dir().join(format!("staffdesk-session-{}.json", std::process::id()));
        let storage = FileSessionStorage::new(&path);

        assert!(storage.load().await.unwrap().is_none());

        storage.store(&sample_session()).await.unwrap();
        let loaded = storage.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "access");

        storage.clear().await.unwrap();
        assert!(storage.load().await.unwrap().is_none());

        // Clearing an already-empty slot is a no-op.
        storage.clear().await.unwrap();
    }

    #[tokio::test]
    async fn memory_storage_clear_is_idempotent() {
        let storage = MemorySessionStorage::new();
        storage.store(&sample_session()).await.unwrap();

        storage.clear().await.unwrap();
        storage.clear().await.unwrap();
        assert!(storage.load().await.unwrap().is_none());
    }
}
