// src/services/session.rs
// DOCUMENTATION: Session state management
// PURPOSE: Sole owner of the persisted token and user record

use crate::errors::{ClientError, StorageError};
use crate::models::{Session, User};
use crate::store::{SessionStore, TOKEN_STORAGE_KEY, USER_STORAGE_KEY};
use std::sync::Arc;

/// Session accessor over a SessionStore
/// DOCUMENTATION: The token is the commit marker of a session. It is written
/// after the user record and removed before it, so a present token always
/// has a user record written alongside it.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Persist a fresh session
    /// DOCUMENTATION: On a storage failure both keys are rolled back
    /// so no half-written session survives
    pub async fn save(&self, session: &Session) -> Result<(), ClientError> {
        if session.token.trim().is_empty() {
            return Err(ClientError::Parse("auth response carried an empty token".to_string()));
        }

        let user_json = serde_json::to_string(&session.user)
            .map_err(|e| ClientError::Parse(format!("cannot serialize user: {}", e)))?;

        if let Err(e) = self.write(&user_json, &session.token).await {
            log::error!("Failed to persist session: {}", e);
            self.clear().await;
            return Err(e.into());
        }

        log::debug!("Session stored for user {}", session.user.id);
        Ok(())
    }

    /// Stored bearer token, if any
    pub async fn token(&self) -> Option<String> {
        self.read(TOKEN_STORAGE_KEY)
            .await
            .filter(|token| !token.trim().is_empty())
    }

    /// Stored user record
    /// DOCUMENTATION: Only readable while a token is stored; a user record
    /// without its token is a leftover of an interrupted save or clear.
    /// Missing or malformed data reads as None.
    pub async fn current_user(&self) -> Option<User> {
        self.token().await?;
        self.stored_user().await
    }

    /// Full session, only when both halves are present and readable
    pub async fn load(&self) -> Option<Session> {
        let token = self.token().await?;
        let user = self.stored_user().await?;
        Some(Session { token, user })
    }

    async fn stored_user(&self) -> Option<User> {
        let raw = self.read(USER_STORAGE_KEY).await?;
        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("Ignoring malformed stored user record: {}", e);
                None
            }
        }
    }

    /// True iff a token is stored
    pub async fn is_authenticated(&self) -> bool {
        self.token().await.is_some()
    }

    /// Drop the local session
    /// DOCUMENTATION: Never fails; storage errors are logged
    pub async fn clear(&self) {
        for key in [TOKEN_STORAGE_KEY, USER_STORAGE_KEY] {
            if let Err(e) = self.store.remove(key).await {
                log::error!("Failed to remove {} from session store: {}", key, e);
            }
        }
    }

    async fn write(&self, user_json: &str, token: &str) -> Result<(), StorageError> {
        self.store.set(USER_STORAGE_KEY, user_json).await?;
        self.store.set(TOKEN_STORAGE_KEY, token).await
    }

    async fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Session store read of {} failed: {}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn session() -> Session {
        Session {
            token: "abc".to_string(),
            user: User {
                id: "1".to_string(),
                name: "Kim".to_string(),
                email: "user@example.com".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(store.clone());

        assert!(!manager.is_authenticated().await);
        assert!(manager.load().await.is_none());

        manager.save(&session()).await.unwrap();
        assert!(manager.is_authenticated().await);
        assert_eq!(manager.load().await, Some(session()));
        assert_eq!(manager.current_user().await, Some(session().user));

        manager.clear().await;
        assert!(!manager.is_authenticated().await);
        assert!(manager.current_user().await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_user_reads_as_none() {
        let store = Arc::new(MemoryStore::new());
        store.set(USER_STORAGE_KEY, "{\"id\": ").await.unwrap();
        store.set(TOKEN_STORAGE_KEY, "abc").await.unwrap();

        let manager = SessionManager::new(store);
        assert!(manager.current_user().await.is_none());
        assert!(manager.load().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_token_is_not_a_session() {
        let store = Arc::new(MemoryStore::new());
        store.set(TOKEN_STORAGE_KEY, "").await.unwrap();
        assert!(!SessionManager::new(store).is_authenticated().await);
    }

    #[tokio::test]
    async fn test_user_without_token_is_not_a_session() {
        let store = Arc::new(MemoryStore::new());
        store
            .set(USER_STORAGE_KEY, r#"{"id":"1","name":"Kim","email":"user@example.com"}"#)
            .await
            .unwrap();

        let manager = SessionManager::new(store);
        assert!(!manager.is_authenticated().await);
        assert!(manager.current_user().await.is_none());
        assert!(manager.load().await.is_none());
    }

    #[tokio::test]
    async fn test_save_rejects_empty_token() {
        let store = Arc::new(MemoryStore::new());
        let manager = SessionManager::new(store.clone());

        let blank = Session {
            token: "  ".to_string(),
            ..session()
        };
        let err = manager.save(&blank).await.unwrap_err();
        assert!(matches!(err, ClientError::Parse(_)));

        assert!(store.is_empty().await);
        assert!(!manager.is_authenticated().await);
        assert!(manager.current_user().await.is_none());
    }

    /// Store whose token writes fail
    #[derive(Default)]
    struct FailingTokenStore {
        inner: MemoryStore,
        fail_reads: AtomicBool,
    }

    #[async_trait]
    impl SessionStore for FailingTokenStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StorageError::Corrupted("unreadable".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == TOKEN_STORAGE_KEY {
                return Err(StorageError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key).await
        }

        async fn clear(&self) -> Result<(), StorageError> {
            self.inner.clear().await
        }
    }

    #[tokio::test]
    async fn test_failed_save_rolls_back() {
        let store = Arc::new(FailingTokenStore::default());
        let manager = SessionManager::new(store.clone());

        let err = manager.save(&session()).await.unwrap_err();
        assert!(matches!(err, ClientError::Storage(_)));

        // the user record written first was removed again
        assert!(store.inner.is_empty().await);
        assert!(manager.current_user().await.is_none());
    }

    #[tokio::test]
    async fn test_read_failure_reads_as_no_session() {
        let store = Arc::new(FailingTokenStore::default());
        store.inner.set(TOKEN_STORAGE_KEY, "abc").await.unwrap();
        store.fail_reads.store(true, Ordering::SeqCst);

        let manager = SessionManager::new(store);
        assert!(!manager.is_authenticated().await);
        assert!(manager.current_user().await.is_none());
    }
}
