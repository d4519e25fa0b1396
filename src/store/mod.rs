// src/store/mod.rs
// DOCUMENTATION: Session persistence abstraction
// PURPOSE: Key-value storage that the session manager persists into

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::errors::StorageError;
use async_trait::async_trait;

/// Key holding the bearer token string
pub const TOKEN_STORAGE_KEY: &str = "bapful_auth_token";

/// Key holding the JSON-serialized user record
pub const USER_STORAGE_KEY: &str = "bapful_auth_user";

/// Persistent string key-value store
/// DOCUMENTATION: Any backing store works as long as each call is atomic on its own.
/// No transactions are offered; the session manager orders its writes instead.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    async fn clear(&self) -> Result<(), StorageError>;
}
