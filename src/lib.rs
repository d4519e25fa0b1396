// src/lib.rs
// DOCUMENTATION: Bapful client library
// PURPOSE: Session-aware API client for the Bapful place-discovery backend

pub mod config;
pub mod errors;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use errors::{ClientError, StorageError};
pub use models::{Coordinates, Place, Session, User};
pub use services::{ApiClient, SessionManager};
pub use store::{FileStore, MemoryStore, SessionStore};
