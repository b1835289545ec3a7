//! Core logic for the user record store.
//! This crate owns the create-if-absent contract and its storage backend.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, LogLevel, LoggingError};
pub use model::record::{Fields, KeyValidationError, Record, RecordKey};
pub use repo::record_repo::{BackendError, BackendResult, RecordBackend, SqliteRecordBackend};
pub use service::record_store::{RecordStore, StoreError, StoreResult};
pub use service::user_service::{NewUser, User, UserService, UserServiceError};
