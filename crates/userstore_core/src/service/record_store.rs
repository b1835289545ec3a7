//! Create-if-absent record store.
//!
//! # Responsibility
//! - Validate keys and map backend outcomes onto `StoreError`.
//! - Expose `create_if_absent` and `get` to transport collaborators.
//!
//! # Invariants
//! - Creation is delegated to exactly one `set_if_absent` call; the store
//!   never reads before writing.
//! - The store holds no locks and no cache; the backend is the only shared
//!   state.
//! - Errors are returned to the caller, never logged or swallowed here.

use crate::model::record::{Fields, Record, RecordKey};
use crate::repo::record_repo::{BackendError, RecordBackend};
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure modes of record store operations.
#[derive(Debug)]
pub enum StoreError {
    /// Key is empty or missing. Caller error.
    InvalidKey,
    /// A record already exists for the key. Caller error.
    AlreadyExists(RecordKey),
    /// No record exists for the key. Caller error.
    NotFound(RecordKey),
    /// The backend failed; the caller may retry with backoff.
    StorageFailure(BackendError),
}

impl StoreError {
    /// Whether retrying the same call could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageFailure(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey => write!(f, "record key must be provided"),
            Self::AlreadyExists(key) => write!(f, "record already exists: {key}"),
            Self::NotFound(key) => write!(f, "record not found: {key}"),
            Self::StorageFailure(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageFailure(err) => Some(err),
            Self::InvalidKey | Self::AlreadyExists(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<BackendError> for StoreError {
    fn from(value: BackendError) -> Self {
        Self::StorageFailure(value)
    }
}

/// Record store over a backend providing atomic conditional writes.
pub struct RecordStore<B: RecordBackend> {
    backend: B,
}

impl<B: RecordBackend> RecordStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Stores `fields` under `key` if and only if no record exists for it.
    ///
    /// # Contract
    /// - Concurrent callers racing on one key see exactly one success.
    /// - On any error nothing is written.
    ///
    /// # Errors
    /// - `InvalidKey` for an empty or whitespace-only key.
    /// - `AlreadyExists` when the key is taken.
    /// - `StorageFailure` for backend errors.
    pub fn create_if_absent(&self, key: &str, fields: Fields) -> StoreResult<Record> {
        let key = RecordKey::parse(key).map_err(|_| StoreError::InvalidKey)?;

        if !self.backend.set_if_absent(&key, &fields)? {
            return Err(StoreError::AlreadyExists(key));
        }

        debug!(
            "event=record_create module=store status=ok field_count={}",
            fields.len()
        );
        Ok(Record::new(key, fields))
    }

    /// Returns the record stored under `key`.
    ///
    /// # Errors
    /// - `InvalidKey` for an empty or whitespace-only key.
    /// - `NotFound` when no record exists.
    /// - `StorageFailure` for backend errors.
    pub fn get(&self, key: &str) -> StoreResult<Record> {
        let key = RecordKey::parse(key).map_err(|_| StoreError::InvalidKey)?;

        match self.backend.get_all(&key)? {
            Some(fields) => {
                debug!(
                    "event=record_get module=store status=ok field_count={}",
                    fields.len()
                );
                Ok(Record::new(key, fields))
            }
            None => Err(StoreError::NotFound(key)),
        }
    }

    /// Returns the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
