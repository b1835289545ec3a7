//! User projection over the record store.
//!
//! # Responsibility
//! - Map user requests onto keyed records (`username` -> record key).
//! - Restrict persisted user attributes to `firstname` and `lastname`.
//!
//! # Invariants
//! - Only the named user fields are written; other request data is dropped.
//! - Absent optional attributes are omitted, not stored as empty strings.

use crate::model::record::{Fields, Record};
use crate::repo::record_repo::RecordBackend;
use crate::service::record_store::{RecordStore, StoreError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const FIELD_FIRSTNAME: &str = "firstname";
pub const FIELD_LASTNAME: &str = "lastname";

/// Request model for creating a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

/// Read model returned by user use-cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
}

impl From<Record> for User {
    fn from(mut record: Record) -> Self {
        Self {
            firstname: record.fields.remove(FIELD_FIRSTNAME),
            lastname: record.fields.remove(FIELD_LASTNAME),
            username: record.key.into_inner(),
        }
    }
}

/// User use-case error.
#[derive(Debug)]
pub enum UserServiceError {
    MissingUsername,
    AlreadyExists(String),
    NotFound(String),
    Store(StoreError),
}

impl Display for UserServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingUsername => write!(f, "wrong user parameters: username must be provided"),
            Self::AlreadyExists(username) => write!(f, "user already exists: {username}"),
            Self::NotFound(username) => write!(f, "user not found: {username}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for UserServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::MissingUsername | Self::AlreadyExists(_) | Self::NotFound(_) => None,
        }
    }
}

impl From<StoreError> for UserServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::InvalidKey => Self::MissingUsername,
            StoreError::AlreadyExists(key) => Self::AlreadyExists(key.into_inner()),
            StoreError::NotFound(key) => Self::NotFound(key.into_inner()),
            other @ StoreError::StorageFailure(_) => Self::Store(other),
        }
    }
}

/// Use-case service for user records.
pub struct UserService<B: RecordBackend> {
    store: RecordStore<B>,
}

impl<B: RecordBackend> UserService<B> {
    pub fn new(store: RecordStore<B>) -> Self {
        Self { store }
    }

    /// Creates a user once; a second create for the same username fails.
    pub fn create(&self, user: &NewUser) -> Result<User, UserServiceError> {
        let record = self
            .store
            .create_if_absent(user.username.as_str(), user_fields(user))?;
        Ok(User::from(record))
    }

    /// Gets one user by username.
    pub fn get(&self, username: &str) -> Result<User, UserServiceError> {
        let record = self.store.get(username)?;
        Ok(User::from(record))
    }

    pub fn store(&self) -> &RecordStore<B> {
        &self.store
    }
}

fn user_fields(user: &NewUser) -> Fields {
    let mut fields = Fields::new();
    if let Some(firstname) = &user.firstname {
        fields.insert(FIELD_FIRSTNAME.to_string(), firstname.clone());
    }
    if let Some(lastname) = &user.lastname {
        fields.insert(FIELD_LASTNAME.to_string(), lastname.clone());
    }
    fields
}
