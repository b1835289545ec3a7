//! Record domain model.
//!
//! # Responsibility
//! - Define the validated key type and the flat field map stored per key.
//!
//! # Invariants
//! - `RecordKey` can only be built through `RecordKey::parse`.
//! - Field maps are ordered by name so reads are deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Flat field name to field value mapping stored under one key.
pub type Fields = BTreeMap<String, String>;

/// Validated, non-empty record identifier (for example a username).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RecordKey(String);

/// Key validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValidationError {
    /// The key is empty or contains only whitespace.
    Empty,
}

impl Display for KeyValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "record key must not be empty"),
        }
    }
}

impl Error for KeyValidationError {}

impl RecordKey {
    /// Validates and wraps a raw key.
    ///
    /// The key is stored verbatim; surrounding whitespace is not trimmed, it
    /// only counts against emptiness.
    pub fn parse(raw: &str) -> Result<Self, KeyValidationError> {
        if raw.trim().is_empty() {
            return Err(KeyValidationError::Empty);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for RecordKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl<'de> Deserialize<'de> for RecordKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A stored record: its key plus the fields written at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: RecordKey,
    pub fields: Fields,
}

impl Record {
    pub fn new(key: RecordKey, fields: Fields) -> Self {
        Self { key, fields }
    }

    /// Returns one field value by name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::{KeyValidationError, Record, RecordKey};
    use std::collections::BTreeMap;

    #[test]
    fn parse_rejects_empty_and_blank_keys() {
        assert_eq!(RecordKey::parse(""), Err(KeyValidationError::Empty));
        assert_eq!(RecordKey::parse("  \t"), Err(KeyValidationError::Empty));
    }

    #[test]
    fn parse_keeps_key_verbatim() {
        let key = RecordKey::parse(" alice ").expect("padded key is still non-empty");
        assert_eq!(key.as_str(), " alice ");
    }

    #[test]
    fn field_lookup_returns_stored_value() {
        let mut fields = BTreeMap::new();
        fields.insert("firstname".to_string(), "Alice".to_string());
        let record = Record::new(RecordKey::parse("alice").unwrap(), fields);

        assert_eq!(record.field("firstname"), Some("Alice"));
        assert_eq!(record.field("lastname"), None);
    }
}
