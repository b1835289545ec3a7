//! Record backend contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the conditional-write and read primitives over `records` and
//!   `record_fields`.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - A key row and all of its field rows are written in one immediate
//!   transaction, or not at all.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::record::{Fields, RecordKey};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const REQUIRED_TABLES: &[&str] = &["records", "record_fields"];

pub type BackendResult<T> = Result<T, BackendError>;

/// Storage-level failure raised by a record backend.
#[derive(Debug)]
pub enum BackendError {
    Db(DbError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    InvalidData(String),
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for BackendError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Key-value engine primitives consumed by `RecordStore`.
pub trait RecordBackend {
    /// Stores `fields` under `key` only when `key` is absent.
    ///
    /// Returns `false` without writing anything when `key` already exists.
    fn set_if_absent(&self, key: &RecordKey, fields: &Fields) -> BackendResult<bool>;

    /// Returns every field stored under `key`, or `None` when it is absent.
    fn get_all(&self, key: &RecordKey) -> BackendResult<Option<Fields>>;
}

impl<B: RecordBackend + ?Sized> RecordBackend for &B {
    fn set_if_absent(&self, key: &RecordKey, fields: &Fields) -> BackendResult<bool> {
        (**self).set_if_absent(key, fields)
    }

    fn get_all(&self, key: &RecordKey) -> BackendResult<Option<Fields>> {
        (**self).get_all(key)
    }
}

/// SQLite-backed record backend over one borrowed connection.
pub struct SqliteRecordBackend<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRecordBackend<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations were not applied.
    /// - `MissingRequiredTable` when the schema was tampered with.
    pub fn try_new(conn: &'conn Connection) -> BackendResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(BackendError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        for &table in REQUIRED_TABLES {
            if !table_exists(conn, table)? {
                return Err(BackendError::MissingRequiredTable(table));
            }
        }

        Ok(Self { conn })
    }
}

impl RecordBackend for SqliteRecordBackend<'_> {
    fn set_if_absent(&self, key: &RecordKey, fields: &Fields) -> BackendResult<bool> {
        // IMMEDIATE takes the write lock up front, so the conflict check and
        // the field inserts cannot interleave with another writer.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let inserted = tx.execute(
            "INSERT INTO records (key) VALUES (?1)
             ON CONFLICT(key) DO NOTHING;",
            [key.as_str()],
        )?;
        if inserted == 0 {
            tx.rollback()?;
            return Ok(false);
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO record_fields (record_key, name, value)
                 VALUES (?1, ?2, ?3);",
            )?;
            for (name, value) in fields {
                stmt.execute(params![key.as_str(), name, value])?;
            }
        }

        tx.commit()?;
        Ok(true)
    }

    fn get_all(&self, key: &RecordKey) -> BackendResult<Option<Fields>> {
        // One deferred transaction keeps the existence check and the field
        // read on the same snapshot.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;

        let present = tx
            .query_row(
                "SELECT 1 FROM records WHERE key = ?1;",
                [key.as_str()],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if !present {
            return Ok(None);
        }

        let mut fields = Fields::new();
        {
            let mut stmt = tx.prepare(
                "SELECT name, value
                 FROM record_fields
                 WHERE record_key = ?1
                 ORDER BY name ASC;",
            )?;
            let mut rows = stmt.query([key.as_str()])?;
            while let Some(row) = rows.next()? {
                let name: String = row.get("name")?;
                let value = parse_field_value(row.get_ref("value")?, key, &name)?;
                fields.insert(name, value);
            }
        }

        tx.finish()?;
        Ok(Some(fields))
    }
}

fn parse_field_value(value: ValueRef<'_>, key: &RecordKey, name: &str) -> BackendResult<String> {
    match value {
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec()).map_err(|_| {
            BackendError::InvalidData(format!(
                "non-UTF-8 value for field `{name}` of key `{key}`"
            ))
        }),
        other => Err(BackendError::InvalidData(format!(
            "field `{name}` of key `{key}` holds {} instead of text",
            other.data_type()
        ))),
    }
}

fn table_exists(conn: &Connection, table: &str) -> BackendResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
