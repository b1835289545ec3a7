//! Backend contracts and persistence implementations.
//!
//! # Responsibility
//! - Define the two primitives the record store consumes from a key-value
//!   engine: conditional set and full read.
//! - Isolate SQLite query details from the store.
//!
//! # Invariants
//! - `set_if_absent` is a single atomic step; implementations must never
//!   split it into a separate existence check and write.
//! - Backend APIs report absence as values (`false`, `None`), and reserve
//!   errors for storage failures.

pub mod record_repo;
