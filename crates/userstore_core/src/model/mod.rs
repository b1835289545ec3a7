//! Domain model for keyed field records.
//!
//! # Responsibility
//! - Define the record shape shared by the store, backends and services.
//! - Own key validation so every entry point applies the same rule.
//!
//! # Invariants
//! - A `RecordKey` is never empty or whitespace-only.
//! - A record is created once and never mutated afterwards.

pub mod record;
