//! Core use-case services.
//!
//! # Responsibility
//! - Turn backend primitives into the store's create/get contract.
//! - Layer the user projection on top of the generic store.
//! - Keep transport layers (CLI) decoupled from storage details.

pub mod record_store;
pub mod user_service;
