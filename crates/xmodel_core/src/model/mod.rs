//! Declarative record model for customer, account, project and ledger data.
//!
//! # Responsibility
//! - Define record type descriptors and the records built from them.
//! - Derive boolean delegate properties from role attributes.
//!
//! # Invariants
//! - Every record is identified by a stable `RecordId`.
//! - Declared attributes only hold values that fit their declared kind.

pub mod account;
pub mod catalog;
pub mod context;
pub mod record;
pub mod role;
pub mod schema;
pub mod value;
