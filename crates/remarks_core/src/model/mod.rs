//! Remark domain model.
//!
//! # Responsibility
//! - Define the remark record and the per-commit collection.
//! - Keep all mutation primitives free of I/O.
//!
//! # Invariants
//! - Remark ids are unique within one collection.
//! - Resolved remarks are retained, not physically deleted, unless a caller
//!   removes them explicitly.

pub mod collection;
pub mod remark;
