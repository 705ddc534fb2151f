//! Persistence layer over the annotation channel.
//!
//! # Responsibility
//! - Define the remark store contract used by services and the CLI.
//! - Isolate notes document encoding from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `Remark::validate()` before persistence.
//! - Not-found is reported as `Option`/`bool`, transport failures as errors.

pub mod remark_store;
