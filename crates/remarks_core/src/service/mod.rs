//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into migration and recovery use-cases.
//! - Keep the CLI decoupled from notes storage details.

pub mod migration_service;
pub mod recovery_service;
