//! Core domain logic for git-remarks.
//! Remarks are stored as git notes keyed by commit; this crate owns their
//! model, persistence, migration and recovery rules.

pub mod config;
pub mod editor;
pub mod graph;
pub mod hook;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, RemarksConfig};
pub use graph::git_cli::GitCliGraph;
pub use graph::memory::InMemoryGraph;
pub use graph::{GraphError, GraphQueryFacade, GraphResult, NodeId, DEFAULT_NOTES_REF};
pub use logging::{default_log_dir, default_log_level, init_logging, logging_status, LoggingError};
pub use model::collection::{MergeReport, RemarkCollection};
pub use model::remark::{
    generate_remark_id, validate_kind, Remark, RemarkId, RemarkKind, RemarkState,
    RemarkValidationError,
};
pub use repo::remark_store::{RemarkStore, StoreError, StoreResult};
pub use service::migration_service::{MigrationOutcome, MigrationService, RewriteReport};
pub use service::recovery_service::{
    ConfirmMigration, Confirmation, RecoveryCandidate, RecoveryEntry, RecoveryOutcome,
    RecoveryReport, RecoveryResult, RecoveryService, DEFAULT_SEARCH_LIMIT,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
