//! Migration use-case service.
//!
//! # Responsibility
//! - Relocate a commit's full remark collection onto another commit.
//! - Apply the `post-rewrite` mapping feed (`<old> <new>` per line).
//! - Rename a branch scope across every stored collection.
//!
//! # Invariants
//! - The target is saved before the source is removed; an interruption can
//!   duplicate remarks but never drop them.
//! - A failed target save leaves the source untouched.
//! - Re-running a migration after a partial failure converges because
//!   `RemarkCollection::merge` skips replayed entries.

use crate::graph::{GraphQueryFacade, NodeId};
use crate::model::collection::MergeReport;
use crate::repo::remark_store::{RemarkStore, StoreResult};
use log::{info, warn};
use std::io::BufRead;

/// Result of one `migrate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// Source held remarks; they now live on the target.
    Migrated {
        /// Size of the source collection that was moved.
        remarks: usize,
        merge: MergeReport,
    },
    /// Source had no remarks (or equals the target); nothing was written.
    NothingToMigrate,
}

/// One applied line of the rewrite feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteEntry {
    pub source: NodeId,
    pub target: NodeId,
    pub remarks: usize,
}

/// One line of the rewrite feed that failed to migrate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteFailure {
    pub source: NodeId,
    pub target: NodeId,
    pub error: String,
}

/// Aggregate result of applying a rewrite feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteReport {
    pub migrated: Vec<RewriteEntry>,
    /// Lines with fewer than two fields.
    pub skipped_lines: usize,
    pub failures: Vec<RewriteFailure>,
}

impl RewriteReport {
    /// Number of source commits whose remarks moved.
    pub fn migrated_nodes(&self) -> usize {
        self.migrated.len()
    }

    pub fn migrated_remarks(&self) -> usize {
        self.migrated.iter().map(|entry| entry.remarks).sum()
    }
}

/// Aggregate result of a branch rename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameReport {
    /// Remarks whose branch label changed and were saved.
    pub updated: usize,
    pub collections_changed: usize,
    pub failures: Vec<(NodeId, String)>,
}

/// Use-case service for moving remarks between commits.
pub struct MigrationService<G: GraphQueryFacade> {
    store: RemarkStore<G>,
}

impl<G: GraphQueryFacade> MigrationService<G> {
    pub fn new(store: RemarkStore<G>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RemarkStore<G> {
        &self.store
    }

    /// Moves every remark on `source` onto `target`.
    ///
    /// # Contract
    /// - Empty source: no reads of the target, no writes.
    /// - Target collection becomes `target ++ source` (minus exact replays).
    /// - Source record is removed only after the target save succeeded.
    pub fn migrate(&self, source: &NodeId, target: &NodeId) -> StoreResult<MigrationOutcome> {
        if source == target {
            return Ok(MigrationOutcome::NothingToMigrate);
        }

        let moved = self.store.get(source)?;
        if moved.is_empty() {
            return Ok(MigrationOutcome::NothingToMigrate);
        }
        let remarks = moved.len();

        let mut merged = self.store.get(target)?;
        let merge = merged.merge(moved);
        if merge.appended > 0 {
            self.store.save(target, &merged)?;
        }

        if let Err(err) = self.store.remove(source) {
            warn!(
                "event=remark_migrate module=migration status=error stage=remove_source source={} target={} error={}",
                source.short(),
                target.short(),
                err
            );
            return Err(err);
        }

        info!(
            "event=remark_migrate module=migration status=ok source={} target={} remarks={} appended={} replays_skipped={} ids_regenerated={}",
            source.short(),
            target.short(),
            remarks,
            merge.appended,
            merge.replays_skipped,
            merge.ids_regenerated
        );
        Ok(MigrationOutcome::Migrated { remarks, merge })
    }

    /// Applies a rewrite-mapping feed of `<old> <new>` lines.
    ///
    /// Malformed lines and per-line failures do not stop the feed.
    ///
    /// # Errors
    /// - Only I/O errors while reading `feed`.
    pub fn migrate_rewrites(&self, feed: impl BufRead) -> std::io::Result<RewriteReport> {
        let mut report = RewriteReport::default();
        for line in feed.lines() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let (Some(old), Some(new)) = (fields.next(), fields.next()) else {
                report.skipped_lines += 1;
                continue;
            };

            let source = NodeId::from(old);
            let target = NodeId::from(new);
            match self.migrate(&source, &target) {
                Ok(MigrationOutcome::Migrated { remarks, .. }) => {
                    report.migrated.push(RewriteEntry {
                        source,
                        target,
                        remarks,
                    });
                }
                Ok(MigrationOutcome::NothingToMigrate) => {}
                Err(err) => report.failures.push(RewriteFailure {
                    source,
                    target,
                    error: err.to_string(),
                }),
            }
        }

        info!(
            "event=rewrite_feed module=migration status=ok migrated_nodes={} migrated_remarks={} skipped_lines={} failures={}",
            report.migrated_nodes(),
            report.migrated_remarks(),
            report.skipped_lines,
            report.failures.len()
        );
        Ok(report)
    }

    /// Rewrites the branch label `old_branch` to `new_branch` everywhere.
    ///
    /// Each collection is its own read-modify-write; a failure on one does
    /// not stop the others, and re-running is safe.
    pub fn rename_branch_everywhere(
        &self,
        old_branch: &str,
        new_branch: &str,
    ) -> StoreResult<RenameReport> {
        let mut report = RenameReport::default();
        if old_branch == new_branch {
            return Ok(report);
        }

        for (node, mut collection) in self.store.list_all_with_remarks()? {
            let changed = collection.rename_branch(old_branch, new_branch);
            if changed == 0 {
                continue;
            }
            match self.store.save(&node, &collection) {
                Ok(()) => {
                    report.updated += changed;
                    report.collections_changed += 1;
                }
                Err(err) => {
                    warn!(
                        "event=branch_rename module=migration status=error node={} error={}",
                        node.short(),
                        err
                    );
                    report.failures.push((node, err.to_string()));
                }
            }
        }

        info!(
            "event=branch_rename module=migration status=ok updated={} collections={} failures={}",
            report.updated,
            report.collections_changed,
            report.failures.len()
        );
        Ok(report)
    }
}
