//! Orphan recovery use-case service.
//!
//! # Responsibility
//! - Detect annotated commits that HEAD can no longer reach.
//! - Find a replacement commit by content fingerprint.
//! - Migrate only after the caller confirms each match.
//!
//! # Invariants
//! - Fingerprint matching never migrates on its own; a `ConfirmMigration`
//!   port must accept every candidate.
//! - The nearest match to HEAD wins (ancestors are scanned most-recent-first).
//! - Skip conditions (no fingerprint, no match) are outcomes, not errors.
//! - Each per-orphan result reaches the port before the next orphan is
//!   examined.

use crate::graph::{GraphQueryFacade, NodeId};
use crate::model::collection::RemarkCollection;
use crate::repo::remark_store::{RemarkStore, StoreResult};
use crate::service::migration_service::{MigrationOutcome, MigrationService};
use log::{info, warn};
use std::collections::BTreeSet;

/// How many ancestors of HEAD are fingerprinted per orphan by default.
pub const DEFAULT_SEARCH_LIMIT: usize = 1000;

/// Result of searching a replacement for one orphan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryOutcome {
    Matched(NodeId),
    /// Orphan has no diff or its fingerprint could not be computed.
    NoFingerprint,
    /// No ancestor within the search limit shares the fingerprint.
    NoMatch,
}

/// A proposed migration shown to the confirmation port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryCandidate {
    pub orphan: NodeId,
    pub target: NodeId,
    /// Remarks that would move.
    pub remarks: RemarkCollection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accept,
    Decline,
}

/// Caller-side gate for heuristic migrations.
pub trait ConfirmMigration {
    /// Decides whether `candidate` should be migrated.
    fn confirm(&mut self, candidate: &RecoveryCandidate) -> std::io::Result<Confirmation>;

    /// Called once per orphan as soon as its result is known, before the
    /// next orphan is examined.
    fn observe(&mut self, _entry: &RecoveryEntry) -> std::io::Result<()> {
        Ok(())
    }
}

/// Per-orphan result of a recovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryResult {
    Recovered { target: NodeId, remarks: usize },
    Declined { target: NodeId },
    NoFingerprint,
    NoMatch,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryEntry {
    pub orphan: NodeId,
    pub result: RecoveryResult,
}

/// Aggregate result of `RecoveryService::run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryReport {
    pub orphans: usize,
    pub entries: Vec<RecoveryEntry>,
}

impl RecoveryReport {
    /// Number of orphans whose remarks were migrated.
    pub fn recovered(&self) -> usize {
        self.count(|result| matches!(result, RecoveryResult::Recovered { .. }))
    }

    pub fn declined(&self) -> usize {
        self.count(|result| matches!(result, RecoveryResult::Declined { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|result| {
            matches!(
                result,
                RecoveryResult::NoFingerprint | RecoveryResult::NoMatch
            )
        })
    }

    pub fn failed(&self) -> usize {
        self.count(|result| matches!(result, RecoveryResult::Failed(_)))
    }

    fn count(&self, predicate: impl Fn(&RecoveryResult) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|entry| predicate(&entry.result))
            .count()
    }
}

/// Use-case service for fingerprint-based orphan recovery.
pub struct RecoveryService<G: GraphQueryFacade> {
    migration: MigrationService<G>,
    search_limit: usize,
}

impl<G: GraphQueryFacade> RecoveryService<G> {
    pub fn new(migration: MigrationService<G>, search_limit: usize) -> Self {
        Self {
            migration,
            search_limit,
        }
    }

    fn store(&self) -> &RemarkStore<G> {
        self.migration.store()
    }

    /// Annotated commits that are not ancestors of `head`.
    ///
    /// A commit whose ancestry cannot be queried counts as orphaned.
    pub fn find_orphans(&self, head: &NodeId) -> StoreResult<BTreeSet<NodeId>> {
        let graph = self.store().graph();
        let mut orphans = BTreeSet::new();
        for node in graph.list_annotated_nodes()? {
            match graph.is_ancestor(&node, head) {
                Ok(true) => {}
                Ok(false) => {
                    orphans.insert(node);
                }
                Err(err) => {
                    warn!(
                        "event=orphan_scan module=recovery status=error node={} error={}",
                        node.short(),
                        err
                    );
                    orphans.insert(node);
                }
            }
        }
        Ok(orphans)
    }

    /// Searches the ancestors of `head` for a commit with the orphan's fingerprint.
    pub fn recover(&self, orphan: &NodeId, head: &NodeId) -> StoreResult<RecoveryOutcome> {
        let graph = self.store().graph();
        let fingerprint = match graph.content_fingerprint(orphan) {
            Ok(value) if !value.is_empty() => value,
            Ok(_) => {
                info!(
                    "event=orphan_recover module=recovery status=skip reason=empty_fingerprint orphan={}",
                    orphan.short()
                );
                return Ok(RecoveryOutcome::NoFingerprint);
            }
            Err(err) => {
                info!(
                    "event=orphan_recover module=recovery status=skip reason=fingerprint_failed orphan={} error={}",
                    orphan.short(),
                    err
                );
                return Ok(RecoveryOutcome::NoFingerprint);
            }
        };

        for candidate in graph.enumerate_ancestors(head, self.search_limit)? {
            if &candidate == orphan {
                continue;
            }
            match graph.content_fingerprint(&candidate) {
                Ok(value) if value == fingerprint => {
                    info!(
                        "event=orphan_recover module=recovery status=ok orphan={} target={}",
                        orphan.short(),
                        candidate.short()
                    );
                    return Ok(RecoveryOutcome::Matched(candidate));
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        "event=orphan_recover module=recovery status=skip reason=candidate_fingerprint_failed candidate={} error={}",
                        candidate.short(),
                        err
                    );
                }
            }
        }

        info!(
            "event=orphan_recover module=recovery status=skip reason=no_match orphan={} limit={}",
            orphan.short(),
            self.search_limit
        );
        Ok(RecoveryOutcome::NoMatch)
    }

    /// Scans orphans of `head`, asks `confirm` for each match, and migrates
    /// accepted ones. Per-orphan failures are recorded and the scan continues.
    ///
    /// # Errors
    /// - Only when the orphan inventory itself cannot be listed.
    pub fn run(
        &self,
        head: &NodeId,
        confirm: &mut impl ConfirmMigration,
    ) -> StoreResult<RecoveryReport> {
        let orphans = self.find_orphans(head)?;
        let mut report = RecoveryReport {
            orphans: orphans.len(),
            entries: Vec::with_capacity(orphans.len()),
        };

        for orphan in orphans {
            let result = self.recover_one(&orphan, head, confirm);
            let mut stop = result.is_err();
            let entry = RecoveryEntry {
                orphan,
                result: result.unwrap_or_else(RecoveryResult::Failed),
            };
            if let Err(err) = confirm.observe(&entry) {
                warn!(
                    "event=recovery_run module=recovery status=error orphan={} error={}",
                    entry.orphan.short(),
                    err
                );
                stop = true;
            }
            report.entries.push(entry);
            if stop {
                break;
            }
        }

        info!(
            "event=recovery_run module=recovery status=ok orphans={} recovered={} declined={} skipped={} failed={}",
            report.orphans,
            report.recovered(),
            report.declined(),
            report.skipped(),
            report.failed()
        );
        Ok(report)
    }

    /// `Err` means the confirmation port is unusable and the run must stop.
    fn recover_one(
        &self,
        orphan: &NodeId,
        head: &NodeId,
        confirm: &mut impl ConfirmMigration,
    ) -> Result<RecoveryResult, String> {
        let target = match self.recover(orphan, head) {
            Ok(RecoveryOutcome::Matched(target)) => target,
            Ok(RecoveryOutcome::NoFingerprint) => return Ok(RecoveryResult::NoFingerprint),
            Ok(RecoveryOutcome::NoMatch) => return Ok(RecoveryResult::NoMatch),
            Err(err) => return Ok(RecoveryResult::Failed(err.to_string())),
        };

        let remarks = match self.store().get(orphan) {
            Ok(remarks) => remarks,
            Err(err) => return Ok(RecoveryResult::Failed(err.to_string())),
        };
        let candidate = RecoveryCandidate {
            orphan: orphan.clone(),
            target,
            remarks,
        };

        match confirm.confirm(&candidate) {
            Ok(Confirmation::Accept) => {}
            Ok(Confirmation::Decline) => {
                return Ok(RecoveryResult::Declined {
                    target: candidate.target,
                })
            }
            Err(err) => return Err(format!("confirmation failed: {err}")),
        }

        Ok(
            match self.migration.migrate(&candidate.orphan, &candidate.target) {
                Ok(MigrationOutcome::Migrated { remarks, .. }) => RecoveryResult::Recovered {
                    target: candidate.target,
                    remarks,
                },
                Ok(MigrationOutcome::NothingToMigrate) => RecoveryResult::Recovered {
                    target: candidate.target,
                    remarks: 0,
                },
                Err(err) => RecoveryResult::Failed(err.to_string()),
            },
        )
    }
}
