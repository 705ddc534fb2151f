//! Ordered remark collection attached to one commit.
//!
//! # Responsibility
//! - Own the mutation primitives used by the store (add/find/remove/merge).
//! - Serialize to and from the YAML notes document.
//!
//! # Invariants
//! - Entry order is insertion order; merge appends after existing entries.
//! - Ids stay unique inside one collection, including after a merge.
//! - An empty collection is never persisted (see `RemarkStore::save`).

use crate::model::remark::{Remark, RemarkState};
use serde::{Deserialize, Deserializer, Serialize};

/// Ordered sequence of remarks for one commit.
///
/// Serialized as a document with a single top-level `remarks` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkCollection {
    #[serde(default, deserialize_with = "null_as_empty")]
    remarks: Vec<Remark>,
}

/// `remarks:` with no value (or `null`/`~`) reads as an empty list.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Remark>, D::Error> {
    Ok(Option::<Vec<Remark>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Summary of one `RemarkCollection::merge` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Entries appended to the receiver.
    pub appended: usize,
    /// Incoming entries identical to one already present, dropped as replays.
    pub replays_skipped: usize,
    /// Incoming entries whose id collided and was regenerated.
    pub ids_regenerated: usize,
}

impl RemarkCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a notes document. Blank input yields an empty collection.
    pub fn from_yaml(data: &str) -> Result<Self, serde_yaml::Error> {
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(data)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    pub fn add(&mut self, remark: Remark) {
        self.remarks.push(remark);
    }

    pub fn find_by_id(&self, id: &str) -> Option<&Remark> {
        self.remarks.iter().find(|remark| remark.id == id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Remark> {
        self.remarks.iter_mut().find(|remark| remark.id == id)
    }

    /// Removes the first remark with `id`; returns whether one was removed.
    pub fn remove_by_id(&mut self, id: &str) -> bool {
        match self.remarks.iter().position(|remark| remark.id == id) {
            Some(index) => {
                self.remarks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Appends every entry of `other` after the current entries.
    ///
    /// An incoming entry equal in every field to an existing one is a replay
    /// of an earlier merge and is skipped. An incoming entry that only shares
    /// the id gets a fresh id before it is appended.
    pub fn merge(&mut self, other: RemarkCollection) -> MergeReport {
        let mut report = MergeReport::default();
        for mut incoming in other.remarks {
            if self.remarks.contains(&incoming) {
                report.replays_skipped += 1;
                continue;
            }
            if self.find_by_id(&incoming.id).is_some() {
                while self.find_by_id(&incoming.id).is_some() {
                    incoming.regenerate_id();
                }
                report.ids_regenerated += 1;
            }
            self.remarks.push(incoming);
            report.appended += 1;
        }
        report
    }

    /// Active entries scoped to `branch`, in original order.
    pub fn filter_active_for_branch(&self, branch: &str) -> Vec<&Remark> {
        self.remarks
            .iter()
            .filter(|remark| remark.state == RemarkState::Active && remark.branch == branch)
            .collect()
    }

    /// Rewrites the branch label of every matching entry; returns how many changed.
    pub fn rename_branch(&mut self, old_branch: &str, new_branch: &str) -> usize {
        let mut changed = 0;
        for remark in self.remarks.iter_mut().filter(|r| r.branch == old_branch) {
            remark.branch = new_branch.to_string();
            changed += 1;
        }
        changed
    }

    pub fn active_count(&self) -> usize {
        self.remarks.iter().filter(|remark| remark.is_active()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.remarks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.remarks.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Remark> {
        self.remarks.iter()
    }

    pub fn as_slice(&self) -> &[Remark] {
        &self.remarks
    }
}

impl From<Vec<Remark>> for RemarkCollection {
    fn from(remarks: Vec<Remark>) -> Self {
        Self { remarks }
    }
}

impl IntoIterator for RemarkCollection {
    type Item = Remark;
    type IntoIter = std::vec::IntoIter<Remark>;

    fn into_iter(self) -> Self::IntoIter {
        self.remarks.into_iter()
    }
}

impl<'a> IntoIterator for &'a RemarkCollection {
    type Item = &'a Remark;
    type IntoIter = std::slice::Iter<'a, Remark>;

    fn into_iter(self) -> Self::IntoIter {
        self.remarks.iter()
    }
}
