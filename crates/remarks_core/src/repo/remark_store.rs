//! Remark store over the annotation channel.
//!
//! # Responsibility
//! - Own the persisted mapping from commit identity to `RemarkCollection`.
//! - Funnel every mutation through get -> mutate -> save.
//!
//! # Invariants
//! - `save` is the only write path.
//! - Saving an empty collection removes the record instead of writing `[]`.
//! - Write paths call `Remark::validate()` before serialization.

use crate::graph::{GraphError, GraphQueryFacade, NodeId};
use crate::model::collection::RemarkCollection;
use crate::model::remark::{Remark, RemarkValidationError};
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store-level error for remark persistence.
#[derive(Debug)]
pub enum StoreError {
    Graph(GraphError),
    Validation(RemarkValidationError),
    /// Record exists but is not a valid notes document.
    Serialization {
        node: NodeId,
        source: serde_yaml::Error,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Graph(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Serialization { node, source } => {
                write!(f, "invalid remarks document on {}: {source}", node.short())
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Serialization { source, .. } => Some(source),
        }
    }
}

impl From<GraphError> for StoreError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

impl From<RemarkValidationError> for StoreError {
    fn from(value: RemarkValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Read-modify-write store keyed by commit identity.
pub struct RemarkStore<G: GraphQueryFacade> {
    graph: G,
}

impl<G: GraphQueryFacade> RemarkStore<G> {
    pub fn new(graph: G) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    /// Returns the node's collection, empty when no record exists.
    pub fn get(&self, node: &NodeId) -> StoreResult<RemarkCollection> {
        match self.graph.read_annotation(node)? {
            Some(document) => RemarkCollection::from_yaml(&document).map_err(|source| {
                StoreError::Serialization {
                    node: node.clone(),
                    source,
                }
            }),
            None => Ok(RemarkCollection::new()),
        }
    }

    /// Persists `collection`, removing the record when it is empty.
    pub fn save(&self, node: &NodeId, collection: &RemarkCollection) -> StoreResult<()> {
        if collection.is_empty() {
            return self.remove(node);
        }

        for remark in collection {
            remark.validate()?;
        }
        let document = collection
            .to_yaml()
            .map_err(|source| StoreError::Serialization {
                node: node.clone(),
                source,
            })?;
        self.graph.write_annotation(node, document.as_bytes())?;
        Ok(())
    }

    /// Deletes the node's record; absent records are not an error.
    pub fn remove(&self, node: &NodeId) -> StoreResult<()> {
        self.graph.remove_annotation(node)?;
        Ok(())
    }

    pub fn add(&self, node: &NodeId, remark: Remark) -> StoreResult<()> {
        remark.validate()?;
        let mut collection = self.get(node)?;
        let remark_id = remark.id.clone();
        collection.add(remark);
        self.save(node, &collection)?;
        info!(
            "event=remark_add module=store status=ok node={} remark_id={} count={}",
            node.short(),
            remark_id,
            collection.len()
        );
        Ok(())
    }

    /// Removes the remark; returns `false` and writes nothing when absent.
    pub fn resolve(&self, node: &NodeId, remark_id: &str) -> StoreResult<bool> {
        let mut collection = self.get(node)?;
        if !collection.remove_by_id(remark_id) {
            return Ok(false);
        }
        self.save(node, &collection)?;
        info!(
            "event=remark_resolve module=store status=ok node={} remark_id={} remaining={}",
            node.short(),
            remark_id,
            collection.len()
        );
        Ok(true)
    }

    /// Flips the remark to resolved but keeps it in the collection.
    pub fn mark_resolved(&self, node: &NodeId, remark_id: &str) -> StoreResult<bool> {
        let mut collection = self.get(node)?;
        match collection.find_by_id_mut(remark_id) {
            Some(remark) if remark.is_active() => remark.resolve(),
            Some(_) => return Ok(true),
            None => return Ok(false),
        }
        self.save(node, &collection)?;
        info!(
            "event=remark_mark_resolved module=store status=ok node={} remark_id={}",
            node.short(),
            remark_id
        );
        Ok(true)
    }

    /// Replaces the remark with the same id in place; no-op when absent.
    pub fn update(&self, node: &NodeId, remark: Remark) -> StoreResult<()> {
        remark.validate()?;
        let mut collection = self.get(node)?;
        let Some(existing) = collection.find_by_id_mut(&remark.id) else {
            return Ok(());
        };
        *existing = remark;
        self.save(node, &collection)
    }

    /// Best-effort inventory of every annotated node.
    ///
    /// Records that cannot be read or parsed are skipped, as are empty ones.
    pub fn list_all_with_remarks(&self) -> StoreResult<BTreeMap<NodeId, RemarkCollection>> {
        let mut result = BTreeMap::new();
        for node in self.graph.list_annotated_nodes()? {
            match self.get(&node) {
                Ok(collection) if !collection.is_empty() => {
                    result.insert(node, collection);
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        "event=remark_list module=store status=skip node={} error={}",
                        node.short(),
                        err
                    );
                }
            }
        }
        Ok(result)
    }

    /// First node (in identity order) holding a remark with `remark_id`.
    pub fn find_by_id(&self, remark_id: &str) -> StoreResult<Option<(NodeId, Remark)>> {
        Ok(self
            .list_all_with_remarks()?
            .into_iter()
            .find_map(|(node, collection)| {
                collection
                    .find_by_id(remark_id)
                    .cloned()
                    .map(|remark| (node, remark))
            }))
    }
}
