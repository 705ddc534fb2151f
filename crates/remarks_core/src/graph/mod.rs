//! Narrow query interface over the external commit graph.
//!
//! # Responsibility
//! - Expose identity, ancestry and fingerprint facts about commits.
//! - Expose the annotation side channel (git notes) as read/write/remove.
//!
//! # Invariants
//! - Node identities are never invented here; they come from the graph.
//! - `write_annotation` and `remove_annotation` are the only mutations.
//! - `remove_annotation` on a node without a record is a no-op.

use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod git_cli;
pub mod memory;

pub use git_cli::GitCliGraph;
pub use memory::InMemoryGraph;

/// Notes ref used when no override is configured.
pub const DEFAULT_NOTES_REF: &str = "remarks";

/// Length of abbreviated identities shown to humans.
pub const SHORT_ID_LEN: usize = 7;

/// Opaque content-addressed commit identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First `SHORT_ID_LEN` characters, or the whole id when shorter.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_ID_LEN) {
            Some((index, _)) => &self.0[..index],
            None => &self.0,
        }
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Failures surfaced by graph queries.
#[derive(Debug)]
pub enum GraphError {
    /// Current directory is not inside a git work tree.
    NotARepository,
    /// HEAD is not attached to a branch.
    DetachedState,
    /// Reference does not resolve to a commit.
    RefNotFound(String),
    /// A git invocation exited unsuccessfully.
    CommandFailed { command: String, stderr: String },
    /// Spawning or talking to the subprocess failed.
    Io(std::io::Error),
    /// A git invocation produced output that could not be interpreted.
    InvalidOutput(String),
    /// Failure injected by `InMemoryGraph`.
    Injected(String),
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotARepository => write!(f, "not a git repository"),
            Self::DetachedState => write!(f, "not on a branch (detached HEAD)"),
            Self::RefNotFound(reference) => write!(f, "invalid commit: {reference}"),
            Self::CommandFailed { command, stderr } => write!(f, "{command}: {stderr}"),
            Self::Io(err) => write!(f, "failed to run git: {err}"),
            Self::InvalidOutput(message) => write!(f, "unexpected git output: {message}"),
            Self::Injected(message) => write!(f, "injected failure: {message}"),
        }
    }
}

impl Error for GraphError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for GraphError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Query capability over the commit graph and its annotation channel.
///
/// Every call is a blocking round trip; implementations use interior
/// mutability where they keep state.
pub trait GraphQueryFacade {
    /// Resolves a revision expression to a commit identity.
    fn resolve_identity(&self, reference: &str) -> GraphResult<NodeId>;
    fn current_head(&self) -> GraphResult<NodeId>;
    /// Current branch name; `DetachedState` when HEAD is detached.
    fn current_scope_label(&self) -> GraphResult<String>;
    /// Whether `candidate` is reachable from `of`. A node is its own ancestor.
    fn is_ancestor(&self, candidate: &NodeId, of: &NodeId) -> GraphResult<bool>;
    /// Ancestors of `from` (inclusive), most recent first. `limit == 0` is unbounded.
    fn enumerate_ancestors(&self, from: &NodeId, limit: usize) -> GraphResult<Vec<NodeId>>;
    /// Stable hash of the node's diff; empty when the node has no diff.
    fn content_fingerprint(&self, node: &NodeId) -> GraphResult<String>;
    /// Every node that currently carries an annotation record.
    fn list_annotated_nodes(&self) -> GraphResult<BTreeSet<NodeId>>;
    /// Raw annotation document, `None` when the node has no record.
    fn read_annotation(&self, node: &NodeId) -> GraphResult<Option<String>>;
    /// Overwrites the node's annotation record in one call.
    fn write_annotation(&self, node: &NodeId, payload: &[u8]) -> GraphResult<()>;
    fn remove_annotation(&self, node: &NodeId) -> GraphResult<()>;

    /// Abbreviated identity for display.
    fn short_identity(&self, node: &NodeId) -> String {
        node.short().to_string()
    }
}

impl<G: GraphQueryFacade + ?Sized> GraphQueryFacade for &G {
    fn resolve_identity(&self, reference: &str) -> GraphResult<NodeId> {
        (**self).resolve_identity(reference)
    }

    fn current_head(&self) -> GraphResult<NodeId> {
        (**self).current_head()
    }

    fn current_scope_label(&self) -> GraphResult<String> {
        (**self).current_scope_label()
    }

    fn is_ancestor(&self, candidate: &NodeId, of: &NodeId) -> GraphResult<bool> {
        (**self).is_ancestor(candidate, of)
    }

    fn enumerate_ancestors(&self, from: &NodeId, limit: usize) -> GraphResult<Vec<NodeId>> {
        (**self).enumerate_ancestors(from, limit)
    }

    fn content_fingerprint(&self, node: &NodeId) -> GraphResult<String> {
        (**self).content_fingerprint(node)
    }

    fn list_annotated_nodes(&self) -> GraphResult<BTreeSet<NodeId>> {
        (**self).list_annotated_nodes()
    }

    fn read_annotation(&self, node: &NodeId) -> GraphResult<Option<String>> {
        (**self).read_annotation(node)
    }

    fn write_annotation(&self, node: &NodeId, payload: &[u8]) -> GraphResult<()> {
        (**self).write_annotation(node, payload)
    }

    fn remove_annotation(&self, node: &NodeId) -> GraphResult<()> {
        (**self).remove_annotation(node)
    }

    fn short_identity(&self, node: &NodeId) -> String {
        (**self).short_identity(node)
    }
}

#[cfg(test)]
mod tests {
    use super::NodeId;

    #[test]
    fn short_handles_short_and_long_ids() {
        assert_eq!(NodeId::from("abc").short(), "abc");
        assert_eq!(
            NodeId::from("0123456789abcdef0123456789abcdef01234567").short(),
            "0123456"
        );
    }
}
