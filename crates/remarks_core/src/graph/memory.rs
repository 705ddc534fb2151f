//! Deterministic in-memory graph for tests and dry runs.
//!
//! Commits are recorded in creation order; "most recent first" means reverse
//! creation order among reachable commits. Write and remove failures can be
//! injected per node to exercise partial-failure paths.

use super::{GraphError, GraphQueryFacade, GraphResult, NodeId};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
struct CommitEntry {
    seq: usize,
    parents: Vec<NodeId>,
    fingerprint: String,
}

#[derive(Debug, Default)]
struct State {
    commits: BTreeMap<NodeId, CommitEntry>,
    refs: BTreeMap<String, NodeId>,
    head: Option<NodeId>,
    branch: Option<String>,
    annotations: BTreeMap<NodeId, String>,
    failing_writes: BTreeSet<NodeId>,
    failing_removes: BTreeSet<NodeId>,
    failing_fingerprints: BTreeSet<NodeId>,
    writes: usize,
    removes: usize,
}

/// In-memory `GraphQueryFacade`.
#[derive(Debug, Default)]
pub struct InMemoryGraph {
    state: RefCell<State>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a commit with parents and a content fingerprint.
    ///
    /// An empty fingerprint models a commit without a diff.
    pub fn commit(&self, id: &str, parents: &[&str], fingerprint: &str) -> NodeId {
        let node = NodeId::from(id);
        let mut state = self.state.borrow_mut();
        let seq = state.commits.len();
        state.commits.insert(
            node.clone(),
            CommitEntry {
                seq,
                parents: parents.iter().map(|p| NodeId::from(*p)).collect(),
                fingerprint: fingerprint.to_string(),
            },
        );
        node
    }

    /// Makes `content_fingerprint` fail for `id`.
    pub fn fail_fingerprint_of(&self, id: &str) {
        self.state
            .borrow_mut()
            .failing_fingerprints
            .insert(NodeId::from(id));
    }

    /// Points a named ref at a commit.
    pub fn set_ref(&self, name: &str, id: &str) {
        self.state
            .borrow_mut()
            .refs
            .insert(name.to_string(), NodeId::from(id));
    }

    /// Moves HEAD to `id` on `branch`; `None` detaches HEAD.
    pub fn checkout(&self, id: &str, branch: Option<&str>) {
        let mut state = self.state.borrow_mut();
        state.head = Some(NodeId::from(id));
        state.branch = branch.map(str::to_string);
        if let Some(name) = branch {
            state.refs.insert(name.to_string(), NodeId::from(id));
        }
    }

    /// Makes every subsequent `write_annotation` on `id` fail.
    pub fn fail_writes_to(&self, id: &str) {
        self.state
            .borrow_mut()
            .failing_writes
            .insert(NodeId::from(id));
    }

    /// Makes every subsequent `remove_annotation` on `id` fail.
    pub fn fail_removes_of(&self, id: &str) {
        self.state
            .borrow_mut()
            .failing_removes
            .insert(NodeId::from(id));
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.borrow_mut();
        state.failing_writes.clear();
        state.failing_removes.clear();
        state.failing_fingerprints.clear();
    }

    /// Stores a raw annotation document, bypassing serialization.
    pub fn put_raw_annotation(&self, id: &str, document: &str) {
        self.state
            .borrow_mut()
            .annotations
            .insert(NodeId::from(id), document.to_string());
    }

    pub fn raw_annotation(&self, id: &str) -> Option<String> {
        self.state
            .borrow()
            .annotations
            .get(&NodeId::from(id))
            .cloned()
    }

    /// Number of successful `write_annotation` calls.
    pub fn write_count(&self) -> usize {
        self.state.borrow().writes
    }

    /// Number of `remove_annotation` calls that removed a record.
    pub fn remove_count(&self) -> usize {
        self.state.borrow().removes
    }

    fn reachable(state: &State, from: &NodeId) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![from.clone()];
        while let Some(node) = stack.pop() {
            if !seen.insert(node.clone()) {
                continue;
            }
            if let Some(entry) = state.commits.get(&node) {
                stack.extend(entry.parents.iter().cloned());
            }
        }
        seen
    }
}

impl GraphQueryFacade for InMemoryGraph {
    fn resolve_identity(&self, reference: &str) -> GraphResult<NodeId> {
        let state = self.state.borrow();
        if reference == "HEAD" {
            return state
                .head
                .clone()
                .ok_or_else(|| GraphError::RefNotFound(reference.to_string()));
        }
        if let Some(node) = state.refs.get(reference) {
            return Ok(node.clone());
        }
        let node = NodeId::from(reference);
        if state.commits.contains_key(&node) {
            return Ok(node);
        }
        let mut prefixed = state
            .commits
            .keys()
            .filter(|id| id.as_str().starts_with(reference));
        match (prefixed.next(), prefixed.next()) {
            (Some(only), None) if !reference.is_empty() => Ok(only.clone()),
            _ => Err(GraphError::RefNotFound(reference.to_string())),
        }
    }

    fn current_head(&self) -> GraphResult<NodeId> {
        self.resolve_identity("HEAD")
    }

    fn current_scope_label(&self) -> GraphResult<String> {
        self.state
            .borrow()
            .branch
            .clone()
            .ok_or(GraphError::DetachedState)
    }

    fn is_ancestor(&self, candidate: &NodeId, of: &NodeId) -> GraphResult<bool> {
        let state = self.state.borrow();
        for node in [candidate, of] {
            if !state.commits.contains_key(node) {
                return Err(GraphError::RefNotFound(node.to_string()));
            }
        }
        Ok(Self::reachable(&state, of).contains(candidate))
    }

    fn enumerate_ancestors(&self, from: &NodeId, limit: usize) -> GraphResult<Vec<NodeId>> {
        let state = self.state.borrow();
        if !state.commits.contains_key(from) {
            return Err(GraphError::RefNotFound(from.to_string()));
        }
        let mut ancestors: Vec<(usize, NodeId)> = Self::reachable(&state, from)
            .into_iter()
            .filter_map(|node| state.commits.get(&node).map(|entry| (entry.seq, node)))
            .collect();
        ancestors.sort_by(|a, b| b.0.cmp(&a.0));
        let iter = ancestors.into_iter().map(|(_, node)| node);
        Ok(if limit == 0 {
            iter.collect()
        } else {
            iter.take(limit).collect()
        })
    }

    fn content_fingerprint(&self, node: &NodeId) -> GraphResult<String> {
        let state = self.state.borrow();
        if state.failing_fingerprints.contains(node) {
            return Err(GraphError::Injected(format!("fingerprint of {node}")));
        }
        state
            .commits
            .get(node)
            .map(|entry| entry.fingerprint.clone())
            .ok_or_else(|| GraphError::RefNotFound(node.to_string()))
    }

    fn list_annotated_nodes(&self) -> GraphResult<BTreeSet<NodeId>> {
        Ok(self.state.borrow().annotations.keys().cloned().collect())
    }

    fn read_annotation(&self, node: &NodeId) -> GraphResult<Option<String>> {
        Ok(self.state.borrow().annotations.get(node).cloned())
    }

    fn write_annotation(&self, node: &NodeId, payload: &[u8]) -> GraphResult<()> {
        let mut state = self.state.borrow_mut();
        if state.failing_writes.contains(node) {
            return Err(GraphError::Injected(format!("write to {node}")));
        }
        let document = String::from_utf8(payload.to_vec())
            .map_err(|err| GraphError::InvalidOutput(err.to_string()))?;
        state.annotations.insert(node.clone(), document);
        state.writes += 1;
        Ok(())
    }

    fn remove_annotation(&self, node: &NodeId) -> GraphResult<()> {
        let mut state = self.state.borrow_mut();
        if state.failing_removes.contains(node) {
            return Err(GraphError::Injected(format!("remove of {node}")));
        }
        if state.annotations.remove(node).is_some() {
            state.removes += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::InMemoryGraph;
    use crate::graph::{GraphError, GraphQueryFacade, NodeId};

    #[test]
    fn ancestors_are_most_recent_first_and_limited() {
        let graph = InMemoryGraph::new();
        graph.commit("c1", &[], "p1");
        graph.commit("c2", &["c1"], "p2");
        graph.commit("c3", &["c2"], "p3");

        let all = graph.enumerate_ancestors(&NodeId::from("c3"), 0).unwrap();
        assert_eq!(
            all,
            vec![NodeId::from("c3"), NodeId::from("c2"), NodeId::from("c1")]
        );
        let limited = graph.enumerate_ancestors(&NodeId::from("c3"), 2).unwrap();
        assert_eq!(limited, vec![NodeId::from("c3"), NodeId::from("c2")]);
    }

    #[test]
    fn detached_head_has_no_scope_label() {
        let graph = InMemoryGraph::new();
        graph.commit("c1", &[], "p1");
        graph.checkout("c1", None);
        assert!(matches!(
            graph.current_scope_label(),
            Err(GraphError::DetachedState)
        ));
    }

    #[test]
    fn resolves_unique_prefixes_only() {
        let graph = InMemoryGraph::new();
        graph.commit("abc111", &[], "p1");
        graph.commit("abc222", &[], "p2");
        assert_eq!(
            graph.resolve_identity("abc1").unwrap(),
            NodeId::from("abc111")
        );
        assert!(matches!(
            graph.resolve_identity("abc"),
            Err(GraphError::RefNotFound(_))
        ));

        graph.set_ref("release", "abc222");
        assert_eq!(
            graph.resolve_identity("release").unwrap(),
            NodeId::from("abc222")
        );
    }
}
