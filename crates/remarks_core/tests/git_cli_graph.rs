//! Runs against real temporary repositories; each test returns early when
//! `git` is not on PATH.

use chrono::{TimeZone, Utc};
use remarks_core::{
    GitCliGraph, GraphError, GraphQueryFacade, NodeId, Remark, RemarkKind, RemarkStore,
};
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const NOTES_REF: &str = "remarks-test";

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git should spawn");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn commit_file(dir: &Path, name: &str, content: &str, message: &str) -> NodeId {
    fs::write(dir.join(name), content).expect("fixture file should be written");
    git(dir, &["add", name]);
    git(dir, &["commit", "-q", "-m", message]);
    NodeId::from(git(dir, &["rev-parse", "HEAD"]))
}

fn init_repo() -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    git(dir.path(), &["init", "-q"]);
    git(dir.path(), &["symbolic-ref", "HEAD", "refs/heads/main"]);
    // `git notes add` commits too, so identity must live in the repo config.
    git(dir.path(), &["config", "user.name", "Remarks Test"]);
    git(dir.path(), &["config", "user.email", "remarks@example.com"]);
    git(dir.path(), &["config", "commit.gpgsign", "false"]);
    dir
}

#[test]
fn discover_rejects_plain_directories() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().expect("temp dir should be created");
    assert!(matches!(
        GitCliGraph::discover(dir.path(), NOTES_REF),
        Err(GraphError::NotARepository)
    ));
}

#[test]
fn identity_scope_and_ancestry_queries() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    let c1 = commit_file(repo.path(), "a.txt", "one\n", "first");
    let c2 = commit_file(repo.path(), "a.txt", "two\n", "second");
    let graph = GitCliGraph::discover(repo.path(), NOTES_REF)
        .expect("temp repo should be discovered");

    assert_eq!(graph.current_head().expect("HEAD should resolve"), c2);
    assert_eq!(graph.resolve_identity(&c1.as_str()[..10]).expect("revision should resolve"), c1);
    assert!(matches!(
        graph.resolve_identity("no-such-ref"),
        Err(GraphError::RefNotFound(_))
    ));
    assert_eq!(graph.current_scope_label().expect("branch should resolve"), "main");
    assert!(graph.is_ancestor(&c1, &c2).expect("ancestry query should succeed"));
    assert!(graph.is_ancestor(&c2, &c2).expect("ancestry query should succeed"));
    assert!(!graph.is_ancestor(&c2, &c1).expect("ancestry query should succeed"));
    assert_eq!(
        graph.enumerate_ancestors(&c2, 0).expect("ancestor walk should succeed"),
        vec![c2.clone(), c1.clone()]
    );
    assert_eq!(
        graph
            .enumerate_ancestors(&c2, 1)
            .expect("ancestor walk should succeed"),
        vec![c2.clone()]
    );
    assert!(graph.git_dir().expect("git dir should resolve").ends_with(".git"));

    git(repo.path(), &["checkout", "-q", "--detach", c1.as_str()]);
    assert!(matches!(
        graph.current_scope_label(),
        Err(GraphError::DetachedState)
    ));
}

#[test]
fn cherry_picked_commit_shares_fingerprint() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    let base = commit_file(repo.path(), "a.txt", "base\n", "base");
    let original = commit_file(repo.path(), "b.txt", "feature\n", "feature");
    git(repo.path(), &["checkout", "-q", "-b", "other", base.as_str()]);
    commit_file(repo.path(), "c.txt", "unrelated\n", "unrelated");
    git(repo.path(), &["cherry-pick", original.as_str()]);
    let picked = NodeId::from(git(repo.path(), &["rev-parse", "HEAD"]));
    git(repo.path(), &["commit", "-q", "--allow-empty", "-m", "empty"]);
    let empty = NodeId::from(git(repo.path(), &["rev-parse", "HEAD"]));
    let graph = GitCliGraph::discover(repo.path(), NOTES_REF)
        .expect("temp repo should be discovered");

    assert_ne!(original, picked);
    let fingerprint = graph.content_fingerprint(&original).expect("fingerprint should compute");
    assert!(!fingerprint.is_empty());
    assert_eq!(
        graph.content_fingerprint(&picked)
            .expect("fingerprint should compute"),
        fingerprint
    );
    assert_ne!(graph.content_fingerprint(&base).expect("fingerprint should compute"), fingerprint);
    assert_eq!(graph.content_fingerprint(&empty).expect("fingerprint should compute"), "");
}

#[test]
fn annotations_roundtrip_through_git_notes() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    let c1 = commit_file(repo.path(), "a.txt", "one\n", "first");
    let graph = GitCliGraph::discover(repo.path(), NOTES_REF)
        .expect("temp repo should be discovered");

    assert!(graph.list_annotated_nodes().expect("annotated nodes should list").is_empty());
    assert_eq!(graph.read_annotation(&c1).expect("annotation read should succeed"), None);
    graph.remove_annotation(&c1).expect("annotation removal should succeed");

    graph.write_annotation(&c1, b"remarks: []\n").expect("annotation write should succeed");
    graph.write_annotation(&c1, b"first: overwritten\n").expect("annotation write should succeed");
    assert_eq!(
        graph.read_annotation(&c1).expect("annotation read should succeed").as_deref(),
        Some("first: overwritten\n")
    );
    assert!(graph.list_annotated_nodes().expect("annotated nodes should list").contains(&c1));
    assert!(!git(repo.path(), &["notes", "--ref", NOTES_REF, "list"]).is_empty());

    graph.remove_annotation(&c1).expect("annotation removal should succeed");
    assert_eq!(graph.read_annotation(&c1).expect("annotation read should succeed"), None);
}

#[test]
fn store_persists_remarks_as_notes() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    let c1 = commit_file(repo.path(), "a.txt", "one\n", "first");
    let graph = GitCliGraph::discover(repo.path(), NOTES_REF)
        .expect("temp repo should be discovered");
    let store = RemarkStore::new(&graph);
    let at = Utc.with_ymd_and_hms(2024, 9, 1, 7, 45, 0).single().expect("fixture timestamp should be valid");
    let remark =
        Remark::with_id("c0ffee00", RemarkKind::Todo, "main", "fix X\nand Y", at)
            .expect("fixture remark should be valid");

    store.add(&c1, remark.clone()).expect("add should succeed");

    let note = git(
        repo.path(),
        &["notes", "--ref", NOTES_REF, "show", c1.as_str()],
    );
    assert!(note.starts_with("remarks:"));
    assert!(note.contains("id: c0ffee00"));
    let loaded = store.get(&c1).expect("get should succeed");
    assert_eq!(loaded.as_slice(), &[remark]);

    assert!(store.resolve(&c1, "c0ffee00").expect("resolve should succeed"));
    assert!(graph.list_annotated_nodes().expect("annotated nodes should list").is_empty());
}

#[test]
fn blank_line_runs_survive_the_notes_round_trip() {
    if !git_available() {
        return;
    }
    let repo = init_repo();
    let c1 = commit_file(repo.path(), "a.txt", "one\n", "first");
    let c2 = commit_file(repo.path(), "a.txt", "two\n", "second");
    let graph = GitCliGraph::discover(repo.path(), NOTES_REF)
        .expect("temp repo should be discovered");

    let raw = "\n\nleading\n\n\n\ntrailing  \n\n";
    graph
        .write_annotation(&c1, raw.as_bytes())
        .expect("annotation write should succeed");
    assert_eq!(
        graph
            .read_annotation(&c1)
            .expect("annotation read should succeed")
            .as_deref(),
        Some(raw)
    );

    let store = RemarkStore::new(&graph);
    let at = Utc.with_ymd_and_hms(2024, 9, 2, 8, 0, 0).single().expect("fixture timestamp should be valid");
    let remark = Remark::with_id("0badcafe", RemarkKind::Thought, "main", "a\n\n\nb", at)
        .expect("fixture remark should be valid");
    store.add(&c2, remark).expect("add should succeed");

    let loaded = store.get(&c2).expect("get should succeed");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.as_slice()[0].body, "a\n\n\nb");
}
