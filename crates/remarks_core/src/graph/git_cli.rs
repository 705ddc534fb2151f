//! `git` subprocess implementation of the graph facade.
//!
//! # Responsibility
//! - Translate facade queries into blocking `git` invocations.
//! - Store annotation records as git notes under `refs/notes/<notes_ref>`.
//!
//! # Invariants
//! - Every call runs with the discovered work tree as current directory.
//! - Missing notes are reported as absence, never as errors.

use super::{GraphError, GraphQueryFacade, GraphResult, NodeId};
use log::{debug, warn};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

struct GitOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

/// Graph facade backed by the `git` binary on PATH.
#[derive(Debug, Clone)]
pub struct GitCliGraph {
    work_dir: PathBuf,
    notes_ref: String,
}

impl GitCliGraph {
    /// Binds to the repository containing `work_dir`.
    ///
    /// # Errors
    /// - `NotARepository` when `work_dir` is not inside a git work tree.
    pub fn discover(
        work_dir: impl Into<PathBuf>,
        notes_ref: impl Into<String>,
    ) -> GraphResult<Self> {
        let graph = Self {
            work_dir: work_dir.into(),
            notes_ref: notes_ref.into(),
        };
        match graph.git(&["rev-parse", "--is-inside-work-tree"]) {
            Ok(output) if output.status.success() && output.stdout.trim() == "true" => Ok(graph),
            Ok(_) => Err(GraphError::NotARepository),
            Err(GraphError::Io(err)) => Err(GraphError::Io(err)),
            Err(_) => Err(GraphError::NotARepository),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn notes_ref(&self) -> &str {
        &self.notes_ref
    }

    /// Absolute path of the repository's git directory.
    pub fn git_dir(&self) -> GraphResult<PathBuf> {
        self.run(&["rev-parse", "--absolute-git-dir"])
            .map(PathBuf::from)
    }

    fn notes_arg(&self) -> String {
        format!("--ref={}", self.notes_ref)
    }

    fn git(&self, args: &[&str]) -> GraphResult<GitOutput> {
        self.git_with_stdin(args, None)
    }

    fn git_with_stdin(&self, args: &[&str], stdin: Option<&[u8]>) -> GraphResult<GitOutput> {
        let started_at = Instant::now();
        let mut command = Command::new("git");
        command
            .args(args)
            .current_dir(&self.work_dir)
            // Absence checks match git's untranslated messages.
            .env("LC_ALL", "C")
            .env_remove("LANGUAGE")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = command.spawn()?;
        let output = match (stdin, child.stdin.take()) {
            (Some(payload), Some(mut pipe)) => std::thread::scope(|scope| {
                let writer = scope.spawn(move || pipe.write_all(payload));
                let output = child.wait_with_output();
                match writer.join() {
                    Ok(Err(err)) if err.kind() != std::io::ErrorKind::BrokenPipe => {
                        warn!(
                            "event=git_exec module=graph status=error stage=stdin error={}",
                            err
                        );
                    }
                    _ => {}
                }
                output
            })?,
            _ => child.wait_with_output()?,
        };

        debug!(
            "event=git_exec module=graph status={} cmd={} exit={} duration_ms={}",
            if output.status.success() { "ok" } else { "error" },
            args.first().copied().unwrap_or_default(),
            output.status.code().unwrap_or(-1),
            started_at.elapsed().as_millis()
        );

        Ok(GitOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Runs git and returns trimmed stdout, failing on non-zero exit.
    fn run(&self, args: &[&str]) -> GraphResult<String> {
        let output = self.git(args)?;
        if !output.status.success() {
            return Err(command_failed(args, output));
        }
        Ok(output.stdout.trim().to_string())
    }

    fn run_with_stdin(&self, args: &[&str], stdin: &[u8]) -> GraphResult<String> {
        let output = self.git_with_stdin(args, Some(stdin))?;
        if !output.status.success() {
            return Err(command_failed(args, output));
        }
        Ok(output.stdout.trim().to_string())
    }
}

fn command_failed(args: &[&str], output: GitOutput) -> GraphError {
    let stderr = if output.stderr.is_empty() {
        format!("exit status {}", output.status.code().unwrap_or(-1))
    } else {
        output.stderr
    };
    GraphError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr,
    }
}

fn split_lines(output: &str) -> Vec<NodeId> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(NodeId::from)
        .collect()
}

impl GraphQueryFacade for GitCliGraph {
    fn resolve_identity(&self, reference: &str) -> GraphResult<NodeId> {
        let rev = format!("{reference}^{{commit}}");
        let output = self.git(&["rev-parse", "--verify", "--quiet", rev.as_str()])?;
        let sha = output.stdout.trim();
        if !output.status.success() || sha.is_empty() {
            return Err(GraphError::RefNotFound(reference.to_string()));
        }
        Ok(NodeId::from(sha))
    }

    fn current_head(&self) -> GraphResult<NodeId> {
        self.resolve_identity("HEAD")
    }

    fn current_scope_label(&self) -> GraphResult<String> {
        let args = ["symbolic-ref", "--short", "-q", "HEAD"];
        let output = self.git(&args)?;
        match output.status.code() {
            Some(0) => Ok(output.stdout.trim().to_string()),
            Some(1) => Err(GraphError::DetachedState),
            _ => Err(command_failed(&args, output)),
        }
    }

    fn is_ancestor(&self, candidate: &NodeId, of: &NodeId) -> GraphResult<bool> {
        let args = ["merge-base", "--is-ancestor", candidate.as_str(), of.as_str()];
        let output = self.git(&args)?;
        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(command_failed(&args, output)),
        }
    }

    fn enumerate_ancestors(&self, from: &NodeId, limit: usize) -> GraphResult<Vec<NodeId>> {
        let limit_text = limit.to_string();
        let mut args = vec!["rev-list"];
        if limit > 0 {
            args.extend(["-n", limit_text.as_str()]);
        }
        args.push(from.as_str());
        Ok(split_lines(&self.run(&args)?))
    }

    fn content_fingerprint(&self, node: &NodeId) -> GraphResult<String> {
        let args = ["diff-tree", "-p", "--root", node.as_str()];
        let output = self.git(&args)?;
        if !output.status.success() {
            return Err(command_failed(&args, output));
        }
        if output.stdout.trim().is_empty() {
            return Ok(String::new());
        }

        let patch_id = self.run_with_stdin(&["patch-id", "--stable"], output.stdout.as_bytes())?;
        // Output format: `<patch-id> <commit-id>`.
        Ok(patch_id
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string())
    }

    fn list_annotated_nodes(&self) -> GraphResult<BTreeSet<NodeId>> {
        let notes_arg = self.notes_arg();
        let args = ["notes", notes_arg.as_str(), "list"];
        let output = self.git(&args)?;
        if !output.status.success() {
            let stderr = output.stderr.to_ascii_lowercase();
            if stderr.contains("no notes") || stderr.contains("does not have any notes") {
                return Ok(BTreeSet::new());
            }
            return Err(command_failed(&args, output));
        }

        // Format: `<note-object> <annotated-object>` per line.
        Ok(output
            .stdout
            .lines()
            .filter_map(|line| line.split_whitespace().nth(1))
            .map(NodeId::from)
            .collect())
    }

    fn read_annotation(&self, node: &NodeId) -> GraphResult<Option<String>> {
        let notes_arg = self.notes_arg();
        let args = ["notes", notes_arg.as_str(), "show", node.as_str()];
        let output = self.git(&args)?;
        if output.status.success() {
            return Ok(Some(output.stdout));
        }
        if output.stderr.to_ascii_lowercase().contains("no note found") {
            return Ok(None);
        }
        Err(command_failed(&args, output))
    }

    fn write_annotation(&self, node: &NodeId, payload: &[u8]) -> GraphResult<()> {
        // `notes add -F` strips blank-line runs; a blob attached with `-C`
        // is stored byte for byte.
        let blob = self.run_with_stdin(&["hash-object", "-w", "--stdin"], payload)?;
        if blob.is_empty() {
            return Err(GraphError::InvalidOutput(
                "hash-object returned no object id".to_string(),
            ));
        }
        let notes_arg = self.notes_arg();
        self.run(&[
            "notes",
            notes_arg.as_str(),
            "add",
            "-f",
            "-C",
            blob.as_str(),
            node.as_str(),
        ])?;
        Ok(())
    }

    fn remove_annotation(&self, node: &NodeId) -> GraphResult<()> {
        let notes_arg = self.notes_arg();
        self.run(&[
            "notes",
            notes_arg.as_str(),
            "remove",
            "--ignore-missing",
            node.as_str(),
        ])?;
        Ok(())
    }

    fn short_identity(&self, node: &NodeId) -> String {
        self.run(&["rev-parse", "--short", node.as_str()])
            .unwrap_or_else(|_| node.short().to_string())
    }
}
