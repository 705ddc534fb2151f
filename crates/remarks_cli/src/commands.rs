//! Subcommand handlers.
//!
//! # Responsibility
//! - Translate parsed arguments into store/service calls.
//! - Print user-facing results; errors bubble up to `main`.
//!
//! # Invariants
//! - Not-found and no-match outcomes print a message and succeed.
//! - Validation and resolution failures return errors (non-zero exit).

use crate::cli::{
    AddArgs, EditArgs, MigrateBranchArgs, MigrateRewritesArgs, RecoverArgs, ResolveArgs, ShowArgs,
};
use crate::prompt::PromptConfirm;
use crate::render::{plural, remark_block};
use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use log::info;
use remarks_core::editor::{edit_in_editor, parse_document, render_edit_template, render_new_template};
use remarks_core::hook::{install_post_rewrite_hook, HookInstall};
use remarks_core::{
    GitCliGraph, GraphError, GraphQueryFacade, MigrationService, NodeId, RecoveryService, Remark,
    RemarkKind, RemarkStore, RemarksConfig,
};
use std::io;

/// Repository handle plus effective configuration for one invocation.
pub struct Session {
    pub graph: GitCliGraph,
    pub config: RemarksConfig,
}

impl Session {
    fn store(&self) -> RemarkStore<&GitCliGraph> {
        RemarkStore::new(&self.graph)
    }

    fn migration(&self) -> MigrationService<&GitCliGraph> {
        MigrationService::new(self.store())
    }
}

pub fn list(session: &Session) -> Result<()> {
    let graph = &session.graph;
    let branch = graph
        .current_scope_label()
        .context("cannot determine current branch")?;
    let head = graph.current_head().context("cannot get HEAD")?;

    let mut visible: Vec<(NodeId, Remark)> = Vec::new();
    for (node, collection) in session.store().list_all_with_remarks()? {
        let reachable = node == head || graph.is_ancestor(&node, &head).unwrap_or(false);
        if !reachable {
            continue;
        }
        for remark in collection.filter_active_for_branch(&branch) {
            visible.push((node.clone(), remark.clone()));
        }
    }

    if visible.is_empty() {
        println!("{branch} (no active remarks)");
        return Ok(());
    }

    visible.sort_by(|(_, a), (_, b)| b.created_at.cmp(&a.created_at));
    println!(
        "{branch} ({} active remark{})\n",
        visible.len(),
        plural(visible.len())
    );
    let now = Utc::now();
    for (node, remark) in &visible {
        let mut context = graph.short_identity(node);
        if *node == head {
            context.push_str(" (HEAD)");
        }
        println!("{}", remark_block(remark, &context, now));
    }
    Ok(())
}

pub fn add(session: &Session, args: AddArgs) -> Result<()> {
    let graph = &session.graph;
    let mut kind: RemarkKind = args.kind.parse()?;
    let branch = match args.branch {
        Some(branch) => branch,
        None => graph.current_scope_label().map_err(|err| match err {
            GraphError::DetachedState => anyhow!(
                "not on a branch; use --branch to specify: git remarks add --branch <name> \"body\""
            ),
            other => anyhow!(other),
        })?,
    };

    let (reference, mut body) = split_add_args(graph, &args.args);
    let node = graph.resolve_identity(&reference)?;
    let short = graph.short_identity(&node);

    if body.trim().is_empty() || args.edit {
        let template = render_new_template(&short, &branch, kind, &body);
        let document = parse_document(&edit_in_editor(&session.config.editor, &template)?);
        body = document.body;
        kind = document.kind.unwrap_or(kind);
    }

    let remark = Remark::new(kind, branch, body)?;
    let remark_id = remark.id.clone();
    session
        .store()
        .add(&node, remark)
        .context("failed to add remark")?;
    println!("✓ Added remark [{remark_id}] to {short} ({kind})");
    Ok(())
}

/// Splits `[COMMIT] [BODY...]`. A lone argument counts as the commit only
/// when it resolves to one.
fn split_add_args(graph: &impl GraphQueryFacade, args: &[String]) -> (String, String) {
    match args {
        [] => ("HEAD".to_string(), String::new()),
        [only] if graph.resolve_identity(only).is_ok() => (only.clone(), String::new()),
        [only] => ("HEAD".to_string(), only.clone()),
        [commit, rest @ ..] => (commit.clone(), rest.join(" ")),
    }
}

pub fn show(session: &Session, args: ShowArgs) -> Result<()> {
    let graph = &session.graph;
    let node = graph.resolve_identity(&args.commit)?;
    let short = graph.short_identity(&node);
    let collection = session
        .store()
        .get(&node)
        .context("failed to get remarks")?;

    if collection.is_empty() {
        println!("{short} — no remarks");
        return Ok(());
    }

    let head_marker = if args.commit == "HEAD" { " (HEAD)" } else { "" };
    println!(
        "{short}{head_marker} — {} remark{}\n",
        collection.len(),
        plural(collection.len())
    );
    let now = Utc::now();
    for remark in &collection {
        let context = if remark.is_active() {
            remark.branch.clone()
        } else {
            format!("{} [{}]", remark.branch, remark.state)
        };
        println!("{}", remark_block(remark, &context, now));
    }
    Ok(())
}

pub fn resolve(session: &Session, args: ResolveArgs) -> Result<()> {
    let store = session.store();
    let Some((node, _)) = store
        .find_by_id(&args.id)
        .context("failed to find remark")?
    else {
        println!("remark not found: {}", args.id);
        return Ok(());
    };

    let result = if args.keep {
        store.mark_resolved(&node, &args.id)
    } else {
        store.resolve(&node, &args.id)
    };
    let found = result.context("failed to resolve remark")?;

    if found {
        println!("✓ Resolved [{}]", args.id);
    } else {
        println!("remark not found: {}", args.id);
    }
    Ok(())
}

pub fn edit(session: &Session, args: EditArgs) -> Result<()> {
    let store = session.store();
    let Some((node, mut remark)) = store
        .find_by_id(&args.id)
        .context("failed to find remark")?
    else {
        println!("remark not found: {}", args.id);
        return Ok(());
    };

    let short = session.graph.short_identity(&node);
    let template = render_edit_template(&short, &remark);
    let document = parse_document(&edit_in_editor(&session.config.editor, &template)?);
    if document.body.is_empty() {
        bail!("remark body cannot be empty");
    }

    remark.body = document.body;
    if let Some(kind) = document.kind {
        remark.kind = kind;
    }
    store
        .update(&node, remark)
        .context("failed to update remark")?;
    println!("✓ Updated [{}]", args.id);
    Ok(())
}

pub fn init(session: &Session) -> Result<()> {
    let git_dir = session.graph.git_dir()?;
    match install_post_rewrite_hook(&git_dir)? {
        HookInstall::Installed(_) => println!("✓ git-remarks hook installed"),
        HookInstall::Appended(_) => {
            println!("✓ git-remarks hook appended to existing post-rewrite hook")
        }
        HookInstall::AlreadyInstalled(_) => println!("✓ git-remarks hook already installed"),
    }
    Ok(())
}

pub fn recover(session: &Session, args: RecoverArgs) -> Result<()> {
    let head = session.graph.current_head().context("cannot get HEAD")?;
    let limit = args
        .limit
        .unwrap_or(session.config.recovery_search_limit);
    let service = RecoveryService::new(session.migration(), limit);

    let orphans = service
        .find_orphans(&head)
        .context("failed to list remarks")?;
    if orphans.is_empty() {
        println!("No orphaned remarks found");
        return Ok(());
    }
    println!("Found {} orphaned commit(s) with remarks\n", orphans.len());

    let stdin = io::stdin();
    let mut confirm = PromptConfirm::new(stdin.lock(), io::stdout());
    let report = service
        .run(&head, &mut confirm)
        .context("failed to list remarks")?;

    if report.recovered() > 0 {
        println!("Recovered remarks from {} commit(s)", report.recovered());
    }
    Ok(())
}

pub fn migrate_branch(session: &Session, args: MigrateBranchArgs) -> Result<()> {
    let report = session
        .migration()
        .rename_branch_everywhere(&args.old_name, &args.new_name)
        .context("failed to list remarks")?;

    for (node, err) in &report.failures {
        eprintln!("warning: failed to update remarks on {}: {err}", node.short());
    }
    if report.updated == 0 && report.failures.is_empty() {
        println!("No remarks found for branch '{}'", args.old_name);
        return Ok(());
    }
    if report.updated > 0 {
        println!(
            "✓ Updated {} remark{} from '{}' to '{}'",
            report.updated,
            plural(report.updated),
            args.old_name,
            args.new_name
        );
    }
    if !report.failures.is_empty() {
        bail!(
            "{} collection(s) could not be updated; re-run to retry",
            report.failures.len()
        );
    }
    Ok(())
}

pub fn migrate_rewrites(session: &Session, args: MigrateRewritesArgs) -> Result<()> {
    info!(
        "event=rewrite_hook module=cli status=start type={}",
        args.rewrite_type.as_deref().unwrap_or("unknown")
    );
    let report = session
        .migration()
        .migrate_rewrites(io::stdin().lock())
        .context("failed to read rewrite list")?;

    for entry in &report.migrated {
        println!(
            "Migrated {} remark(s): {} → {}",
            entry.remarks,
            entry.source.short(),
            entry.target.short()
        );
    }
    for failure in &report.failures {
        eprintln!(
            "warning: failed to migrate remarks from {} to {}: {}",
            failure.source.short(),
            failure.target.short(),
            failure.error
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::split_add_args;
    use remarks_core::InMemoryGraph;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn lone_argument_is_commit_only_when_it_resolves() {
        let graph = InMemoryGraph::new();
        graph.commit("abc1234def", &[], "fp");
        graph.checkout("abc1234def", Some("main"));

        assert_eq!(
            split_add_args(&graph, &args(&["abc1234"])),
            ("abc1234".to_string(), String::new())
        );
        assert_eq!(
            split_add_args(&graph, &args(&["remember this"])),
            ("HEAD".to_string(), "remember this".to_string())
        );
    }

    #[test]
    fn extra_arguments_join_into_body() {
        let graph = InMemoryGraph::new();
        assert_eq!(
            split_add_args(&graph, &args(&["abc", "fix", "this"])),
            ("abc".to_string(), "fix this".to_string())
        );
        assert_eq!(
            split_add_args(&graph, &[]),
            ("HEAD".to_string(), String::new())
        );
    }
}
