//! Command-line surface.

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "git-remarks",
    version,
    about = "Personal developer notes attached to git commits",
    long_about = "Personal developer notes attached to git commits.\n\n\
        Remarks are scoped to branches and survive rebases. They are stored as \
        git notes and stay local unless the notes ref is pushed."
)]
pub struct Cli {
    /// Notes ref holding remarks (overrides GIT_REMARKS_REF).
    #[arg(long = "ref", global = true, value_name = "REF")]
    pub notes_ref: Option<String>,

    /// Runs `list` when omitted.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List active remarks on the current branch.
    #[command(alias = "ls")]
    List,

    /// Add a remark to a commit (HEAD by default).
    Add(AddArgs),

    /// Show every remark on a commit.
    Show(ShowArgs),

    /// Resolve a remark by id.
    Resolve(ResolveArgs),

    /// Edit an existing remark in $EDITOR.
    Edit(EditArgs),

    /// Install the post-rewrite hook in this repository.
    Init,

    /// Recover orphaned remarks by matching commit content.
    Recover(RecoverArgs),

    /// Rename a branch label in all remarks.
    MigrateBranch(MigrateBranchArgs),

    /// Apply `<old> <new>` rewrite pairs from stdin (run by the hook).
    #[command(hide = true)]
    MigrateRewrites(MigrateRewritesArgs),
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// `[COMMIT] [BODY...]`; a single argument that resolves to a commit is
    /// taken as the commit and the editor opens for the body.
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,

    /// Remark type: thought, doubt, todo, decision.
    #[arg(short = 't', long = "type", default_value = "thought")]
    pub kind: String,

    /// Branch label, required on a detached HEAD.
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Open the editor even when a body is given.
    #[arg(short, long)]
    pub edit: bool,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    #[arg(default_value = "HEAD")]
    pub commit: String,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    pub id: String,

    /// Keep the remark in history with state `resolved` instead of removing it.
    #[arg(long)]
    pub keep: bool,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct RecoverArgs {
    /// Ancestors of HEAD searched per orphan; 0 searches the whole history.
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct MigrateBranchArgs {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Args, Debug)]
pub struct MigrateRewritesArgs {
    /// `amend` or `rebase`, as passed by git.
    pub rewrite_type: Option<String>,
}
