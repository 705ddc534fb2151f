//! `git-remarks` entry point.
//!
//! # Responsibility
//! - Parse arguments, load configuration and bind to the current repository.
//! - Report failures as a single `error:` line with a non-zero exit code.
//!
//! # Invariants
//! - Logging problems never abort a command.
//! - `migrate-rewrites` exits quietly outside a repository; it runs from a hook.

mod cli;
mod commands;
mod prompt;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use commands::Session;
use log::info;
use remarks_core::{default_log_dir, init_logging, GitCliGraph, GraphError, RemarksConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = RemarksConfig::from_env().context("invalid configuration")?;
    if let Some(notes_ref) = cli.notes_ref {
        config.notes_ref = notes_ref;
    }

    let command = cli.command.unwrap_or(Command::List);
    let work_dir = std::env::current_dir().context("cannot read current directory")?;
    let graph = match GitCliGraph::discover(work_dir, config.notes_ref.clone()) {
        Ok(graph) => graph,
        Err(GraphError::NotARepository) if matches!(command, Command::MigrateRewrites(_)) => {
            return Ok(())
        }
        Err(err) => return Err(err.into()),
    };

    start_logging(&graph, &config);
    info!(
        "event=command_start module=cli status=ok command={}",
        command_name(&command)
    );

    let session = Session { graph, config };
    match command {
        Command::List => commands::list(&session),
        Command::Add(args) => commands::add(&session, args),
        Command::Show(args) => commands::show(&session, args),
        Command::Resolve(args) => commands::resolve(&session, args),
        Command::Edit(args) => commands::edit(&session, args),
        Command::Init => commands::init(&session),
        Command::Recover(args) => commands::recover(&session, args),
        Command::MigrateBranch(args) => commands::migrate_branch(&session, args),
        Command::MigrateRewrites(args) => commands::migrate_rewrites(&session, args),
    }
}

fn start_logging(graph: &GitCliGraph, config: &RemarksConfig) {
    let log_dir = match &config.log_dir {
        Some(dir) => dir.clone(),
        None => match graph.git_dir() {
            Ok(git_dir) => default_log_dir(&git_dir),
            Err(err) => {
                eprintln!("warning: logging disabled: {err}");
                return;
            }
        },
    };
    if let Err(err) = init_logging(&config.log_level, &log_dir) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::List => "list",
        Command::Add(_) => "add",
        Command::Show(_) => "show",
        Command::Resolve(_) => "resolve",
        Command::Edit(_) => "edit",
        Command::Init => "init",
        Command::Recover(_) => "recover",
        Command::MigrateBranch(_) => "migrate-branch",
        Command::MigrateRewrites(_) => "migrate-rewrites",
    }
}
