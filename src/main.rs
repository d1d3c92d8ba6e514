//! `gman` binary entrypoint: logging setup, argument parsing, dispatch.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use gman::batch::operations::{
    BranchCleanMergedOperation, BranchCreateOperation, BranchSwitchOperation, CommitOperation,
    PullOperation, PushOperation, StashClearOperation, StashPopOperation, StashSaveOperation, sync_operation,
};
use gman::batch::{BatchOperation, BatchReport, run_batch};
use gman::config::ConfigStore;
use gman::error::{GmanError, GmanResult};
use gman::styling::{eprintln, error_message, hint_message, print, println, success_message};
use gman::switch;

use cli::{BranchAction, Cli, Commands, FindKind, GroupCommand, RepoCommand, StashAction, ToolsCommand, WorkCommand};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(log_level).init();

    if let Err(e) = gman::git::executor::ensure_git_available() {
        eprintln!("{}", error_message(&e.to_string()));
        return ExitCode::from(e.exit_code() as u8);
    }

    let store = match ConfigStore::load_default() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{}", error_message(&e.to_string()));
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    match dispatch(&store, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", error_message(&e.to_string()));
            for hint in e.suggestions() {
                eprintln!("{}", hint_message(&hint));
            }
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn dispatch(store: &ConfigStore, command: Commands) -> GmanResult<()> {
    match command {
        Commands::Repo(cmd) => dispatch_repo(store, cmd),
        Commands::Work(cmd) => dispatch_work(store, cmd),
        Commands::Switch { alias, recent, limit } => dispatch_switch(store, alias, recent, limit),
        Commands::Tools(cmd) => dispatch_tools(cmd),
    }
}

fn dispatch_repo(store: &ConfigStore, cmd: RepoCommand) -> GmanResult<()> {
    match cmd {
        RepoCommand::Add { alias, path } => {
            let path = path.unwrap_or(std::env::current_dir()?);
            store.add_repository(&alias, &path)?;
            println!("{}", success_message(&format!("Added repository: {alias} -> {}", path.display())));
            Ok(())
        }
        RepoCommand::Remove { alias } => {
            store.remove_repository(&alias)?;
            println!("{}", success_message(&format!("Removed repository: {alias}")));
            Ok(())
        }
        RepoCommand::List => {
            let repos = store.get_repositories();
            if repos.is_empty() {
                println!("no repositories configured");
                return Ok(());
            }
            for (alias, path) in &repos {
                println!("{alias}\t{}", path.display());
            }
            Ok(())
        }
        RepoCommand::Recent { limit } => {
            let recent = store.get_recent_usage();
            if recent.is_empty() {
                println!("no recent activity");
                return Ok(());
            }
            for entry in recent.into_iter().take(limit) {
                println!("{}\t{}", entry.alias, entry.access_time);
            }
            Ok(())
        }
        RepoCommand::Group(group_cmd) => dispatch_group(store, group_cmd),
    }
}

fn dispatch_group(store: &ConfigStore, cmd: GroupCommand) -> GmanResult<()> {
    match cmd {
        GroupCommand::Create { name, description, members } => {
            store.create_group(&name, &description, &members)?;
            println!("{}", success_message(&format!("Created group: {name}")));
            Ok(())
        }
        GroupCommand::Delete { name } => {
            store.delete_group(&name)?;
            println!("{}", success_message(&format!("Deleted group: {name}")));
            Ok(())
        }
        GroupCommand::List => {
            let groups = store.get_groups();
            if groups.is_empty() {
                println!("no groups configured");
                return Ok(());
            }
            for (name, group) in &groups {
                println!("{name}\t{}\t{}", group.description, group.repositories.join(","));
            }
            Ok(())
        }
        GroupCommand::Add { name, members } => {
            store.add_to_group(&name, &members)?;
            println!("{}", success_message(&format!("Added to group: {name}")));
            Ok(())
        }
        GroupCommand::Remove { name, members } => {
            store.remove_from_group(&name, &members)?;
            println!("{}", success_message(&format!("Removed from group: {name}")));
            Ok(())
        }
    }
}

/// Resolve the repository set for a batch/status operation: the named
/// group's members, or the full table (spec §4.5 step 1).
fn resolve_repo_set(store: &ConfigStore, group: Option<&str>) -> GmanResult<Vec<(String, PathBuf)>> {
    match group {
        Some(name) => Ok(store
            .get_group_repositories(name)?
            .into_iter()
            .collect()),
        None => Ok(store.get_repositories().into_iter().collect()),
    }
}

fn dispatch_work(store: &ConfigStore, cmd: WorkCommand) -> GmanResult<()> {
    match cmd {
        WorkCommand::Status { verbose } => {
            let repos = resolve_repo_set(store, None)?;
            if repos.is_empty() {
                println!("no repositories configured");
                return Ok(());
            }
            let mut statuses = gman::git::get_all_repo_status(&repos, true);
            statuses.sort_by(|a, b| a.alias.cmp(&b.alias));

            let alias_width = gman::styling::max_display_width(statuses.iter().map(|s| s.alias.as_str()));
            let branch_width = gman::styling::max_display_width(statuses.iter().map(|s| s.branch.as_str()));
            for status in &statuses {
                print_status_line(status, verbose, alias_width, branch_width);
            }
            Ok(())
        }
        WorkCommand::Sync { group, dry_run, progress } => {
            let _ = progress;
            run_named_batch(store, group.as_deref(), dry_run, &sync_operation())
        }
        WorkCommand::Commit { message, add_all, group, dry_run } => {
            let op = CommitOperation { message, add_all };
            run_named_batch(store, group.as_deref(), dry_run, &op)
        }
        WorkCommand::Push { force, set_upstream, group, dry_run } => {
            let op = PushOperation { force, set_upstream };
            run_named_batch(store, group.as_deref(), dry_run, &op)
        }
        WorkCommand::Pull { rebase, group, dry_run } => {
            let mode = if rebase { gman::config::SyncMode::Rebase } else { gman::config::SyncMode::FfOnly };
            let op = PullOperation { mode };
            run_named_batch(store, group.as_deref(), dry_run, &op)
        }
        WorkCommand::Stash { action } => dispatch_stash(store, action),
        WorkCommand::Branch { action } => dispatch_branch(store, action),
    }
}

fn dispatch_stash(store: &ConfigStore, action: StashAction) -> GmanResult<()> {
    match action {
        StashAction::Save { message, group } => {
            let op = StashSaveOperation { message };
            run_named_batch(store, group.as_deref(), false, &op)
        }
        StashAction::Pop { group } => run_named_batch(store, group.as_deref(), false, &StashPopOperation),
        StashAction::List { group } => {
            let repos = resolve_repo_set(store, group.as_deref())?;
            for (alias, path) in repos {
                if let Ok(out) = gman::git::executor::run(&path, &["stash", "list"])
                    && !out.is_empty()
                {
                    println!("{alias}:\n{out}");
                }
            }
            Ok(())
        }
        StashAction::Clear { group } => run_named_batch(store, group.as_deref(), false, &StashClearOperation),
    }
}

fn dispatch_branch(store: &ConfigStore, action: BranchAction) -> GmanResult<()> {
    match action {
        BranchAction::List { group } => {
            let repos = resolve_repo_set(store, group.as_deref())?;
            for (alias, path) in repos {
                if let Ok(out) = gman::git::executor::run(&path, &["branch", "--list"]) {
                    println!("{alias}:\n{out}");
                }
            }
            Ok(())
        }
        BranchAction::Create { name, group, dry_run } => {
            let op = BranchCreateOperation { name };
            run_named_batch(store, group.as_deref(), dry_run, &op)
        }
        BranchAction::Switch { name, group, dry_run } => {
            let op = BranchSwitchOperation { name };
            run_named_batch(store, group.as_deref(), dry_run, &op)
        }
        BranchAction::Clean { group, dry_run } => {
            run_named_batch(store, group.as_deref(), dry_run, &BranchCleanMergedOperation)
        }
    }
}

fn run_named_batch(store: &ConfigStore, group: Option<&str>, dry_run: bool, op: &dyn BatchOperation) -> GmanResult<()> {
    let repos = resolve_repo_set(store, group)?;
    if repos.is_empty() {
        println!("no repositories configured");
        return Ok(());
    }
    let concurrency = store.get_settings().batch_concurrency();
    let report = run_batch(&repos, op, dry_run, concurrency);
    print_batch_report(&report);
    if report.any_failed() {
        Err(GmanError::Internal { cause: format!("{} failed in one or more repositories", op.name()) })
    } else {
        Ok(())
    }
}

fn print_batch_report(report: &BatchReport) {
    for result in &report.results {
        match &result.outcome {
            Ok(msg) => println!("{}: {}", result.alias, msg),
            Err(e) => eprintln!("{}", error_message(&format!("{}: {e}", result.alias))),
        }
    }
    let suffix = if report.dry_run { " (dry run)" } else { "" };
    println!(
        "{}",
        success_message(&format!(
            "{} successful, {} failed{suffix}",
            report.successful_count(),
            report.failed_count()
        ))
    );
}

fn print_status_line(status: &gman::git::RepoStatus, verbose: bool, alias_width: usize, branch_width: usize) {
    use gman::styling::{ADDITION, DELETION, pad_to_width};

    if let Some(err) = &status.inspection_error {
        eprintln!("{}", error_message(&format!("{}: {err}", status.alias)));
        return;
    }
    let workspace = status.workspace.map(|w| w.to_string()).unwrap_or_default();
    print!(
        "{}  {}  {ADDITION}+{}{ADDITION:#} {DELETION}-{}{DELETION:#}",
        pad_to_width(&status.alias, alias_width),
        pad_to_width(&format!("{} ({workspace})", status.branch), branch_width + workspace.len() + 3),
        status.ahead,
        status.behind
    );
    if status.files_changed > 0 {
        print!("  {} changed", status.files_changed);
    }
    println!();
    if verbose && let Some(summary) = &status.last_commit_summary {
        println!("    {summary}");
    }
}

fn dispatch_switch(store: &ConfigStore, alias: Option<String>, recent: bool, limit: Option<usize>) -> GmanResult<()> {
    use std::io::Write;
    let target = switch::resolve(store, alias.as_deref(), recent, limit)?;
    print!("{}", switch::shell_directive(&target.path));
    std::io::stdout().flush().ok();
    Ok(())
}

fn dispatch_tools(cmd: ToolsCommand) -> GmanResult<()> {
    let ToolsCommand::Find { kind } = cmd;
    let query = match kind {
        FindKind::File { query } | FindKind::Content { query } | FindKind::Commit { query } => query,
    };
    let _ = query;
    Err(GmanError::ToolNotAvailable {
        tool: "tools find (external finder integration is out of core scope)".to_string(),
    })
}
