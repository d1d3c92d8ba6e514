//! Argument-parsing surface (spec §6 — "contracts only"; this module is the
//! one concrete realization of that contract).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gman")]
#[command(about = "A multi-repository Git assistant", long_about = None)]
#[command(version)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Increase log verbosity (can be repeated)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the repository registry and groups
    #[command(subcommand)]
    Repo(RepoCommand),

    /// Run status/sync/commit/push/pull/stash/branch across repositories
    #[command(subcommand)]
    Work(WorkCommand),

    /// Resolve a switch target and emit a shell directive
    Switch {
        /// Alias or worktree substring to match; omit to use recency order
        alias: Option<String>,

        /// Restrict to targets present in the recent-usage log
        #[arg(long)]
        recent: bool,

        /// Cap the candidate set before matching
        #[arg(long)]
        limit: Option<usize>,
    },

    /// External finders (out of core scope; interface only)
    #[command(subcommand)]
    Tools(ToolsCommand),
}

#[derive(Subcommand)]
pub enum RepoCommand {
    /// Register a repository
    Add {
        alias: String,
        /// Defaults to the current working directory
        #[arg(long)]
        path: Option<PathBuf>,
    },

    /// Unregister a repository (filesystem untouched)
    Remove { alias: String },

    /// Print alias -> path table
    List,

    /// Print the recent-usage log
    Recent {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Manage named groups
    #[command(subcommand)]
    Group(GroupCommand),
}

#[derive(Subcommand)]
pub enum GroupCommand {
    Create {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Member aliases
        members: Vec<String>,
    },
    Delete {
        name: String,
    },
    List,
    Add {
        name: String,
        members: Vec<String>,
    },
    Remove {
        name: String,
        members: Vec<String>,
    },
}

#[derive(Subcommand)]
pub enum WorkCommand {
    /// Run the status aggregator with fetch
    Status {
        #[arg(short, long)]
        verbose: bool,
    },

    /// Batch sync in ff-only mode
    Sync {
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        progress: bool,
    },

    /// Batch commit (only repos with changes)
    Commit {
        #[arg(short = 'm', long)]
        message: String,
        #[arg(short = 'a', long)]
        add_all: bool,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },

    /// Batch push (only repos ahead)
    Push {
        #[arg(short = 'f', long)]
        force: bool,
        #[arg(short = 'u', long)]
        set_upstream: bool,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },

    /// Batch pull
    Pull {
        #[arg(long)]
        rebase: bool,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },

    /// Batch stash management
    Stash {
        #[command(subcommand)]
        action: StashAction,
    },

    /// Branch operations
    Branch {
        #[command(subcommand)]
        action: BranchAction,
    },
}

#[derive(Subcommand)]
pub enum StashAction {
    Save {
        message: Option<String>,
        #[arg(long)]
        group: Option<String>,
    },
    Pop {
        #[arg(long)]
        group: Option<String>,
    },
    List {
        #[arg(long)]
        group: Option<String>,
    },
    Clear {
        #[arg(long)]
        group: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum BranchAction {
    List {
        #[arg(long)]
        group: Option<String>,
    },
    Create {
        name: String,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    Switch {
        name: String,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    Clean {
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum ToolsCommand {
    Find {
        #[command(subcommand)]
        kind: FindKind,
    },
}

#[derive(Subcommand)]
pub enum FindKind {
    File { query: String },
    Content { query: String },
    Commit { query: String },
}
