//! Git integration surface: the safe subprocess executor (C2), the
//! in-process fast reader (C3), the status aggregator (C4), and worktree
//! enumeration shared by C4's fallback path and the switch resolver (C6).

pub mod executor;
pub mod native;
pub mod status;
pub mod worktree;

pub use status::{RepoStatus, get_all_repo_status, get_repo_status};
pub use worktree::{Worktree, list_worktrees};

/// Workspace classification shared by the fast reader and its subprocess
/// fallback (spec §3/§4.3/§4.4): dirty beats stashed beats clean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkspaceState {
    #[default]
    Clean,
    Dirty,
    Stashed,
}

impl std::fmt::Display for WorkspaceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkspaceState::Clean => write!(f, "clean"),
            WorkspaceState::Dirty => write!(f, "dirty"),
            WorkspaceState::Stashed => write!(f, "stashed"),
        }
    }
}
