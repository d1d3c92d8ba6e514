//! The error taxonomy shared by every component (spec §7).
//!
//! Each variant is a stable identifier a caller can match on; `Display`
//! renders a human-facing message. Per-repo errors inside batch and
//! aggregate operations are attached to that repo's result rather than
//! propagated — only configuration errors and shell-integration errors are
//! operation-fatal (see [`crate::config`] and [`crate::switch`]).

use std::fmt;
use std::path::PathBuf;

pub type GmanResult<T> = Result<T, GmanError>;

#[derive(Debug, Clone)]
pub enum GmanError {
    ConfigNotFound { path: PathBuf },
    ConfigInvalid { path: PathBuf, cause: String },
    RepoNotFound { alias: String },
    NotAGitRepo { path: PathBuf },
    RepoAlreadyExists { alias: String },
    GroupNotFound { name: String },
    TaskNotFound { name: String },
    AmbiguousMatch { input: String, candidates: Vec<String> },
    NoMatch { input: String, closest: Option<String> },
    ShellIntegrationRequired,
    NetworkTimeout { cause: String },
    RemoteUnreachable { cause: String },
    MergeConflict { detail: String },
    ToolNotAvailable { tool: String },
    GitLockContention { cause: String },
    Internal { cause: String },
}

impl GmanError {
    /// One-line user-facing suggestions, when any apply. Kept separate from
    /// `Display` so callers rendering compact vs. verbose output can choose.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            GmanError::RepoAlreadyExists { alias } => {
                vec![format!("Remove it first with `repo remove {alias}`")]
            }
            GmanError::ShellIntegrationRequired => vec![
                "Run the command through the gman shell wrapper function, not the raw binary"
                    .to_string(),
            ],
            GmanError::AmbiguousMatch { candidates, .. } => {
                vec![format!("Candidates: {}", candidates.join(", "))]
            }
            GmanError::NoMatch { closest: Some(alias), .. } => {
                vec![format!("Did you mean '{alias}'?")]
            }
            GmanError::NetworkTimeout { .. } | GmanError::RemoteUnreachable { .. } => {
                vec!["Check network connectivity to the remote and retry".to_string()]
            }
            _ => Vec::new(),
        }
    }

    /// Exit code this error maps to under the §6 exit-code contract.
    pub fn exit_code(&self) -> i32 {
        match self {
            GmanError::ConfigNotFound { .. }
            | GmanError::ConfigInvalid { .. }
            | GmanError::ToolNotAvailable { .. } => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for GmanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GmanError::ConfigNotFound { path } => {
                write!(f, "configuration file not found at {}", path.display())
            }
            GmanError::ConfigInvalid { path, cause } => {
                write!(f, "configuration at {} is invalid: {cause}", path.display())
            }
            GmanError::RepoNotFound { alias } => write!(f, "no repository named '{alias}'"),
            GmanError::NotAGitRepo { path } => {
                write!(f, "{} is not a Git repository", path.display())
            }
            GmanError::RepoAlreadyExists { alias } => {
                write!(f, "repository '{alias}' already exists")
            }
            GmanError::GroupNotFound { name } => write!(f, "no group named '{name}'"),
            GmanError::TaskNotFound { name } => write!(f, "no task named '{name}'"),
            GmanError::AmbiguousMatch { input, candidates } => write!(
                f,
                "'{input}' matches multiple targets: {}",
                candidates.join(", ")
            ),
            GmanError::NoMatch { input, closest: _ } => write!(f, "no target matches '{input}'"),
            GmanError::ShellIntegrationRequired => write!(
                f,
                "shell integration is not active; switching would have no effect"
            ),
            GmanError::NetworkTimeout { cause } => write!(f, "network timeout: {cause}"),
            GmanError::RemoteUnreachable { cause } => write!(f, "remote unreachable: {cause}"),
            GmanError::MergeConflict { detail } => write!(f, "merge conflict: {detail}"),
            GmanError::ToolNotAvailable { tool } => write!(f, "required tool '{tool}' not found on PATH"),
            GmanError::GitLockContention { cause } => {
                write!(f, "git index lock contention: {cause}")
            }
            GmanError::Internal { cause } => write!(f, "internal error: {cause}"),
        }
    }
}

impl std::error::Error for GmanError {}

impl From<std::io::Error> for GmanError {
    fn from(e: std::io::Error) -> Self {
        GmanError::Internal { cause: e.to_string() }
    }
}
