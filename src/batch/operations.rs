//! Concrete batch operations (spec §4.5's operation table and the
//! merged-branch-cleanup / sync algorithms).

use std::path::Path;

use crate::config::SyncMode;
use crate::error::GmanResult;
use crate::git::executor;
use crate::git::status::resolve_workspace;

use super::BatchOperation;

fn has_uncommitted_changes(path: &Path) -> GmanResult<bool> {
    let (state, _changed, _fast) = resolve_workspace(path);
    Ok(matches!(state, Some(crate::git::WorkspaceState::Dirty)))
}

fn has_stash(path: &Path) -> GmanResult<bool> {
    let out = executor::run(path, &["stash", "list"])?;
    Ok(!out.trim().is_empty())
}

fn current_branch(path: &Path) -> GmanResult<String> {
    let (branch, _fast) = crate::git::status::resolve_branch(path);
    Ok(branch)
}

/// "No upstream counts as ahead" (spec §4.5 table).
fn has_commits_ahead_of_upstream(path: &Path, branch: &str) -> GmanResult<bool> {
    let upstream = format!("{branch}@{{upstream}}");
    let (has_upstream, _) = executor::run_allow_failure(path, &["rev-parse", "--abbrev-ref", &upstream])?;
    if !has_upstream {
        return Ok(true);
    }
    let range = format!("{upstream}..HEAD");
    let count = executor::run(path, &["rev-list", "--count", &range])?;
    Ok(count.trim().parse::<u64>().unwrap_or(0) > 0)
}

pub struct CommitOperation {
    pub message: String,
    pub add_all: bool,
}

impl BatchOperation for CommitOperation {
    fn name(&self) -> &str {
        "commit"
    }

    fn should_include(&self, _alias: &str, path: &Path) -> GmanResult<bool> {
        has_uncommitted_changes(path)
    }

    fn execute(&self, _alias: &str, path: &Path) -> GmanResult<String> {
        if self.add_all {
            executor::run(path, &["add", "-A"])?;
        }
        executor::run(path, &["commit", "-m", &self.message])
    }
}

pub struct PushOperation {
    pub force: bool,
    pub set_upstream: bool,
}

impl BatchOperation for PushOperation {
    fn name(&self) -> &str {
        "push"
    }

    fn should_include(&self, _alias: &str, path: &Path) -> GmanResult<bool> {
        let branch = current_branch(path)?;
        has_commits_ahead_of_upstream(path, &branch)
    }

    fn execute(&self, _alias: &str, path: &Path) -> GmanResult<String> {
        let branch = current_branch(path)?;
        let mut args: Vec<&str> = vec!["push"];
        if self.force {
            args.push("--force");
        }
        if self.set_upstream {
            args.push("--set-upstream");
            args.push("origin");
            args.push(&branch);
        }
        executor::run(path, &args)
    }
}

pub struct PullOperation {
    pub mode: SyncMode,
}

impl BatchOperation for PullOperation {
    fn name(&self) -> &str {
        "pull"
    }

    fn should_include(&self, _alias: &str, _path: &Path) -> GmanResult<bool> {
        // "always include" (spec §4.5 table).
        Ok(true)
    }

    fn execute(&self, _alias: &str, path: &Path) -> GmanResult<String> {
        let flag = match self.mode {
            SyncMode::FfOnly => "--ff-only",
            SyncMode::Rebase => "--rebase",
            SyncMode::AutoStash => "--autostash",
        };
        executor::run(path, &["pull", flag])
    }
}

/// `work sync` hardcodes ff-only regardless of settings (spec §4.5).
pub fn sync_operation() -> PullOperation {
    PullOperation { mode: SyncMode::FfOnly }
}

pub struct StashSaveOperation {
    pub message: Option<String>,
}

impl BatchOperation for StashSaveOperation {
    fn name(&self) -> &str {
        "stash save"
    }

    fn should_include(&self, _alias: &str, path: &Path) -> GmanResult<bool> {
        has_uncommitted_changes(path)
    }

    fn execute(&self, _alias: &str, path: &Path) -> GmanResult<String> {
        match &self.message {
            Some(msg) => executor::run(path, &["stash", "save", msg]),
            None => executor::run(path, &["stash", "save"]),
        }
    }
}

pub struct StashPopOperation;

impl BatchOperation for StashPopOperation {
    fn name(&self) -> &str {
        "stash pop"
    }

    fn should_include(&self, _alias: &str, path: &Path) -> GmanResult<bool> {
        has_stash(path)
    }

    fn execute(&self, _alias: &str, path: &Path) -> GmanResult<String> {
        executor::run(path, &["stash", "pop"])
    }
}

pub struct StashClearOperation;

impl BatchOperation for StashClearOperation {
    fn name(&self) -> &str {
        "stash clear"
    }

    fn should_include(&self, _alias: &str, path: &Path) -> GmanResult<bool> {
        has_stash(path)
    }

    fn execute(&self, _alias: &str, path: &Path) -> GmanResult<String> {
        executor::run(path, &["stash", "clear"])
    }
}

pub struct BranchCreateOperation {
    pub name: String,
}

impl BatchOperation for BranchCreateOperation {
    fn name(&self) -> &str {
        "branch create"
    }

    fn should_include(&self, _alias: &str, _path: &Path) -> GmanResult<bool> {
        Ok(true)
    }

    fn execute(&self, _alias: &str, path: &Path) -> GmanResult<String> {
        executor::run(path, &["checkout", "-b", &self.name])
    }
}

pub struct BranchSwitchOperation {
    pub name: String,
}

impl BatchOperation for BranchSwitchOperation {
    fn name(&self) -> &str {
        "branch switch"
    }

    fn should_include(&self, _alias: &str, _path: &Path) -> GmanResult<bool> {
        Ok(true)
    }

    fn execute(&self, _alias: &str, path: &Path) -> GmanResult<String> {
        executor::run(path, &["checkout", &self.name])
    }
}

const MAIN_BRANCH_CANDIDATES: &[&str] = &["main", "master", "develop"];

/// Detect the main branch: `main`, then `master`, then `develop`, falling
/// back to the current branch (spec §4.5 "Merged-branch cleanup").
fn detect_main_branch(path: &Path) -> GmanResult<String> {
    let branches = executor::run(path, &["branch", "--list"])?;
    let local: Vec<String> = branches
        .lines()
        .map(|l| l.trim_start_matches(['*', ' ']).to_string())
        .filter(|l| !l.is_empty())
        .collect();

    for candidate in MAIN_BRANCH_CANDIDATES {
        if local.iter().any(|b| b == candidate) {
            return Ok(candidate.to_string());
        }
    }
    current_branch(path)
}

pub struct BranchCleanMergedOperation;

impl BatchOperation for BranchCleanMergedOperation {
    fn name(&self) -> &str {
        "branch clean"
    }

    fn should_include(&self, _alias: &str, _path: &Path) -> GmanResult<bool> {
        Ok(true)
    }

    fn execute(&self, _alias: &str, path: &Path) -> GmanResult<String> {
        let main_branch = detect_main_branch(path)?;
        let current = current_branch(path)?;
        let merged = executor::run(path, &["branch", "--merged", &main_branch])?;

        let mut deleted = Vec::new();
        for line in merged.lines() {
            let name = line.trim_start_matches(['*', ' ']).trim();
            if name.is_empty() || name == main_branch || name == current {
                continue;
            }
            let result = executor::run(path, &["branch", "-d", name]);
            let deletion = match result {
                Ok(_) => Ok(()),
                Err(_) => executor::run(path, &["branch", "-D", name]).map(|_| ()),
            };
            if deletion.is_ok() {
                deleted.push(name.to_string());
            }
        }

        if deleted.is_empty() {
            Ok("no merged branches to clean".to_string())
        } else {
            Ok(format!("deleted: {}", deleted.join(", ")))
        }
    }
}
