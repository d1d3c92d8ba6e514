//! In-process Git object-model reader (C3 — spec §4.3).
//!
//! Answers branch/workspace/commit questions without launching `git` and
//! without touching the network. Grounded on `gix` (gitoxide), used the way
//! `cyrup-ai-kodegen-tools-git` reads repository state in-process — but kept
//! synchronous here since gman has no async runtime; the blocking `gix`
//! calls run directly inside the `rayon` worker tasks in [`crate::git::status`].
//!
//! Sync status (ahead/behind) is deliberately *not* answered here: it needs
//! remote-tracking refs whose freshness this reader can't guarantee, so
//! [`crate::git::status`] always goes through the subprocess executor for
//! that piece (spec §4.3).

use std::path::Path;

use super::WorkspaceState;

/// Check for a `.git` marker (directory or file, per the worktree
/// `.git`-file-pointer convention) without opening the repository.
pub fn is_git_repository(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Branch (or detached-HEAD) name and current commit hash, read in-process.
///
/// Returns `Err` on anything the fast path can't handle — corrupted refs,
/// unusual worktree layouts, a missing `.git` — so the caller can fall back
/// to the subprocess path (spec: "the fast reader may delegate to the
/// subprocess path on any error").
pub fn head(path: &Path) -> anyhow::Result<(Option<String>, String)> {
    let repo = gix::open(path)?;
    let mut head_ref = repo.head()?;
    let branch = head_ref
        .referent_name()
        .map(|name| name.shorten().to_string());
    let commit_id = head_ref.peel_to_commit()?.id().to_string();
    Ok((branch, commit_id))
}

/// Workspace classification per the shared rule (spec §4.3):
/// dirty if tracked files differ from the index/HEAD or untracked
/// (non-ignored) files exist; otherwise stashed if the stash ref resolves;
/// otherwise clean.
pub fn workspace_status(path: &Path) -> anyhow::Result<(WorkspaceState, usize)> {
    let repo = gix::open(path)?;

    // `is_dirty()` is gix's tracked-vs-index/HEAD check; it is not
    // documented to also walk the worktree for untracked non-ignored
    // files, and the shared classification rule (spec §4.3) and
    // workspace-monotonicity invariant (spec §8 invariant 3) both require
    // those to count as dirty too. So `is_dirty() == false` is never
    // trusted on its own — the status walk below, which does enumerate
    // untracked entries, always runs to confirm the worktree is actually
    // empty of changes before this path agrees with `clean`.
    let tracked_dirty = repo.is_dirty()?;

    let changed = repo
        .status(gix::progress::Discard)
        .and_then(|platform| platform.into_iter(None))
        .map(|iter| iter.filter_map(Result::ok).count());

    let (is_dirty, changed) = match changed {
        Ok(count) => (tracked_dirty || count > 0, count),
        // The status walk is the one call in this function with no
        // confirmed signature in the pack (see DESIGN.md); if it errors,
        // fall back to `is_dirty()` alone rather than losing the read.
        Err(_) => (tracked_dirty, usize::from(tracked_dirty)),
    };

    if is_dirty {
        return Ok((WorkspaceState::Dirty, changed.max(1)));
    }

    let has_stash = repo
        .try_find_reference("refs/stash")
        .ok()
        .flatten()
        .is_some();

    if has_stash {
        Ok((WorkspaceState::Stashed, 0))
    } else {
        Ok((WorkspaceState::Clean, 0))
    }
}

/// Subject line and author time of the most recent commit.
pub fn last_commit(path: &Path) -> anyhow::Result<(String, i64)> {
    let repo = gix::open(path)?;
    let head_commit = repo.head_commit()?;
    let message = head_commit.message()?;
    let subject = message.title.to_string();
    let time = head_commit.time()?;
    Ok((subject, time.seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn init_repo(dir: &Path) {
        let run = |args: &[&str]| {
            Command::new("git")
                .args(args)
                .current_dir(dir)
                .env("LANG", "C")
                .env("LC_ALL", "C")
                .output()
                .expect("git must be on PATH for this test")
        };
        run(&["init", "-q"]);
        run(&["config", "user.email", "test@example.com"]);
        run(&["config", "user.name", "Test"]);
        std::fs::write(dir.join("f.txt"), "hello").unwrap();
        run(&["add", "."]);
        run(&["commit", "-q", "-m", "initial"]);
    }

    #[test]
    fn is_git_repository_checks_dot_git_marker() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!is_git_repository(tmp.path()));
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        assert!(is_git_repository(tmp.path()));
    }

    #[test]
    fn clean_repo_reports_clean_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        let (state, changed) = workspace_status(tmp.path()).unwrap();
        assert_eq!(state, WorkspaceState::Clean);
        assert_eq!(changed, 0);
    }

    #[test]
    fn dirty_repo_reports_dirty_workspace() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        std::fs::write(tmp.path().join("f.txt"), "changed").unwrap();
        let (state, changed) = workspace_status(tmp.path()).unwrap();
        assert_eq!(state, WorkspaceState::Dirty);
        assert_eq!(changed, 1);
    }

    #[test]
    fn untracked_file_alone_reports_dirty_workspace() {
        // Invariant 3 (workspace monotonicity): a repo with no tracked
        // changes but a new untracked, non-ignored file must still agree
        // with the subprocess fallback's `dirty` verdict, not `clean`.
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        std::fs::write(tmp.path().join("new_untracked.txt"), "new").unwrap();
        let (state, changed) = workspace_status(tmp.path()).unwrap();
        assert_eq!(state, WorkspaceState::Dirty);
        assert!(changed >= 1);
    }

    #[test]
    fn head_reports_branch_and_commit() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo(tmp.path());
        let (branch, commit) = head(tmp.path()).unwrap();
        assert!(branch.is_some());
        assert_eq!(commit.len(), 40);
    }
}
