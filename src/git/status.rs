//! Status Aggregator (C4 — spec §4.4, "the central subsystem").

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::GmanError;

use super::{WorkspaceState, executor, native};

/// An unborn branch (no commits yet) reports `rev-parse --abbrev-ref HEAD`
/// as the literal string `"HEAD"`, which the upstream tool this design is
/// modeled on treats as a real branch name (spec §9 "unborn branch
/// handling" design note: "a latent bug... do not guess"). gman resolves
/// the Open Question explicitly: bare `"HEAD"` output is normalized to this
/// marker rather than either guessed meaning. See DESIGN.md.
pub const UNBORN_BRANCH: &str = "unborn";
pub const DETACHED_HEAD: &str = "detached HEAD";

#[derive(Debug, Clone, Default)]
pub struct RepoStatus {
    pub alias: String,
    pub path: PathBuf,
    pub branch: String,
    pub workspace: Option<WorkspaceState>,
    pub ahead: u32,
    pub behind: u32,
    pub last_commit_summary: Option<String>,
    pub files_changed: usize,
    pub last_commit_time: i64,
    pub remote_url: Option<String>,
    pub upstream_branch: Option<String>,
    pub stash_count: u32,
    pub local_branch_count: u32,
    pub remote_branch_count: u32,
    pub last_fetch_time: i64,
    pub sync_error: Option<GmanError>,
    pub inspection_error: Option<GmanError>,
    pub is_current_directory: bool,
}

impl RepoStatus {
    fn not_found(alias: &str, path: &Path, err: GmanError) -> Self {
        RepoStatus {
            alias: alias.to_string(),
            path: path.to_path_buf(),
            inspection_error: Some(err),
            ..Default::default()
        }
    }
}

/// Global toggle for the fast (in-process) path. Spec §4.4: "A feature flag
/// allows disabling the fast path globally."
static FAST_PATH_ENABLED: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

pub fn set_fast_path_enabled(enabled: bool) {
    FAST_PATH_ENABLED.store(enabled, std::sync::atomic::Ordering::Relaxed);
}

fn fast_path_enabled() -> bool {
    FAST_PATH_ENABLED.load(std::sync::atomic::Ordering::Relaxed)
}

/// Single-repository status (spec §4.4 algorithm, steps 1-8).
pub fn get_repo_status(alias: &str, path: &Path, with_fetch: bool) -> RepoStatus {
    // Step 1: resolve path.
    if !path.exists() {
        return RepoStatus::not_found(alias, path, GmanError::RepoNotFound { alias: alias.to_string() });
    }
    if !native::is_git_repository(path) {
        return RepoStatus::not_found(alias, path, GmanError::NotAGitRepo { path: path.to_path_buf() });
    }

    // Step 2: is_current_directory.
    let is_current_directory = std::env::current_dir()
        .ok()
        .and_then(|cwd| dunce::canonicalize(cwd).ok())
        .and_then(|cwd| dunce::canonicalize(path).ok().map(|p| p == cwd))
        .unwrap_or(false);

    let mut status = RepoStatus {
        alias: alias.to_string(),
        path: path.to_path_buf(),
        is_current_directory,
        ..Default::default()
    };

    // Step 3: branch, fast path then subprocess fallback.
    let (branch, fast_ok) = resolve_branch(path);

    status.branch = branch;

    // Step 4: workspace status.
    let (workspace, files_changed, workspace_fast_ok) = resolve_workspace(path);
    status.workspace = workspace;
    status.files_changed = files_changed;

    // Step 5: sync status.
    resolve_sync(path, &status.branch, with_fetch, &mut status);

    // Step 6: last commit.
    resolve_last_commit(path, &mut status);

    // Step 7: changed file count, already derived above; refine via
    // subprocess porcelain when the fast path couldn't answer it.
    if !workspace_fast_ok {
        if let Ok(porcelain) = executor::run(path, &["status", "--porcelain"]) {
            status.files_changed = porcelain.lines().filter(|l| !l.is_empty()).count();
        }
    }

    // Step 8: best-effort enrichment.
    enrich(path, &status.branch, &mut status);

    let _ = fast_ok; // retained for clarity at call sites reading this function
    status
}

pub(crate) fn resolve_branch(path: &Path) -> (String, bool) {
    if fast_path_enabled()
        && let Ok((branch, _commit)) = native::head(path)
    {
        return (branch.unwrap_or_else(|| DETACHED_HEAD.to_string()), true);
    }

    match executor::run(path, &["rev-parse", "--abbrev-ref", "HEAD"]) {
        Ok(name) if name == "HEAD" => (UNBORN_BRANCH.to_string(), false),
        Ok(name) => (name, false),
        Err(_) => (DETACHED_HEAD.to_string(), false),
    }
}

pub(crate) fn resolve_workspace(path: &Path) -> (Option<WorkspaceState>, usize, bool) {
    if fast_path_enabled()
        && let Ok((state, changed)) = native::workspace_status(path)
    {
        return (Some(state), changed, true);
    }

    // Subprocess fallback, mirroring the shared classification rule.
    let porcelain = executor::run(path, &["status", "--porcelain"]).unwrap_or_default();
    let changed = porcelain.lines().filter(|l| !l.is_empty()).count();
    if changed > 0 {
        return (Some(WorkspaceState::Dirty), changed, false);
    }
    let stash = executor::run(path, &["stash", "list"]).unwrap_or_default();
    if !stash.trim().is_empty() {
        (Some(WorkspaceState::Stashed), 0, false)
    } else {
        (Some(WorkspaceState::Clean), 0, false)
    }
}

fn resolve_sync(path: &Path, branch: &str, with_fetch: bool, status: &mut RepoStatus) {
    if with_fetch && let Err(e) = executor::run_fetch(path, &["fetch", "--quiet"]) {
        // Fetch failure is non-fatal to the surrounding status call.
        status.sync_error = Some(e);
    }

    let upstream_ref = format!("origin/{branch}");
    let (verified, _) = executor::run_allow_failure(path, &["rev-parse", "--verify", &upstream_ref])
        .unwrap_or((false, String::new()));
    if !verified {
        status.ahead = 0;
        status.behind = 0;
        return;
    }

    let range = format!("{upstream_ref}...HEAD");
    match executor::run(path, &["rev-list", "--left-right", "--count", &range]) {
        Ok(out) => {
            let mut parts = out.split_whitespace();
            let behind = parts.next().and_then(|s| s.parse().ok());
            let ahead = parts.next().and_then(|s| s.parse().ok());
            match (behind, ahead) {
                (Some(b), Some(a)) => {
                    status.behind = b;
                    status.ahead = a;
                }
                _ => {
                    status.sync_error = Some(GmanError::Internal {
                        cause: format!("could not parse rev-list output: {out}"),
                    });
                }
            }
        }
        Err(e) => status.sync_error = Some(e),
    }
}

fn resolve_last_commit(path: &Path, status: &mut RepoStatus) {
    if let Ok((subject, time)) = native::last_commit(path) {
        status.last_commit_summary = Some(subject);
        status.last_commit_time = time;
        return;
    }
    if let Ok(subject) = executor::run(path, &["log", "-1", "--pretty=format:%h %s"]) {
        status.last_commit_summary = Some(subject);
    }
    // Failure on commit time is non-fatal; left at zero.
    if let Ok(time) = executor::run(path, &["log", "-1", "--pretty=format:%ct"])
        && let Ok(parsed) = time.parse()
    {
        status.last_commit_time = parsed;
    }
}

fn enrich(path: &Path, branch: &str, status: &mut RepoStatus) {
    if let Ok(url) = executor::run(path, &["remote", "get-url", "origin"]) {
        status.remote_url = Some(url);
    }

    if let Ok(upstream) = executor::run(path, &["rev-parse", "--abbrev-ref", &format!("{branch}@{{upstream}}")]) {
        status.upstream_branch = Some(upstream);
    }

    if let Ok(stash) = executor::run(path, &["stash", "list"]) {
        status.stash_count = stash.lines().filter(|l| !l.is_empty()).count() as u32;
    }

    if let Ok(branches) = executor::run(path, &["branch", "-a"]) {
        let mut local = 0u32;
        let mut remote = 0u32;
        for line in branches.lines() {
            let line = line.trim_start_matches(['*', ' ']);
            if line.starts_with("remotes/") {
                remote += 1;
            } else if !line.is_empty() {
                local += 1;
            }
        }
        status.local_branch_count = local;
        status.remote_branch_count = remote;
    }

    if let Ok(git_dir) = executor::run(path, &["rev-parse", "--git-dir"]) {
        let git_dir_path = if Path::new(&git_dir).is_absolute() {
            PathBuf::from(git_dir)
        } else {
            path.join(git_dir)
        };
        if let Ok(meta) = std::fs::metadata(git_dir_path.join("FETCH_HEAD"))
            && let Ok(modified) = meta.modified()
            && let Ok(duration) = modified.duration_since(SystemTime::UNIX_EPOCH)
        {
            status.last_fetch_time = duration.as_secs() as i64;
        }
    }
}

/// Semaphore tier for bounded status fan-out (spec §4.4/§5).
pub fn concurrency_tier(n: usize) -> usize {
    if n < 3 {
        n.min(5).max(1)
    } else if n <= 20 {
        5
    } else {
        10
    }
}

/// Fan out `GetRepoStatus` across all repos under a bounded worker pool.
///
/// Producers are bounded by the `rayon` thread pool sized per the tier
/// table; results flow back through a `crossbeam-channel` bounded at
/// capacity N so no producer ever blocks waiting for the collector (spec
/// §4.4 scheduling policy: "the buffered channel/queue has capacity = N to
/// prevent producer blocking"). The channel carries each result's original
/// index so output is collected into a pre-sized buffer (no reallocation)
/// in input order — the "exactly one status per alias" invariant (spec §8
/// invariant 5) holds trivially, and callers sort by alias only for
/// *display*.
pub fn get_all_repo_status(repos: &[(String, PathBuf)], with_fetch: bool) -> Vec<RepoStatus> {
    let n = repos.len();
    let tier = concurrency_tier(n);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(tier)
        .build()
        .expect("failed to build status worker pool");

    let (sender, receiver) = crossbeam_channel::bounded::<(usize, RepoStatus)>(n);

    pool.scope(|scope| {
        for (index, (alias, path)) in repos.iter().enumerate() {
            let sender = sender.clone();
            scope.spawn(move |_| {
                let status = get_repo_status(alias, path, with_fetch);
                let _ = sender.send((index, status));
            });
        }
    });
    drop(sender);

    let mut results: Vec<Option<RepoStatus>> = (0..n).map(|_| None).collect();
    for (index, status) in receiver.iter() {
        results[index] = Some(status);
    }
    results.into_iter().map(|r| r.expect("every producer reported in")).collect()
}
