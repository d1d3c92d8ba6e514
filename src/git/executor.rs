//! Safe subprocess invocation of `git` (C2 — spec §4.2).
//!
//! Every invocation goes through [`run`], which enforces the security
//! invariants tested in spec §8 invariant 8: the first argument must be a
//! whitelisted subcommand, no argument may contain a shell metacharacter,
//! and the working directory must be an existing absolute directory.
//! Arguments are always passed as a vector to [`std::process::Command`],
//! never interpolated into a shell string.

use std::path::Path;
use std::process::{Command, Stdio};

use once_cell::sync::OnceCell;

use crate::error::{GmanError, GmanResult};

static GIT_AVAILABLE: OnceCell<bool> = OnceCell::new();

/// Whether `git` can be launched at all, memoized for the life of the
/// process (spec §6 exit-code contract: "2 — ... critical external tool
/// missing" is meant for exactly this check, done once at startup rather
/// than rediscovered on every subprocess invocation).
pub fn ensure_git_available() -> GmanResult<()> {
    let available = *GIT_AVAILABLE.get_or_init(|| {
        Command::new("git")
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    });
    if available {
        Ok(())
    } else {
        Err(GmanError::ToolNotAvailable { tool: "git".to_string() })
    }
}

/// Git subcommands C2 is allowed to invoke.
pub const SUBCOMMAND_WHITELIST: &[&str] = &[
    "status",
    "rev-parse",
    "log",
    "fetch",
    "pull",
    "push",
    "checkout",
    "branch",
    "commit",
    "add",
    "diff",
    "show",
    "stash",
    "rev-list",
    "worktree",
    "merge",
    "reset",
    "remote",
    "config",
];

/// External diff/merge tools C2 is allowed to launch (spec §4.2).
pub const DIFF_TOOL_WHITELIST: &[&str] = &[
    "diff", "meld", "vimdiff", "gvimdiff", "kdiff3", "opendiff", "p4merge", "xxdiff", "tkdiff",
    "kompare", "emerge", "winmerge", "code", "subl", "atom", "delta", "difft",
];

/// Bytes that must not appear in any argument passed to `git` or a diff
/// tool (spec §4.2 invariant 3 / §8 invariant 8).
const FORBIDDEN_BYTES: &[char] = &[';', '|', '&', '$', '`', '(', ')', '<', '>', '\\', '\0'];

fn validate_path(path: &Path) -> GmanResult<()> {
    if !path.is_absolute() {
        return Err(GmanError::Internal {
            cause: format!("{} is not an absolute path", path.display()),
        });
    }
    let canonical = dunce::canonicalize(path).map_err(|_| GmanError::NotAGitRepo {
        path: path.to_path_buf(),
    })?;
    if !canonical.is_dir() {
        return Err(GmanError::NotAGitRepo {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn validate_args(args: &[&str]) -> GmanResult<()> {
    for arg in args {
        if arg.chars().any(|c| FORBIDDEN_BYTES.contains(&c)) {
            return Err(GmanError::Internal {
                cause: format!("argument '{arg}' contains a forbidden character"),
            });
        }
    }
    Ok(())
}

/// Run `git` in `path` with `args`, returning trimmed combined stdout.
///
/// `args[0]` must be in [`SUBCOMMAND_WHITELIST`]. Environment is inherited,
/// augmented with `LANG=C`/`LC_ALL=C` so porcelain output is deterministic
/// English regardless of the caller's locale.
pub fn run(path: &Path, args: &[&str]) -> GmanResult<String> {
    validate_path(path)?;

    let subcommand = args.first().ok_or_else(|| GmanError::Internal {
        cause: "no git subcommand given".to_string(),
    })?;
    if !SUBCOMMAND_WHITELIST.contains(subcommand) {
        return Err(GmanError::Internal {
            cause: format!("git subcommand '{subcommand}' is not whitelisted"),
        });
    }
    validate_args(args)?;

    log::debug!("$ git {} (in {})", args.join(" "), path.display());

    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .env("LANG", "C")
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .output()
        .map_err(|e| GmanError::Internal { cause: e.to_string() })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        return Err(classify_failure(&combined));
    }

    Ok(combined.trim().to_string())
}

/// Like [`run`], but a non-zero exit is reported as `Ok((false, ""))` rather
/// than an error, for call sites that only care whether the command
/// succeeded and don't want `rev-parse --verify`-style "this ref doesn't
/// exist" probes to bubble up as errors (e.g. upstream-existence checks in
/// [`crate::git::status::resolve_sync`] and
/// [`crate::batch::operations::has_commits_ahead_of_upstream`]). Callers
/// that need to distinguish *why* a command failed should use [`run`]
/// directly instead.
pub fn run_allow_failure(path: &Path, args: &[&str]) -> GmanResult<(bool, String)> {
    match run(path, args) {
        Ok(out) => Ok((true, out)),
        Err(_) => Ok((false, String::new())),
    }
}

/// Run `git fetch`, classifying any failure per the fetch-specific taxonomy
/// in spec §4.4: "fetch error containing 'timeout' or 'connection' ->
/// network-timeout; other fetch failure -> remote-unreachable." Unlike the
/// generic [`classify_failure`] (whose fallback is `Internal`, meant for
/// inspection commands in general), a fetch failure is never reported as
/// `Internal` — a generic `fatal: ...` from `git fetch` that matches none of
/// `classify_failure`'s keyword buckets still means the remote couldn't be
/// reached.
pub fn run_fetch(path: &Path, args: &[&str]) -> GmanResult<String> {
    run(path, args).map_err(remap_fetch_failure)
}

/// Reclassify a `run` failure for the fetch step: every outcome except
/// `NetworkTimeout` becomes `RemoteUnreachable`, per spec §4.4's two-way
/// fetch taxonomy. Split out from [`run_fetch`] so the remapping itself is
/// unit-testable without shelling out to `git`.
fn remap_fetch_failure(e: GmanError) -> GmanError {
    match e {
        GmanError::NetworkTimeout { .. } => e,
        other => GmanError::RemoteUnreachable { cause: other.to_string() },
    }
}

/// Map raw command failure text to the general inspection-error taxonomy
/// (spec §4.4/§7: "anything else during inspection -> internal"). Fetch
/// failures specifically go through [`run_fetch`] instead, which never
/// falls back to `Internal`.
pub fn classify_failure(output: &str) -> GmanError {
    let lower = output.to_lowercase();
    if lower.contains("timeout") || lower.contains("connection") {
        GmanError::NetworkTimeout { cause: output.trim().to_string() }
    } else if lower.contains("could not resolve host")
        || lower.contains("could not read from remote")
        || lower.contains("unable to access")
    {
        GmanError::RemoteUnreachable { cause: output.trim().to_string() }
    } else if lower.contains("index.lock") || lower.contains("unable to create") && lower.contains(".lock") {
        GmanError::GitLockContention { cause: output.trim().to_string() }
    } else if lower.contains("conflict") {
        GmanError::MergeConflict { detail: output.trim().to_string() }
    } else {
        GmanError::Internal { cause: output.trim().to_string() }
    }
}

/// Invoke an external diff/merge tool on two file arguments, guarded by the
/// same whitelist discipline as `git` subcommands (spec §4.2).
pub fn run_diff_tool(tool: &str, path: &Path, file_args: &[&str]) -> GmanResult<String> {
    let trimmed_tool = tool.strip_suffix(".exe").unwrap_or(tool);
    if !DIFF_TOOL_WHITELIST.contains(&trimmed_tool) {
        return Err(GmanError::ToolNotAvailable { tool: tool.to_string() });
    }
    validate_path(path)?;
    validate_args(file_args)?;

    let mut args: Vec<&str> = vec!["--"];
    args.extend_from_slice(file_args);

    log::debug!("$ {tool} -- {} (in {})", file_args.join(" "), path.display());

    let output = Command::new(tool)
        .args(&args)
        .current_dir(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| GmanError::ToolNotAvailable { tool: format!("{tool}: {e}") })?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    Ok(combined.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_whitelisted_subcommand() {
        let tmp = tempfile::tempdir().unwrap();
        let err = run(tmp.path(), &["clone", "evil"]).unwrap_err();
        assert!(matches!(err, GmanError::Internal { .. }));
    }

    #[test]
    fn rejects_forbidden_characters() {
        let tmp = tempfile::tempdir().unwrap();
        let err = run(tmp.path(), &["status", "; rm -rf /"]).unwrap_err();
        assert!(matches!(err, GmanError::Internal { .. }));
    }

    #[test]
    fn rejects_non_absolute_path() {
        let err = run(Path::new("relative/path"), &["status"]).unwrap_err();
        assert!(matches!(err, GmanError::Internal { .. }));
    }

    #[test]
    fn rejects_non_whitelisted_diff_tool() {
        let tmp = tempfile::tempdir().unwrap();
        let err = run_diff_tool("rm", tmp.path(), &["a.txt", "b.txt"]).unwrap_err();
        assert!(matches!(err, GmanError::ToolNotAvailable { .. }));
    }

    #[test]
    fn classify_failure_detects_timeout() {
        assert!(matches!(
            classify_failure("fatal: unable to access: Connection timed out"),
            GmanError::NetworkTimeout { .. }
        ));
    }

    #[test]
    fn classify_failure_falls_back_to_internal() {
        assert!(matches!(classify_failure("huh?"), GmanError::Internal { .. }));
    }

    #[test]
    fn remap_fetch_failure_keeps_timeout() {
        let e = GmanError::NetworkTimeout { cause: "timed out".to_string() };
        assert!(matches!(remap_fetch_failure(e), GmanError::NetworkTimeout { .. }));
    }

    #[test]
    fn remap_fetch_failure_turns_internal_into_remote_unreachable() {
        // The failure scenario from spec §4.4: a generic fetch failure with
        // no timeout/connection keyword (e.g. "'origin' does not appear to
        // be a git repository") must not surface as `Internal`.
        let e = classify_failure("fatal: 'origin' does not appear to be a git repository");
        assert!(matches!(e, GmanError::Internal { .. }));
        assert!(matches!(remap_fetch_failure(e), GmanError::RemoteUnreachable { .. }));
    }

    #[test]
    fn run_allow_failure_reports_false_without_erroring() {
        let tmp = tempfile::tempdir().unwrap();
        let (ok, out) = run_allow_failure(tmp.path(), &["rev-parse", "--verify", "nonexistent-ref"]).unwrap();
        assert!(!ok);
        assert!(out.is_empty());
    }
}
