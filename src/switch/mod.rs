//! Switch Resolver (C6 — spec §4.6): enumerate repos and worktrees as
//! navigable targets, resolve an input string against them, and emit the
//! `GMAN_CD:` shell directive the wrapper function consumes.

use std::path::{Path, PathBuf};

use crate::config::ConfigStore;
use crate::error::{GmanError, GmanResult};
use crate::git::worktree::list_worktrees;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Repository,
    Worktree,
}

#[derive(Debug, Clone)]
pub struct SwitchTarget {
    pub display_alias: String,
    pub path: PathBuf,
    pub kind: TargetKind,
    pub parent_repo_alias: String,
    pub branch: Option<String>,
    pub last_accessed: Option<chrono::DateTime<chrono::Utc>>,
}

/// Enumerate every repository and non-main worktree as a [`SwitchTarget`]
/// (spec §4.6 "Target enumeration"). Worktree aliases are prefixed with
/// their owning repository's alias and `/`; base-name collisions within the
/// same repository are resolved by appending `-N` in enumeration order,
/// after sorting by path for determinism (spec §9 open question).
pub fn enumerate_targets(store: &ConfigStore) -> Vec<SwitchTarget> {
    let repositories = store.get_repositories();
    let mut targets = Vec::new();

    for (alias, path) in &repositories {
        targets.push(SwitchTarget {
            display_alias: alias.clone(),
            path: path.clone(),
            kind: TargetKind::Repository,
            parent_repo_alias: alias.clone(),
            branch: None,
            last_accessed: None,
        });

        let Ok(mut worktrees) = list_worktrees(path) else {
            continue;
        };
        worktrees.sort_by(|a, b| a.path.cmp(&b.path));
        worktrees.retain(|wt| &wt.path != path);

        let mut seen_base_names: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
        for wt in worktrees {
            let base_name = wt
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| wt.path.display().to_string());

            let count = seen_base_names.entry(base_name.clone()).or_insert(0);
            *count += 1;
            let suffixed = if *count > 1 {
                format!("{base_name}-{}", *count - 1)
            } else {
                base_name
            };

            targets.push(SwitchTarget {
                display_alias: format!("{alias}/{suffixed}"),
                path: wt.path,
                kind: TargetKind::Worktree,
                parent_repo_alias: alias.clone(),
                branch: wt.branch,
                last_accessed: None,
            });
        }
    }

    targets
}

/// Apply the recency ordering policy to `targets` in place (spec §4.6
/// "Ordering policy").
pub fn order_targets(
    mut targets: Vec<SwitchTarget>,
    recent_aliases: &[String],
    recent_only: bool,
    limit: Option<usize>,
) -> Vec<SwitchTarget> {
    let recency = |alias: &str| recent_aliases.iter().position(|a| a == alias);

    if recent_only {
        targets.retain(|t| recency(&t.parent_repo_alias).is_some());
        targets.sort_by_key(|t| recency(&t.parent_repo_alias).unwrap_or(usize::MAX));
    } else {
        targets.sort_by(|a, b| {
            let a_recent = recency(&a.parent_repo_alias);
            let b_recent = recency(&b.parent_repo_alias);
            match (a_recent, b_recent) {
                (Some(ai), Some(bi)) => ai.cmp(&bi),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.display_alias.cmp(&b.display_alias),
            }
        });
    }

    if let Some(limit) = limit {
        targets.truncate(limit);
    }
    targets
}

/// Matching policy (spec §4.6): exact alias wins; otherwise case-insensitive
/// substring match, erroring on zero or multiple candidates.
pub fn match_target<'a>(input: &str, targets: &'a [SwitchTarget]) -> GmanResult<&'a SwitchTarget> {
    if let Some(exact) = targets.iter().find(|t| t.display_alias == input) {
        return Ok(exact);
    }

    let needle = input.to_lowercase();
    let candidates: Vec<&SwitchTarget> = targets
        .iter()
        .filter(|t| t.display_alias.to_lowercase().contains(&needle))
        .collect();

    match candidates.len() {
        0 => Err(GmanError::NoMatch {
            input: input.to_string(),
            closest: closest_alias(input, targets),
        }),
        1 => Ok(candidates[0]),
        _ => Err(GmanError::AmbiguousMatch {
            input: input.to_string(),
            candidates: candidates.iter().map(|t| t.display_alias.clone()).collect(),
        }),
    }
}

/// Above this similarity, a "did you mean" suggestion is worth showing;
/// below it, the nearest alias is probably unrelated noise.
const SUGGESTION_THRESHOLD: f64 = 0.7;

/// Nearest alias to `input` by Jaro-Winkler similarity, for the `NoMatch`
/// error's "did you mean" suggestion — not part of the matching policy
/// itself (spec §4.6 only specifies exact/substring matching), just a
/// friendlier error message when neither finds anything.
fn closest_alias(input: &str, targets: &[SwitchTarget]) -> Option<String> {
    let needle = input.to_lowercase();
    targets
        .iter()
        .map(|t| (t.display_alias.as_str(), strsim::jaro_winkler(&needle, &t.display_alias.to_lowercase())))
        .filter(|(_, score)| *score >= SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(alias, _)| alias.to_string())
}

/// `GMAN_SHELL_INTEGRATION=1` or the `GMAN_SKIP_SHELL_CHECK=1` bypass must be
/// present before any resolution work happens (spec §4.6 precondition).
pub fn check_shell_integration() -> GmanResult<()> {
    let active = std::env::var("GMAN_SHELL_INTEGRATION").as_deref() == Ok("1");
    let bypassed = std::env::var("GMAN_SKIP_SHELL_CHECK").as_deref() == Ok("1");
    if active || bypassed {
        Ok(())
    } else {
        Err(GmanError::ShellIntegrationRequired)
    }
}

/// Resolve `input` (or the top of the ordering when `None`) to a target,
/// tracking recent usage on success (spec §4.6 "Recent-usage tracking":
/// snapshot-then-update, never held across the whole resolve).
pub fn resolve(
    store: &ConfigStore,
    input: Option<&str>,
    recent_only: bool,
    limit: Option<usize>,
) -> GmanResult<SwitchTarget> {
    check_shell_integration()?;

    let recent = store.get_recent_usage();
    let recent_aliases: Vec<String> = recent.into_iter().map(|e| e.alias).collect();

    let targets = enumerate_targets(store);
    let ordered = order_targets(targets, &recent_aliases, recent_only, limit);

    let selected = match input {
        Some(needle) => match_target(needle, &ordered)?.clone(),
        None => ordered
            .into_iter()
            .next()
            .ok_or_else(|| GmanError::NoMatch { input: String::new(), closest: None })?,
    };

    store.track_recent_usage(&selected.parent_repo_alias);
    Ok(selected)
}

/// Format the shell directive: exactly `GMAN_CD:<path>`, no trailing
/// newline (spec §4.6/§6 "Shell directive contract").
pub fn shell_directive(path: &Path) -> String {
    format!("GMAN_CD:{}", path.display())
}

impl PartialEq for SwitchTarget {
    fn eq(&self, other: &Self) -> bool {
        self.display_alias == other.display_alias && self.path == other.path
    }
}
