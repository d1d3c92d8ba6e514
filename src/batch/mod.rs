//! Batch Orchestrator (C5 — spec §4.5): filter -> dry-run-or-execute ->
//! aggregate, the pattern shared by `work sync/commit/push/pull/stash/branch`.

pub mod operations;

use std::path::{Path, PathBuf};

use crate::error::GmanResult;

/// A uniform per-repo action, built from three small contracts rather than
/// one monolithic method so `should_include` can run cheaply (no network)
/// ahead of the potentially-slow `execute`.
pub trait BatchOperation: Sync {
    fn name(&self) -> &str;

    /// Whether this repo participates. A predicate failure is logged and
    /// treated as exclusion rather than aborting the whole batch (spec
    /// §4.5 step 2).
    fn should_include(&self, alias: &str, path: &Path) -> GmanResult<bool>;

    fn execute(&self, alias: &str, path: &Path) -> GmanResult<String>;
}

#[derive(Debug)]
pub struct BatchResult {
    pub alias: String,
    pub path: PathBuf,
    pub outcome: GmanResult<String>,
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug)]
pub struct BatchReport {
    pub operation: String,
    pub dry_run: bool,
    /// Repos that were filtered out by `should_include`; never executed.
    pub excluded: Vec<String>,
    pub results: Vec<BatchResult>,
}

impl BatchReport {
    pub fn successful_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.successful_count()
    }

    /// Spec §4.5 step 6: "return a non-zero result iff any operation failed."
    pub fn any_failed(&self) -> bool {
        self.results.iter().any(|r| !r.is_success())
    }
}

/// Run `op` over `repos` following the filter -> dry-run-or-execute ->
/// aggregate pipeline. `concurrency` is `Settings::batch_concurrency()`,
/// already floored at 1 by the caller.
pub fn run_batch(
    repos: &[(String, PathBuf)],
    op: &dyn BatchOperation,
    dry_run: bool,
    concurrency: usize,
) -> BatchReport {
    let mut included: Vec<(String, PathBuf)> = Vec::new();
    let mut excluded: Vec<String> = Vec::new();

    for (alias, path) in repos {
        match op.should_include(alias, path) {
            Ok(true) => included.push((alias.clone(), path.clone())),
            Ok(false) => excluded.push(alias.clone()),
            Err(e) => {
                log::warn!("{}: should_include failed for '{alias}': {e}", op.name());
                excluded.push(alias.clone());
            }
        }
    }

    if included.is_empty() {
        return BatchReport {
            operation: op.name().to_string(),
            dry_run,
            excluded,
            results: Vec::new(),
        };
    }

    if dry_run {
        let results = included
            .into_iter()
            .map(|(alias, path)| BatchResult {
                outcome: Ok(format!("would run '{}' on {alias}", op.name())),
                alias,
                path,
            })
            .collect();
        return BatchReport {
            operation: op.name().to_string(),
            dry_run: true,
            excluded,
            results,
        };
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency.max(1))
        .build()
        .expect("failed to build batch worker pool");

    let mut results: Vec<Option<BatchResult>> = (0..included.len()).map(|_| None).collect();
    pool.install(|| {
        use rayon::prelude::*;
        results
            .par_iter_mut()
            .zip(included.par_iter())
            .for_each(|(slot, (alias, path))| {
                let outcome = op.execute(alias, path);
                *slot = Some(BatchResult {
                    alias: alias.clone(),
                    path: path.clone(),
                    outcome,
                });
            });
    });

    let mut results: Vec<BatchResult> = results.into_iter().map(|r| r.expect("every slot filled")).collect();
    results.sort_by(|a, b| a.alias.cmp(&b.alias));

    BatchReport {
        operation: op.name().to_string(),
        dry_run: false,
        excluded,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingOp {
        executed: AtomicUsize,
        include: fn(&str) -> bool,
    }

    impl BatchOperation for CountingOp {
        fn name(&self) -> &str {
            "test-op"
        }

        fn should_include(&self, alias: &str, _path: &Path) -> GmanResult<bool> {
            Ok((self.include)(alias))
        }

        fn execute(&self, _alias: &str, _path: &Path) -> GmanResult<String> {
            self.executed.fetch_add(1, Ordering::SeqCst);
            Ok("ok".to_string())
        }
    }

    #[test]
    fn empty_filtered_set_yields_empty_report_without_executing() {
        let op = CountingOp { executed: AtomicUsize::new(0), include: |_| false };
        let repos = vec![("a".to_string(), PathBuf::from("/a")), ("b".to_string(), PathBuf::from("/b"))];
        let report = run_batch(&repos, &op, false, 5);
        assert!(report.results.is_empty());
        assert_eq!(report.excluded.len(), 2);
        assert_eq!(op.executed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dry_run_does_not_execute() {
        let op = CountingOp { executed: AtomicUsize::new(0), include: |_| true };
        let repos = vec![("a".to_string(), PathBuf::from("/a"))];
        let report = run_batch(&repos, &op, true, 5);
        assert!(report.dry_run);
        assert_eq!(report.results.len(), 1);
        assert_eq!(op.executed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn results_are_sorted_by_alias() {
        let op = CountingOp { executed: AtomicUsize::new(0), include: |_| true };
        let repos = vec![
            ("zebra".to_string(), PathBuf::from("/z")),
            ("alpha".to_string(), PathBuf::from("/a")),
        ];
        let report = run_batch(&repos, &op, false, 5);
        assert_eq!(report.results[0].alias, "alpha");
        assert_eq!(report.results[1].alias, "zebra");
    }

    #[test]
    fn any_failed_reflects_per_repo_outcomes() {
        struct FailingOp;
        impl BatchOperation for FailingOp {
            fn name(&self) -> &str {
                "failing"
            }
            fn should_include(&self, _alias: &str, _path: &Path) -> GmanResult<bool> {
                Ok(true)
            }
            fn execute(&self, alias: &str, _path: &Path) -> GmanResult<String> {
                if alias == "bad" {
                    Err(crate::error::GmanError::Internal { cause: "boom".to_string() })
                } else {
                    Ok("ok".to_string())
                }
            }
        }
        let repos = vec![("bad".to_string(), PathBuf::from("/b")), ("good".to_string(), PathBuf::from("/g"))];
        let report = run_batch(&repos, &FailingOp, false, 5);
        assert!(report.any_failed());
        assert_eq!(report.successful_count(), 1);
        assert_eq!(report.failed_count(), 1);
    }
}
