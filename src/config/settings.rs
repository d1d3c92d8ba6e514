//! Global settings record (spec §3 — `Settings`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum SyncMode {
    FfOnly,
    Rebase,
    AutoStash,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    #[serde(default = "default_sync_mode")]
    pub default_sync_mode: SyncMode,

    #[serde(default = "default_parallel_jobs")]
    pub parallel_jobs: usize,

    #[serde(default = "default_true")]
    pub show_last_commit: bool,

    #[serde(default = "default_true")]
    pub color_output: bool,
}

fn default_sync_mode() -> SyncMode {
    SyncMode::FfOnly
}

fn default_parallel_jobs() -> usize {
    5
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_sync_mode: default_sync_mode(),
            parallel_jobs: default_parallel_jobs(),
            show_last_commit: true,
            color_output: true,
        }
    }
}

impl Settings {
    /// `max(parallel_jobs, 1)` per spec §4.5/§5 — batch fan-out capacity.
    pub fn batch_concurrency(&self) -> usize {
        self.parallel_jobs.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let s = Settings::default();
        assert_eq!(s.default_sync_mode, SyncMode::FfOnly);
        assert_eq!(s.parallel_jobs, 5);
        assert!(s.show_last_commit);
        assert!(s.color_output);
    }

    #[test]
    fn serializes_kebab_case() {
        let s = Settings::default();
        let toml = toml::to_string(&s).unwrap();
        assert!(toml.contains("default-sync-mode"));
        assert!(toml.contains("ff-only"));
        assert!(toml.contains("parallel-jobs"));
    }

    #[test]
    fn batch_concurrency_floors_at_one() {
        let mut s = Settings::default();
        s.parallel_jobs = 0;
        assert_eq!(s.batch_concurrency(), 1);
    }
}
