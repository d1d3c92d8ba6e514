//! Recent-usage log (spec §3 — `RecentEntry`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Window size for the recent-usage log. Must be at least the UI's display
/// limit (spec §3: "capped at a fixed window (≥ the UI limit; ≥50 is
/// adequate)").
pub const RECENT_LOG_CAP: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub alias: String,
    pub access_time: DateTime<Utc>,
}

/// Promote `alias` to the front of `log`, deduplicating by alias and
/// truncating to [`RECENT_LOG_CAP`]. `now` is injected so callers (and
/// tests) control the timestamp rather than this function calling
/// `Utc::now()` itself.
pub(super) fn track(log: &mut Vec<RecentEntry>, alias: &str, now: DateTime<Utc>) {
    log.retain(|e| e.alias != alias);
    log.insert(
        0,
        RecentEntry {
            alias: alias.to_string(),
            access_time: now,
        },
    );
    log.truncate(RECENT_LOG_CAP);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn track_prepends_and_dedups() {
        let mut log = Vec::new();
        track(&mut log, "a", t(1));
        track(&mut log, "b", t(2));
        track(&mut log, "a", t(3));

        assert_eq!(log.len(), 2);
        assert_eq!(log[0].alias, "a");
        assert_eq!(log[0].access_time, t(3));
        assert_eq!(log[1].alias, "b");
    }

    #[test]
    fn track_is_idempotent_modulo_timestamp() {
        // Invariant 7: TrackRecentUsage(a) twice == once, modulo timestamp.
        let mut log = Vec::new();
        track(&mut log, "a", t(1));
        let once = log.clone();
        track(&mut log, "a", t(1));
        assert_eq!(log.len(), once.len());
        assert_eq!(
            log.iter().map(|e| &e.alias).collect::<Vec<_>>(),
            once.iter().map(|e| &e.alias).collect::<Vec<_>>()
        );
    }

    #[test]
    fn track_caps_window() {
        let mut log = Vec::new();
        for i in 0..(RECENT_LOG_CAP + 10) {
            track(&mut log, &format!("repo-{i}"), t(i as i64));
        }
        assert_eq!(log.len(), RECENT_LOG_CAP);
        // Most recent first.
        assert_eq!(log[0].alias, format!("repo-{}", RECENT_LOG_CAP + 9));
    }
}
