//! Multi-repository Git assistant — core library.
//!
//! `gman` tracks a registry of named local Git checkouts ("repositories"),
//! reports unified status across them, runs bulk read-biased Git workflows,
//! and resolves navigation targets (repositories and their worktrees) for a
//! shell wrapper to `cd` into.
//!
//! The library is organized around the components in the design:
//! - [`config`] — the persisted registry of repositories, groups, tasks,
//!   recent-usage log, and settings (C1 / C7).
//! - [`git`] — safe subprocess invocation of `git` (C2), an in-process
//!   object-model reader (C3), and the status aggregator (C4).
//! - [`batch`] — the filter → dry-run → concurrent-execute → aggregate
//!   pipeline shared by sync/commit/push/pull/stash/branch (C5).
//! - [`switch`] — enumeration, matching, and shell-directive emission for
//!   `gman switch` (C6).

pub mod batch;
pub mod config;
pub mod error;
pub mod git;
pub mod styling;
pub mod switch;

pub use error::{GmanError, GmanResult};
