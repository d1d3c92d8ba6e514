//! Shared fixtures for integration tests: real `git` subprocess repos under
//! a tempdir, isolated `GMAN_CONFIG` per test.

use std::path::Path;
use std::process::Command;

pub fn init_repo(dir: &Path) {
    let run = |args: &[&str]| {
        Command::new("git")
            .args(args)
            .current_dir(dir)
            .env("LANG", "C")
            .env("LC_ALL", "C")
            .output()
            .expect("git must be on PATH for integration tests")
    };
    run(&["init", "-q"]);
    run(&["config", "user.email", "test@example.com"]);
    run(&["config", "user.name", "Test"]);
    std::fs::write(dir.join("f.txt"), "hello").unwrap();
    run(&["add", "."]);
    run(&["commit", "-q", "-m", "initial"]);
}
