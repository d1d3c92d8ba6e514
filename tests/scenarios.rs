//! End-to-end CLI scenarios (spec §8's S1-S8), driving the compiled binary
//! through `std::process::Command` rather than calling library internals,
//! so the assertions exercise the same path a real shell wrapper would.

mod common;

use std::path::Path;
use std::process::Command;

fn gman() -> Command {
    Command::new(env!("CARGO_BIN_EXE_gman"))
}

fn with_config(cmd: &mut Command, config_path: &Path) -> &mut Command {
    cmd.env("GMAN_CONFIG", config_path)
}

#[test]
fn s1_empty_registry_lists_no_repositories() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let mut cmd = gman();
    with_config(&mut cmd, &config).args(["repo", "list"]);
    let output = cmd.output().unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no repositories configured"));
}

#[test]
fn s2_add_then_list_shows_one_repository() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let repo = dir.path().join("r");
    std::fs::create_dir(&repo).unwrap();
    common::init_repo(&repo);

    let mut add = gman();
    with_config(&mut add, &config).args(["repo", "add", "proj", "--path"]).arg(&repo);
    let add_output = add.output().unwrap();
    assert!(add_output.status.success());
    let stdout = String::from_utf8_lossy(&add_output.stdout);
    assert!(stdout.contains("Added repository: proj"));

    let mut list = gman();
    with_config(&mut list, &config).args(["repo", "list"]);
    let list_output = list.output().unwrap();
    let list_stdout = String::from_utf8_lossy(&list_output.stdout);
    assert_eq!(list_stdout.lines().count(), 1);
    assert!(list_stdout.starts_with("proj\t"));
}

#[test]
fn s3_duplicate_add_fails_and_leaves_config_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let repo = dir.path().join("r");
    let other = dir.path().join("other");
    std::fs::create_dir(&repo).unwrap();
    std::fs::create_dir(&other).unwrap();
    common::init_repo(&repo);
    common::init_repo(&other);

    let mut add = gman();
    with_config(&mut add, &config).args(["repo", "add", "proj", "--path"]).arg(&repo);
    assert!(add.output().unwrap().status.success());

    let mut dup = gman();
    with_config(&mut dup, &config).args(["repo", "add", "proj", "--path"]).arg(&other);
    let dup_output = dup.output().unwrap();
    assert!(!dup_output.status.success());
    let stderr = String::from_utf8_lossy(&dup_output.stderr);
    assert!(stderr.contains("proj"));

    let mut list = gman();
    with_config(&mut list, &config).args(["repo", "list"]);
    let list_output = list.output().unwrap();
    assert_eq!(String::from_utf8_lossy(&list_output.stdout).lines().count(), 1);
}

#[test]
fn s5_switch_without_wrapper_env_fails_with_no_directive() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let repo = dir.path().join("r");
    std::fs::create_dir(&repo).unwrap();
    common::init_repo(&repo);

    let mut add = gman();
    with_config(&mut add, &config).args(["repo", "add", "proj", "--path"]).arg(&repo);
    assert!(add.output().unwrap().status.success());

    let mut switch = gman();
    with_config(&mut switch, &config)
        .env_remove("GMAN_SHELL_INTEGRATION")
        .env_remove("GMAN_SKIP_SHELL_CHECK")
        .args(["switch", "proj"]);
    let output = switch.output().unwrap();

    assert!(!output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("GMAN_CD:"));
}

#[test]
fn s6_switch_happy_path_emits_directive_and_updates_recent_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let repo = dir.path().join("r");
    std::fs::create_dir(&repo).unwrap();
    common::init_repo(&repo);
    let canonical_repo = dunce::canonicalize(&repo).unwrap();

    let mut add = gman();
    with_config(&mut add, &config).args(["repo", "add", "proj", "--path"]).arg(&repo);
    assert!(add.output().unwrap().status.success());

    let mut switch = gman();
    with_config(&mut switch, &config)
        .env("GMAN_SHELL_INTEGRATION", "1")
        .args(["switch", "proj"]);
    let output = switch.output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, format!("GMAN_CD:{}", canonical_repo.display()));
    assert!(!stdout.ends_with('\n'));

    let mut recent = gman();
    with_config(&mut recent, &config).args(["repo", "recent"]);
    let recent_output = recent.output().unwrap();
    assert!(String::from_utf8_lossy(&recent_output.stdout).starts_with("proj\t"));
}

#[test]
fn s7_ambiguous_fuzzy_switch_lists_both_candidates() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let repo_api = dir.path().join("api");
    let repo_worker = dir.path().join("worker");
    std::fs::create_dir(&repo_api).unwrap();
    std::fs::create_dir(&repo_worker).unwrap();
    common::init_repo(&repo_api);
    common::init_repo(&repo_worker);

    for (alias, path) in [("backend-api", &repo_api), ("backend-worker", &repo_worker)] {
        let mut add = gman();
        with_config(&mut add, &config).args(["repo", "add", alias, "--path"]).arg(path);
        assert!(add.output().unwrap().status.success());
    }

    let mut switch = gman();
    with_config(&mut switch, &config)
        .env("GMAN_SHELL_INTEGRATION", "1")
        .args(["switch", "backend"]);
    let output = switch.output().unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("multiple") || stderr.contains("backend-api"));
    assert!(stderr.contains("backend-api"));
    assert!(stderr.contains("backend-worker"));
    assert!(!String::from_utf8_lossy(&output.stdout).contains("GMAN_CD:"));
}

#[test]
fn s8_batch_commit_only_touches_dirty_repos() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let repo_a = dir.path().join("a");
    let repo_b = dir.path().join("b");
    let repo_c = dir.path().join("c");
    for repo in [&repo_a, &repo_b, &repo_c] {
        std::fs::create_dir(repo).unwrap();
        common::init_repo(repo);
    }
    std::fs::write(repo_a.join("f.txt"), "dirty a").unwrap();
    std::fs::write(repo_b.join("f.txt"), "dirty b").unwrap();

    for (alias, path) in [("a", &repo_a), ("b", &repo_b), ("c", &repo_c)] {
        let mut add = gman();
        with_config(&mut add, &config).args(["repo", "add", alias, "--path"]).arg(path);
        assert!(add.output().unwrap().status.success());
    }

    let mut commit = gman();
    with_config(&mut commit, &config).args(["work", "commit", "-m", "x", "-a"]);
    let output = commit.output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 successful"));
    assert!(!stdout.lines().any(|l| l.starts_with("c:")));
}
