//! Throwaway repositories and an isolated `gwt` command for integration tests
#![allow(dead_code, deprecated)]

use std::path::{Path, PathBuf};
use std::process::Command;

/// Run git in `dir`, panicking with its stderr on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env_remove("GIT_DIR")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// `git init` with a `main` branch, a committer identity and one commit
pub fn init_repo(parent: &Path, name: &str) -> PathBuf {
    let repo = parent.join(name);
    std::fs::create_dir_all(&repo).unwrap();
    git(&repo, &["init", "-b", "main"]);
    configure_identity(&repo);
    git(&repo, &["commit", "--allow-empty", "-m", "Initial commit"]);
    repo.canonicalize().unwrap()
}

pub fn configure_identity(repo: &Path) {
    git(repo, &["config", "user.name", "Test User"]);
    git(repo, &["config", "user.email", "test@example.com"]);
}

/// Temp root with symlinks resolved, so paths compare equal to git's
pub fn root(temp: &assert_fs::TempDir) -> PathBuf {
    temp.path().canonicalize().unwrap()
}

/// `gwt` with its own config home and no inherited repository override
pub fn gwt(config_home: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::cargo_bin("gwt").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env("NO_COLOR", "1")
        .env("COLUMNS", "200")
        .env_remove("GWT_GIT_DIR")
        .env_remove("GIT_DIR")
        .env_remove("GWT_LOG");
    cmd
}

pub fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}
