#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Instant;

/// Failure of a git subprocess
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    /// git could not be started at all
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// git ran and exited nonzero
    #[error("`{command}` failed: {}", self.failure_text())]
    Failed {
        command: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

impl GitError {
    /// The most precise diagnosis available: git's stderr, then stdout, then our own summary
    pub fn message(&self) -> String {
        match self {
            Self::Spawn { .. } => self.to_string(),
            Self::Failed { stdout, stderr, .. } => {
                if !stderr.trim().is_empty() {
                    stderr.trim().to_string()
                } else if !stdout.trim().is_empty() {
                    stdout.trim().to_string()
                } else {
                    self.to_string()
                }
            }
        }
    }

    fn failure_text(&self) -> String {
        match self {
            Self::Failed {
                code: Some(code),
                stderr,
                ..
            } if stderr.trim().is_empty() => format!("exit status {code}"),
            Self::Failed { stderr, .. } if !stderr.trim().is_empty() => stderr.trim().to_string(),
            _ => "terminated by signal".to_string(),
        }
    }
}

/// Git invocation interface scoped to a single repository location
///
/// Every call names the repository explicitly; nothing depends on the
/// working directory of the process except `in_worktree`.
pub trait GitRunner {
    /// Repository location (`.git` directory or bare repository) this runner targets
    fn git_dir(&self) -> &Path;

    /// Run a git subcommand and capture its output without echoing it
    fn quiet(&self, args: &[&str]) -> Result<String, GitError>;

    /// Run a git subcommand, capture its output and forward it to stderr
    fn echo(&self, args: &[&str]) -> Result<String, GitError>;

    /// Run a git subcommand attached to the terminal (it may prompt)
    ///
    /// # Arguments
    /// * `args` - Subcommand and arguments
    /// * `cwd` - Optional working directory for the child process
    fn interactive(&self, args: &[&str], cwd: Option<&Path>) -> Result<(), GitError>;

    /// Run a git subcommand inside a checkout (`git -C <path>`), captured
    fn in_worktree(&self, path: &Path, args: &[&str]) -> Result<String, GitError>;
}

/// Real git implementation
#[derive(Debug, Clone)]
pub struct RealGit {
    git_dir: PathBuf,
}

impl RealGit {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    fn scoped(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg(format!("--git-dir={}", self.git_dir.display()))
            .args(args);
        cmd
    }
}

impl GitRunner for RealGit {
    fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn quiet(&self, args: &[&str]) -> Result<String, GitError> {
        capture(&mut self.scoped(args))
    }

    fn echo(&self, args: &[&str]) -> Result<String, GitError> {
        let mut cmd = self.scoped(args);
        let command = describe(&cmd);
        let output = run(&mut cmd)?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        // stdout is reserved for the shell wrapper, git's chatter goes to stderr
        if !stdout.is_empty() {
            eprint!("{stdout}");
        }
        if !stderr.is_empty() {
            eprint!("{stderr}");
        }
        if output.status.success() {
            Ok(stdout)
        } else {
            Err(GitError::Failed {
                command,
                code: output.status.code(),
                stdout,
                stderr,
            })
        }
    }

    fn interactive(&self, args: &[&str], cwd: Option<&Path>) -> Result<(), GitError> {
        let mut cmd = self.scoped(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }
        // Keep stdout clean for the shell wrapper; the child talks to the user on stderr
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::from(std::io::stderr()))
            .stderr(Stdio::inherit());

        let command = describe(&cmd);
        log::debug!("$ {command}");
        let status = cmd.status().map_err(|source| GitError::Spawn {
            command: command.clone(),
            source,
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(GitError::Failed {
                command,
                code: status.code(),
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    fn in_worktree(&self, path: &Path, args: &[&str]) -> Result<String, GitError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(path).args(args);
        capture(&mut cmd)
    }
}

/// Ask git which repository the given directory belongs to
///
/// Runs `git rev-parse --git-common-dir` with no location argument. Relative
/// answers are resolved against `cwd`. Returns None when git fails or the
/// answer is not an existing directory.
pub fn detect_common_dir(cwd: &Path) -> Option<PathBuf> {
    let mut cmd = Command::new("git");
    cmd.args(["rev-parse", "--git-common-dir"]).current_dir(cwd);

    let stdout = match capture(&mut cmd) {
        Ok(stdout) => stdout,
        Err(err) => {
            log::debug!("auto-detection found no repository: {err}");
            return None;
        }
    };

    let answer = stdout.trim();
    if answer.is_empty() {
        return None;
    }

    let path = PathBuf::from(answer);
    let absolute = if path.is_absolute() {
        path
    } else {
        crate::domain::paths::normalize_lexically(&cwd.join(path))
    };

    absolute.is_dir().then_some(absolute)
}

fn capture(cmd: &mut Command) -> Result<String, GitError> {
    let command = describe(cmd);
    let output = run(cmd)?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();

    if output.status.success() {
        Ok(stdout)
    } else {
        Err(GitError::Failed {
            command,
            code: output.status.code(),
            stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Execute with debug tracing; the only place captured git commands are spawned
fn run(cmd: &mut Command) -> Result<Output, GitError> {
    let command = describe(cmd);
    log::debug!("$ {command}");

    let started = Instant::now();
    let result = cmd.stdin(Stdio::null()).output();
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(output) => {
            log::debug!(
                "[gwt-trace] cmd=\"{command}\" dur={duration_ms:.1}ms ok={}",
                output.status.success()
            );
            Ok(output)
        }
        Err(source) => {
            log::debug!("[gwt-trace] cmd=\"{command}\" dur={duration_ms:.1}ms err=\"{source}\"");
            Err(GitError::Spawn { command, source })
        }
    }
}

fn describe(cmd: &Command) -> String {
    let program = cmd.get_program().to_string_lossy().to_string();
    let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy()).collect();
    if args.is_empty() {
        program
    } else {
        format!("{program} {}", args.join(" "))
    }
}

#[cfg(test)]
pub mod testing {
    //! Scripted git runner shared by unit tests

    use super::{GitError, GitRunner};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    /// Mock git runner: responses keyed by the space-joined argument list
    ///
    /// Unscripted commands fail with exit status 1. Every call is recorded.
    pub struct MockGit {
        git_dir: PathBuf,
        responses: HashMap<String, Result<String, String>>,
        calls: RefCell<Vec<String>>,
    }

    impl MockGit {
        pub fn new(git_dir: impl Into<PathBuf>) -> Self {
            Self {
                git_dir: git_dir.into(),
                responses: HashMap::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn ok(mut self, args: &str, stdout: &str) -> Self {
            self.responses
                .insert(args.to_string(), Ok(stdout.to_string()));
            self
        }

        pub fn fail(mut self, args: &str, stderr: &str) -> Self {
            self.responses
                .insert(args.to_string(), Err(stderr.to_string()));
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        pub fn called(&self, prefix: &str) -> bool {
            self.calls.borrow().iter().any(|c| c.starts_with(prefix))
        }

        fn respond(&self, key: String) -> Result<String, GitError> {
            self.calls.borrow_mut().push(key.clone());
            match self.responses.get(&key) {
                Some(Ok(stdout)) => Ok(stdout.clone()),
                Some(Err(stderr)) => Err(GitError::Failed {
                    command: format!("git {key}"),
                    code: Some(128),
                    stdout: String::new(),
                    stderr: stderr.clone(),
                }),
                None => Err(GitError::Failed {
                    command: format!("git {key}"),
                    code: Some(1),
                    stdout: String::new(),
                    stderr: String::new(),
                }),
            }
        }
    }

    impl GitRunner for MockGit {
        fn git_dir(&self) -> &Path {
            &self.git_dir
        }

        fn quiet(&self, args: &[&str]) -> Result<String, GitError> {
            self.respond(args.join(" "))
        }

        fn echo(&self, args: &[&str]) -> Result<String, GitError> {
            self.respond(args.join(" "))
        }

        fn interactive(&self, args: &[&str], _cwd: Option<&Path>) -> Result<(), GitError> {
            self.respond(args.join(" ")).map(|_| ())
        }

        fn in_worktree(&self, path: &Path, args: &[&str]) -> Result<String, GitError> {
            self.respond(format!("-C {} {}", path.display(), args.join(" ")))
        }
    }
}
