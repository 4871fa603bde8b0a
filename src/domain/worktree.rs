//! Worktree records and the parsers that build them
//!
//! Git can describe its worktrees in two formats: the structured
//! `git worktree list --porcelain` blocks and the older one-line-per-worktree
//! `git worktree list`. Both are normalized into [`WorktreeRecord`].

use std::path::{Path, PathBuf};

use crate::integrations::git::GitRunner;

/// Short revisions are cut to this many characters
pub const HEAD_WIDTH: usize = 10;

/// Literal git uses for a checkout that is not on a branch
pub const DETACHED_MARKER: &str = "(detached)";

/// Branch a worktree has checked out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Branch {
    Named(String),
    Detached,
    /// Source did not say (bare entry, unparseable line)
    Unknown,
}

impl Branch {
    /// Interpret the value of a porcelain `branch` line
    #[must_use]
    pub fn from_ref(reference: &str) -> Self {
        if reference == DETACHED_MARKER {
            Self::Detached
        } else {
            Self::Named(
                reference
                    .strip_prefix("refs/heads/")
                    .unwrap_or(reference)
                    .to_string(),
            )
        }
    }

    /// Interpret the trailing branch token of a legacy listing line
    #[must_use]
    pub fn from_legacy_token(token: &str) -> Self {
        if token.starts_with("(detached") || token.starts_with("(HEAD") {
            return Self::Detached;
        }
        match token.strip_prefix('[') {
            Some(rest) => {
                let name = rest.strip_suffix(']').unwrap_or(rest);
                if name.is_empty() {
                    Self::Unknown
                } else {
                    Self::Named(name.to_string())
                }
            }
            None => Self::Unknown,
        }
    }

    /// Branch name, if the worktree is on one
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Detached | Self::Unknown => None,
        }
    }

    /// Text for display; empty for unknown
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Detached => DETACHED_MARKER,
            Self::Unknown => "",
        }
    }
}

/// One checkout as reported by git
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeRecord {
    pub path: PathBuf,
    /// Short revision, at most [`HEAD_WIDTH`] characters, empty when unavailable
    pub head: String,
    pub branch: Branch,
    /// First record of the listing (the primary checkout or the bare repository)
    pub is_main: bool,
    pub locked: bool,
    pub prunable: bool,
}

impl WorktreeRecord {
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.branch == Branch::Detached
    }
}

/// Fields accumulated for the porcelain block being read
#[derive(Default)]
struct PendingBlock {
    path: String,
    head: String,
    branch: Option<Branch>,
    locked: bool,
    prunable: bool,
}

impl PendingBlock {
    fn finish(self, is_main: bool) -> WorktreeRecord {
        WorktreeRecord {
            path: PathBuf::from(self.path),
            head: truncate_head(&self.head),
            branch: self.branch.unwrap_or(Branch::Unknown),
            is_main,
            locked: self.locked,
            prunable: self.prunable,
        }
    }
}

/// Parse `git worktree list --porcelain` output
///
/// A block starts at each `worktree <path>` line. Lines that come before the
/// first block or that are not understood are ignored. A block cut short at the
/// end of input is still emitted with defaults for what is missing.
#[must_use]
pub fn parse_porcelain(output: &str, include_main: bool) -> Vec<WorktreeRecord> {
    let mut records = Vec::new();
    let mut current: Option<PendingBlock> = None;

    for line in output.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(block) = current.take() {
                records.push(block.finish(records.is_empty()));
            }
            current = Some(PendingBlock {
                path: path.trim().to_string(),
                ..PendingBlock::default()
            });
            continue;
        }

        let Some(block) = current.as_mut() else {
            continue;
        };

        let (key, value) = line.split_once(' ').unwrap_or((line, ""));
        match key {
            "HEAD" => block.head = value.trim().to_string(),
            "branch" => block.branch = Some(Branch::from_ref(value.trim())),
            "detached" => block.branch = Some(Branch::Detached),
            "locked" => block.locked = true,
            "prunable" => block.prunable = true,
            _ => {}
        }
    }

    if let Some(block) = current {
        records.push(block.finish(records.is_empty()));
    }

    drop_main_unless(records, include_main)
}

/// A legacy listing line split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyLine {
    pub path: PathBuf,
    pub branch: Branch,
}

/// Parse the `git worktree list` one-line-per-worktree format
///
/// Lines look like `<path>  <revision> [<branch>]`, with `(detached HEAD)`
/// or `(bare)` in place of the branch token. Paths may contain spaces; the
/// path ends before the revision token.
#[must_use]
pub fn parse_legacy_lines(output: &str) -> Vec<LegacyLine> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_legacy_line)
        .collect()
}

fn parse_legacy_line(line: &str) -> LegacyLine {
    let tokens = tokens_with_offsets(line);

    // The revision token is followed by the branch token or ends the line
    let revision_index = (1..tokens.len()).find(|&i| {
        let (_, token) = tokens[i];
        let looks_like_revision = token == "(bare)"
            || (token.len() >= 4 && token.chars().all(|c| c.is_ascii_hexdigit()));
        let next_fits = tokens
            .get(i + 1)
            .is_none_or(|(_, next)| next.starts_with('[') || next.starts_with('('));
        looks_like_revision && next_fits
    });

    let Some(index) = revision_index else {
        let path = tokens.first().map_or("", |(_, t)| t);
        return LegacyLine {
            path: PathBuf::from(path),
            branch: Branch::Unknown,
        };
    };

    let path = line[..tokens[index].0].trim_end();
    let branch = if tokens[index].1 == "(bare)" {
        Branch::Unknown
    } else {
        tokens
            .get(index + 1)
            .map_or(Branch::Unknown, |(offset, _)| {
                branch_token(&line[*offset..])
            })
    };

    LegacyLine {
        path: PathBuf::from(path),
        branch,
    }
}

/// The bracketed branch token, or a parenthesized group such as `(detached HEAD)`
fn branch_token(rest: &str) -> Branch {
    let end = if rest.starts_with('[') {
        rest.find(']').map(|i| i + 1)
    } else {
        rest.find(')').map(|i| i + 1)
    };
    Branch::from_legacy_token(&rest[..end.unwrap_or(rest.len())])
}

fn tokens_with_offsets(line: &str) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut start = None;
    for (i, c) in line.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                tokens.push((s, &line[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, &line[s..]));
    }
    tokens
}

/// Read the structured listing; None when git cannot produce it
pub fn list_porcelain<G: GitRunner>(git: &G, include_main: bool) -> Option<Vec<WorktreeRecord>> {
    match git.quiet(&["worktree", "list", "--porcelain"]) {
        Ok(output) => Some(parse_porcelain(&output, include_main)),
        Err(err) => {
            log::debug!("porcelain listing unavailable: {err}");
            None
        }
    }
}

/// Read the legacy listing, looking up each record's revision
///
/// A failed listing yields no records. A failed revision lookup leaves that
/// record's head empty. Lookups run one after another in listing order.
pub fn list_legacy<G: GitRunner>(git: &G, include_main: bool) -> Vec<WorktreeRecord> {
    let output = match git.quiet(&["worktree", "list"]) {
        Ok(output) => output,
        Err(err) => {
            log::debug!("legacy listing failed: {err}");
            return Vec::new();
        }
    };

    let records = parse_legacy_lines(&output)
        .into_iter()
        .enumerate()
        .map(|(index, line)| {
            let head = lookup_head(git, &line.path);
            WorktreeRecord {
                path: line.path,
                head,
                branch: line.branch,
                is_main: index == 0,
                locked: false,
                prunable: false,
            }
        })
        .collect();

    drop_main_unless(records, include_main)
}

/// Structured listing with a fallback to the legacy one
pub fn list_records<G: GitRunner>(git: &G, include_main: bool) -> Vec<WorktreeRecord> {
    list_porcelain(git, include_main).unwrap_or_else(|| list_legacy(git, include_main))
}

fn lookup_head<G: GitRunner>(git: &G, path: &Path) -> String {
    match git.in_worktree(path, &["rev-parse", "--short=10", "HEAD"]) {
        Ok(out) => truncate_head(out.trim()),
        Err(err) => {
            log::debug!("no revision for {}: {err}", path.display());
            String::new()
        }
    }
}

fn truncate_head(head: &str) -> String {
    head.chars().take(HEAD_WIDTH).collect()
}

fn drop_main_unless(mut records: Vec<WorktreeRecord>, include_main: bool) -> Vec<WorktreeRecord> {
    if !include_main && !records.is_empty() {
        records.remove(0);
    }
    records
}
