//! Local and remote branch lookups
//!
//! Existence checks are advisory: any git failure means "no".

use crate::domain::worktree::list_records;
use crate::integrations::git::GitRunner;

/// Remote preferred when several remotes carry the same branch
pub const DEFAULT_REMOTE: &str = "origin";

/// Branch checked out in the primary checkout, if there is one
pub fn main_branch_name<G: GitRunner>(git: &G) -> Option<String> {
    list_records(git, true)
        .into_iter()
        .next()
        .filter(|record| record.is_main)
        .and_then(|record| record.branch.name().map(str::to_string))
}

/// Whether `refs/heads/<branch>` exists
pub fn branch_exists_locally<G: GitRunner>(git: &G, branch: &str) -> bool {
    let reference = format!("refs/heads/{branch}");
    git.quiet(&["rev-parse", "--verify", "--quiet", &reference])
        .is_ok()
}

/// Find a remote-tracking branch named `<remote>/<branch>`
///
/// Remotes are refreshed first. With several candidates the one on
/// [`DEFAULT_REMOTE`] wins, otherwise git's first.
pub fn find_remote_branch<G: GitRunner>(git: &G, branch: &str) -> Option<String> {
    if let Err(err) = git.echo(&["remote", "update"]) {
        log::debug!("remote update failed, using existing remote refs: {err}");
    }

    let pattern = format!("refs/remotes/*/{branch}");
    let output = match git.quiet(&["for-each-ref", "--format=%(refname:short)", &pattern]) {
        Ok(output) => output,
        Err(err) => {
            log::debug!("remote branch search failed: {err}");
            return None;
        }
    };

    let candidates: Vec<String> = output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    select_remote_candidate(&candidates)
}

/// Pick one remote ref from git's enumeration
#[must_use]
pub fn select_remote_candidate(candidates: &[String]) -> Option<String> {
    let preferred = format!("{DEFAULT_REMOTE}/");
    match candidates {
        [] => None,
        [only] => Some(only.clone()),
        several => several
            .iter()
            .find(|c| c.starts_with(&preferred))
            .or_else(|| several.first())
            .cloned(),
    }
}

/// Short names of all local branches; empty on failure
pub fn local_branches<G: GitRunner>(git: &G) -> Vec<String> {
    short_refs(git, "refs/heads/")
}

/// Branch names found on any remote, remote prefix removed; empty on failure
///
/// Symbolic refs such as `origin/HEAD` (short name `origin`) are skipped.
pub fn remote_branch_names<G: GitRunner>(git: &G) -> Vec<String> {
    short_refs(git, "refs/remotes/")
        .into_iter()
        .filter_map(|r| r.split_once('/').map(|(_, name)| name.to_string()))
        .collect()
}

fn short_refs<G: GitRunner>(git: &G, prefix: &str) -> Vec<String> {
    match git.quiet(&["for-each-ref", "--format=%(refname:short)", prefix]) {
        Ok(output) => output
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect(),
        Err(err) => {
            log::debug!("listing {prefix} failed: {err}");
            Vec::new()
        }
    }
}
