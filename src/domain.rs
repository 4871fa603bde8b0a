//! Domain logic: parsing git's worktree listings, reconciling them with the
//! worktree directory, branch lookups and repository resolution.

pub mod branch;
pub mod display;
pub mod locate;
pub mod paths;
pub mod reconcile;
pub mod worktree;
