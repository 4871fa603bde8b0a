//! Worktree table rendering
//!
//! Rows are `[markers]  [branch]  [head]  [path]`. Cells are padded and
//! truncated on plain text first; colors are applied afterwards so escape
//! codes never count toward widths.

use std::cmp::Ordering;
use std::path::Path;

use crate::color::ColorMode;
use crate::domain::paths::{is_inside, rel_display_path};
use crate::domain::worktree::{WorktreeRecord, HEAD_WIDTH};

/// Terminal width assumed when it cannot be measured
pub const DEFAULT_WIDTH: usize = 80;

const SEP: &str = "  ";
const MARKER_WIDTH: usize = 2;
const MAX_BRANCH_WIDTH: usize = 40;
const MIN_AVAILABLE: usize = 20;
const MIN_PATH_WIDTH: usize = 10;

/// Inputs for rendering besides the records themselves
#[derive(Debug, Clone, Copy)]
pub struct RowOptions<'a> {
    pub git_dir: &'a Path,
    /// Working directory used to mark the current worktree
    pub cwd: Option<&'a Path>,
    /// Show every path absolute
    pub absolute: bool,
    /// Terminal width in columns
    pub width: usize,
    pub color_mode: ColorMode,
}

/// Render records as aligned rows
///
/// Sorted current worktree first, then the primary checkout, then by branch
/// name ignoring case. `is_dirty` is consulted once per record.
pub fn format_worktree_rows<F>(
    records: &[WorktreeRecord],
    is_dirty: F,
    options: &RowOptions<'_>,
) -> Vec<String>
where
    F: Fn(&WorktreeRecord) -> bool,
{
    let colorize = options.color_mode.should_colorize();
    let is_current = |r: &WorktreeRecord| options.cwd.is_some_and(|cwd| is_inside(&r.path, cwd));

    let mut sorted: Vec<(bool, &WorktreeRecord)> =
        records.iter().map(|r| (is_current(r), r)).collect();
    sorted.sort_by(|(a_cur, a), (b_cur, b)| {
        rank(*a_cur, a)
            .cmp(&rank(*b_cur, b))
            .then_with(|| compare_branches(a, b))
    });

    let longest_branch = sorted
        .iter()
        .map(|(_, r)| r.branch.label().chars().count())
        .max()
        .unwrap_or(0)
        .min(MAX_BRANCH_WIDTH);
    let fixed = MARKER_WIDTH + SEP.len() + HEAD_WIDTH + SEP.len();
    let available = options.width.saturating_sub(fixed).max(MIN_AVAILABLE);
    let branch_width = longest_branch.min(available / 2);
    let path_width = available
        .saturating_sub(branch_width + SEP.len())
        .max(MIN_PATH_WIDTH);

    sorted
        .into_iter()
        .map(|(current, record)| {
            let markers = markers(current, record, is_dirty(record));
            let branch_cell = fit(record.branch.label(), branch_width);
            let head_cell = fit(&record.head, HEAD_WIDTH);
            let path = rel_display_path(&record.path, options.git_dir, options.absolute);
            let path_cell = fit(&path, path_width);

            let (markers, branch_cell, path_cell) = if colorize {
                let mode = options.color_mode;
                (
                    color_markers(mode, &markers),
                    if current {
                        mode.colorize_current_branch(&branch_cell)
                    } else {
                        branch_cell
                    },
                    mode.colorize_path(&path_cell),
                )
            } else {
                (markers, branch_cell, path_cell)
            };

            format!("{markers}{SEP}{branch_cell}{SEP}{head_cell}{SEP}{path_cell}")
                .trim_end()
                .to_string()
        })
        .collect()
}

const fn rank(current: bool, record: &WorktreeRecord) -> u8 {
    if current {
        0
    } else if record.is_main {
        1
    } else {
        2
    }
}

fn compare_branches(a: &WorktreeRecord, b: &WorktreeRecord) -> Ordering {
    a.branch
        .label()
        .to_lowercase()
        .cmp(&b.branch.label().to_lowercase())
}

/// Two plain marker characters: current (`•`) and state (`M`, `L`, `P`, or `!` when dirty)
fn markers(current: bool, record: &WorktreeRecord, dirty: bool) -> String {
    let first = if current { '•' } else { ' ' };
    let second = if dirty {
        '!'
    } else if record.is_main {
        'M'
    } else if record.locked {
        'L'
    } else if record.prunable {
        'P'
    } else {
        ' '
    };
    format!("{first}{second}")
}

fn color_markers(mode: ColorMode, markers: &str) -> String {
    markers
        .chars()
        .map(|c| match c {
            '!' => mode.colorize_dirty_marker("!"),
            'L' => mode.colorize_locked_marker("L"),
            'P' => mode.colorize_prunable_marker("P"),
            other => other.to_string(),
        })
        .collect()
}

/// Pad to `width`, or cut to `width` ending in `…`
fn fit(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        return format!("{text}{}", " ".repeat(width - len));
    }
    if width <= 1 {
        return text.chars().take(width).collect();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}
