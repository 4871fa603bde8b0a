use std::env;
use std::fmt;

use owo_colors::OwoColorize;

/// Color mode for terminal output
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Default)]
pub enum ColorMode {
    /// Always use colors
    Always,
    /// Automatically detect whether to use colors
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorMode {
    /// `--color` first, then `NO_COLOR`, then `TERM=dumb`, else auto
    #[must_use]
    pub fn resolve(cli_mode: Option<Self>) -> Self {
        if let Some(mode) = cli_mode {
            return mode;
        }
        let dumb_terminal = env::var("TERM").is_ok_and(|term| term == "dumb");
        if env::var_os("NO_COLOR").is_some() || dumb_terminal {
            return Self::Never;
        }
        Self::Auto
    }

    /// Whether stderr output gets ANSI styling
    ///
    /// stdout carries `cd` requests and completion lists and is never styled.
    #[must_use]
    pub fn should_colorize(self) -> bool {
        match self {
            Self::Always => true,
            Self::Auto => supports_color::on_cached(supports_color::Stream::Stderr).is_some(),
            Self::Never => false,
        }
    }

    /// Bold the branch cell of the worktree the user is in
    #[must_use]
    pub fn colorize_current_branch(self, text: &str) -> String {
        self.paint("1", text)
    }

    /// Dim a path cell
    #[must_use]
    pub fn colorize_path(self, text: &str) -> String {
        self.paint("2", text)
    }

    /// Red `!` for worktrees with uncommitted changes
    #[must_use]
    pub fn colorize_dirty_marker(self, text: &str) -> String {
        self.paint("31", text)
    }

    /// Yellow `L` for locked worktrees
    #[must_use]
    pub fn colorize_locked_marker(self, text: &str) -> String {
        self.paint("33", text)
    }

    /// Magenta `P` for prunable worktrees
    #[must_use]
    pub fn colorize_prunable_marker(self, text: &str) -> String {
        self.paint("35", text)
    }

    fn paint(self, sgr: &str, text: &str) -> String {
        if self.should_colorize() {
            format!("\x1b[{sgr}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Success,
    Info,
    Warn,
    Error,
}

/// A status line: symbol, then the message
pub struct Status<D> {
    tone: Tone,
    mode: ColorMode,
    message: D,
}

impl<D: fmt::Display> fmt::Display for Status<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self.tone {
            Tone::Success => "✓",
            Tone::Info => "ℹ",
            Tone::Warn => "⚠",
            Tone::Error => "✗",
        };
        if !self.mode.should_colorize() {
            return write!(f, "{symbol} {}", self.message);
        }
        match self.tone {
            Tone::Success => write!(f, "{} {}", symbol.bright_green().bold(), self.message),
            Tone::Info => write!(f, "{} {}", symbol.bright_cyan(), self.message),
            Tone::Warn => write!(f, "{} {}", symbol.bright_yellow(), self.message),
            Tone::Error => write!(f, "{} {}", symbol.bright_red().bold(), self.message),
        }
    }
}

pub const fn success<D: fmt::Display>(mode: ColorMode, message: D) -> Status<D> {
    Status {
        tone: Tone::Success,
        mode,
        message,
    }
}

pub const fn info<D: fmt::Display>(mode: ColorMode, message: D) -> Status<D> {
    Status {
        tone: Tone::Info,
        mode,
        message,
    }
}

pub const fn warn<D: fmt::Display>(mode: ColorMode, message: D) -> Status<D> {
    Status {
        tone: Tone::Warn,
        mode,
        message,
    }
}

pub const fn error<D: fmt::Display>(mode: ColorMode, message: D) -> Status<D> {
    Status {
        tone: Tone::Error,
        mode,
        message,
    }
}

/// Secondary text such as durations and hints
pub struct Dimmed<D> {
    mode: ColorMode,
    text: D,
}

impl<D: fmt::Display> fmt::Display for Dimmed<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.mode.should_colorize() {
            write!(f, "{}", self.text.to_string().dimmed())
        } else {
            write!(f, "{}", self.text)
        }
    }
}

pub const fn dim<D: fmt::Display>(mode: ColorMode, text: D) -> Dimmed<D> {
    Dimmed { mode, text }
}

/// One line of a post-create command tree
pub struct TreeItem<D> {
    mode: ColorMode,
    message: D,
    is_last: bool,
    depth: usize,
}

impl<D: fmt::Display> fmt::Display for TreeItem<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let indent = "  ".repeat(self.depth);
        let connector = if self.is_last { "└─" } else { "├─" };
        if self.mode.should_colorize() {
            write!(f, "{indent}{} {}", connector.dimmed(), self.message)
        } else {
            write!(f, "{indent}{connector} {}", self.message)
        }
    }
}

pub const fn tree_item<D: fmt::Display>(
    mode: ColorMode,
    message: D,
    is_last: bool,
    depth: usize,
) -> TreeItem<D> {
    TreeItem {
        mode,
        message,
        is_last,
        depth,
    }
}
