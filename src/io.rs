//! Status output.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use lazy_static::lazy_static;
use std::fmt;

lazy_static! {
    /// Progress bar style used when none is specified.
    pub static ref DEFAULT_PROGRESS_STYLE: ProgressStyle = ProgressStyle::default_bar()
        .template("Progress: {bar:40}  {percent}% | ETA: {eta}")
        .unwrap_or_else(|_| ProgressStyle::default_bar());
}

/// How much non-critical status information to print.
#[derive(Clone, Default)]
pub enum Verbosity {
    /// Print nothing.
    #[default]
    Quiet,
    /// Print status messages.
    Messages,
    /// Print status messages and show progress bars with the given style
    /// for long-running operations.
    Progress(ProgressStyle),
}

impl Verbosity {
    /// Creates a verbosity showing progress bars with the default style.
    pub fn with_default_progress() -> Self {
        Self::Progress(DEFAULT_PROGRESS_STYLE.clone())
    }

    /// Whether status messages should be printed.
    pub fn print_messages(&self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Whether progress bars should be shown.
    pub fn show_progress(&self) -> bool {
        matches!(self, Self::Progress(_))
    }

    /// Creates a progress bar for the given number of items, hidden unless
    /// progress should be shown.
    pub fn create_progress_bar(&self, n_items: usize) -> ProgressBar {
        match self {
            Self::Progress(style) => ProgressBar::new(n_items as u64).with_style(style.clone()),
            _ => ProgressBar::with_draw_target(Some(n_items as u64), ProgressDrawTarget::hidden()),
        }
    }
}

impl fmt::Debug for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Quiet => "Quiet",
            Self::Messages => "Messages",
            Self::Progress(_) => "Progress",
        })
    }
}
