//! Progress indicators for fixture runs.
//!
//! Bars draw only when stderr is an interactive terminal, so piped and CI
//! output stays clean.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{IsTerminal, stderr};

#[must_use]
pub fn should_show_progress() -> bool {
    stderr().is_terminal()
}

/// Determinate bar over `total` fixtures. Hidden unless `show`.
#[must_use]
pub fn create_progress_bar(total: u64, message: &str, show: bool) -> ProgressBar {
    let pb = ProgressBar::new(total);

    if show {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_or_else(|_| ProgressStyle::default_bar(), |style| style.progress_chars("=>-"));
        pb.set_style(style);
        pb.set_message(message.to_string());
    } else {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_bar_accepts_updates() {
        let pb = create_progress_bar(3, "fixtures", false);
        pb.set_message("hello_world");
        pb.inc(3);
        pb.finish_and_clear();
        assert_eq!(pb.position(), 3);
    }
}
