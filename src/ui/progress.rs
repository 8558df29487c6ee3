//! Progress indicators with CI fallback

use super::context::UiContext;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// A task spinner with CI fallback
pub struct TaskSpinner {
    spinner: Option<cliclack::ProgressBar>,
    interactive: bool,
    quiet: bool,
}

impl TaskSpinner {
    pub fn new(ctx: &UiContext) -> Self {
        Self {
            spinner: None,
            interactive: ctx.use_fancy_output(),
            quiet: ctx.is_quiet(),
        }
    }

    /// Start the spinner with a message
    pub fn start(&mut self, message: &str) {
        if self.quiet {
            return;
        }
        if self.interactive {
            let spinner = cliclack::spinner();
            spinner.start(message);
            self.spinner = Some(spinner);
        } else {
            println!("{} {}", style("...").dim(), message);
        }
    }

    /// Stop with success message
    pub fn stop(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if !self.quiet {
            println!("{} {}", style("[OK]").green(), message);
        }
    }

    /// Stop with warning message
    pub fn stop_warn(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.stop(message);
        } else if !self.quiet {
            println!("{} {}", style("[WARN]").yellow(), message);
        }
    }

    /// Stop with error message
    pub fn stop_error(&mut self, message: &str) {
        if let Some(spinner) = self.spinner.take() {
            spinner.error(message);
        } else if !self.quiet {
            println!("{} {}", style("[FAIL]").red(), message);
        }
    }
}

/// Bar over the requests sent through the agent.
///
/// Only drawn in interactive mode; plain runs print nothing since the
/// results table follows.
pub struct RequestProgress {
    bar: Option<ProgressBar>,
}

impl RequestProgress {
    pub fn new(ctx: &UiContext, total: usize) -> Self {
        let bar = if ctx.use_fancy_output() && total > 1 {
            let bar = ProgressBar::new(total as u64);
            let template = ProgressStyle::default_bar()
                .template("  {spinner:.cyan} Requesting  {bar:20.cyan/dim} {pos}/{len} {msg:.dim}")
                .map(|s| s.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ").progress_chars("━╸─"));
            if let Ok(template) = template {
                bar.set_style(template);
            }
            bar.enable_steady_tick(std::time::Duration::from_millis(120));
            Some(bar)
        } else {
            None
        };
        Self { bar }
    }

    /// Mark `url` as in flight
    pub fn on_request(&self, url: &str) {
        if let Some(ref bar) = self.bar {
            bar.set_message(shorten(url, 48));
        }
    }

    pub fn on_done(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

/// Truncate to `max` characters, keeping the tail
fn shorten(text: &str, max: usize) -> String {
    let count = text.chars().count();
    if count <= max {
        return text.to_string();
    }
    let tail: String = text.chars().skip(count - (max - 3)).collect();
    format!("...{}", tail)
}
