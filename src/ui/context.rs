//! Decides between styled and plain output

use std::io::IsTerminal;

/// Output behavior for one command invocation
#[derive(Debug, Clone)]
pub struct UiContext {
    /// Running in an interactive terminal
    interactive: bool,
    /// Decorative output suppressed (machine-readable formats)
    quiet: bool,
}

const CI_VARS: [&str; 6] = [
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "BUILDKITE",
    "JENKINS_URL",
    "TF_BUILD",
];

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        Self {
            interactive: Self::detect_interactive(),
            quiet: false,
        }
    }

    /// Plain output, for tests and pipes
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            quiet: false,
        }
    }

    /// Suppress banners, steps and spinners
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Spinners, bars and colors
    pub fn use_fancy_output(&self) -> bool {
        self.interactive && !self.quiet
    }

    fn detect_interactive() -> bool {
        if !std::io::stdout().is_terminal() {
            return false;
        }
        !CI_VARS.iter().any(|var| std::env::var(var).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_context() {
        let ctx = UiContext::non_interactive();
        assert!(!ctx.is_interactive());
        assert!(!ctx.is_quiet());
        assert!(!ctx.use_fancy_output());
    }

    #[test]
    fn quiet_disables_fancy_output() {
        let ctx = UiContext {
            interactive: true,
            quiet: false,
        };
        assert!(ctx.use_fancy_output());
        assert!(!ctx.with_quiet(true).use_fancy_output());
    }
}
