//! Output mode detection

use std::io::IsTerminal;

/// Environment variables that mark a CI runner
const CI_MARKERS: &[&str] = &[
    "CI",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "JENKINS_URL",
    "BUILDKITE",
    "CODEBUILD_BUILD_ID",
    "TF_BUILD",
];

/// How the current run talks to the terminal
#[derive(Debug, Clone)]
pub struct UiContext {
    interactive: bool,
    auto_yes: bool,
    dry_run: bool,
}

impl UiContext {
    /// Detect from the attached terminal and CI markers
    pub fn detect() -> Self {
        let tty = std::io::stdout().is_terminal() && std::io::stdin().is_terminal();
        let ci = CI_MARKERS.iter().any(|var| std::env::var_os(var).is_some());
        Self {
            interactive: tty && !ci,
            auto_yes: false,
            dry_run: false,
        }
    }

    /// Plain output, no prompts
    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
            dry_run: false,
        }
    }

    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }

    /// Whether side effects are being skipped for this run
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Spinners and colored log lines
    pub fn use_fancy_output(&self) -> bool {
        self.interactive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_defaults() {
        let ctx = UiContext::non_interactive();
        assert!(!ctx.is_interactive());
        assert!(!ctx.auto_yes());
        assert!(!ctx.dry_run());
    }

    #[test]
    fn builder_flags() {
        let ctx = UiContext::non_interactive()
            .with_auto_yes(true)
            .with_dry_run(true);
        assert!(ctx.auto_yes());
        assert!(ctx.dry_run());
        assert!(!ctx.use_fancy_output());
    }
}
