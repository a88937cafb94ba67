//! Terminal output for CLI commands
//!
//! Everything here writes to stderr so that stdout carries only command
//! output (stylesheets, keys, JSON). `cliclack` renders the interactive
//! variants; CI and pipes get plain tagged lines.

mod output;
mod progress;
mod prompts;

pub use output::{key_value, remark, step_error_detail, step_ok, step_ok_detail, step_warn_hint};
pub use progress::TaskSpinner;
pub use prompts::confirm;

use std::io::IsTerminal;

/// Environment variables that mark a CI run
const CI_VARS: &[&str] = &["CI", "GITHUB_ACTIONS", "GITLAB_CI", "BUILDKITE", "TF_BUILD"];

/// Whether output may be interactive
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    interactive: bool,
    auto_yes: bool,
}

impl UiContext {
    /// Interactive when stderr and stdin are terminals outside CI
    pub fn detect() -> Self {
        let interactive = std::io::stderr().is_terminal()
            && std::io::stdin().is_terminal()
            && !CI_VARS.iter().any(|var| std::env::var_os(var).is_some());
        Self {
            interactive,
            auto_yes: false,
        }
    }

    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            auto_yes: false,
        }
    }

    /// Answer yes to every prompt
    pub fn with_auto_yes(mut self, yes: bool) -> Self {
        self.auto_yes = yes;
        self
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn auto_yes(&self) -> bool {
        self.auto_yes
    }
}
