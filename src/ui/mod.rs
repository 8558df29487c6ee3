//! Terminal output for the offgrid CLI
//!
//! Uses `cliclack` for styled steps and `indicatif` for request progress,
//! falling back to plain lines when stdout is not a terminal or when a
//! machine-readable format was requested.
//!
//! ```rust,ignore
//! use offgrid::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//! ui::intro(&ctx, "offgrid run");
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Installing red-social-v1...");
//! spinner.stop("Installed (6 entries)");
//! ```

mod context;
mod output;
mod progress;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, outro_warn, remark, section, step_error_detail, step_ok,
    step_ok_detail, step_warn_hint,
};
pub use progress::{RequestProgress, TaskSpinner};
