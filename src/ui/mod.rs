//! Terminal output for awsmap
//!
//! Uses `cliclack` for spinners and prompts with a plain-text fallback in
//! CI and non-interactive environments, and `indicatif` for the per-VPC
//! progress bar.
//!
//! # Example
//!
//! ```rust,ignore
//! use awsmap::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect();
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Fetching VPCs...");
//! // ... do work ...
//! spinner.stop("Found 3 VPCs");
//!
//! ui::step_ok_detail(&ctx, "Rendered VPC diagram", "images/123/vpcs.png");
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{
    intro, key_value, outro_success, remark, section, step_info, step_ok, step_ok_detail,
    step_warn_hint,
};
pub use progress::{MapProgress, TaskSpinner};
pub use prompts::confirm;
pub use theme::{init_theme, AwsmapTheme};
