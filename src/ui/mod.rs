//! UI module for consistent CLI output
//!
//! Uses `cliclack` for interactive prompts and spinners with automatic
//! fallback to plain output in CI/non-interactive environments.
//!
//! # Example
//!
//! ```rust,ignore
//! use component_registry::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Fetching text/tokenize v3...");
//! // ... do work ...
//! spinner.stop("Fetched v3 of tokenize");
//!
//! if ui::confirm(&ctx, "Delete text/tokenize?", false)? {
//!     ui::step_ok(&ctx, "Deleted text/tokenize");
//! }
//! ```

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, remark, section, step_info, step_ok, step_ok_detail,
    step_warn, step_warn_hint,
};
pub use progress::TaskSpinner;
pub use prompts::confirm;
