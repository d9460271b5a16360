//! UI module for consistent CLI output
//!
//! Uses `cliclack` for interactive prompts and spinners, with automatic
//! fallback to plain output in CI and when stdout is piped.
//!
//! # Example
//!
//! ```rust,ignore
//! use festboard::ui::{self, UiContext, TaskSpinner};
//!
//! let ctx = UiContext::detect().with_auto_yes(args.yes);
//!
//! let mut spinner = TaskSpinner::new(&ctx);
//! spinner.start("Installing cache generation...");
//! spinner.stop("Generation arts-fest-v2 active");
//!
//! if ui::confirm(&ctx, "Remove every cache generation?", false).await? {
//!     ui::step_ok(&ctx, "Removed 2 cache generation(s)");
//! }
//! ```

mod context;
mod output;
mod progress;
mod prompts;
mod theme;

pub use context::UiContext;
pub use output::{intro, key_value, remark, section, step_info, step_ok, step_ok_detail, step_warn_hint};
pub use progress::TaskSpinner;
pub use prompts::confirm;
pub use theme::{init_theme, FestTheme};
