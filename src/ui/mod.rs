//! Terminal output for the `cascade` binary
//!
//! Uses `cliclack` for prompts and styled log lines when attached to a
//! terminal, and plain prefixed lines in CI or when piped.

mod context;
mod output;
mod prompts;

pub use context::UiContext;
pub use output::{
    intro, key_value, key_value_status, remark, step_info, step_ok_detail, step_warn_hint,
};
pub use prompts::confirm;
