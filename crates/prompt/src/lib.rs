//! Role-to-prompt formatting.
//!
//! Turns a [`Role`](rolecast_core::Role) into the plain-text block that gets
//! merged into a chat input. The template is fixed; see [`format_role`].

pub mod formatter;

pub use formatter::{CONTEXT_HEADER, MORE_CONTEXT_PLACEHOLDER, TASK_PLACEHOLDER, format_role};
