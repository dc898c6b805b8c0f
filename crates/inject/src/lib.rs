//! Rolecast injection engine.
//!
//! Runs inside one host page: recognizes the chat platform, waits for its
//! prompt input, mounts the role selector next to it, and merges the chosen
//! role's text into whatever the user has already typed.

pub mod engine;
pub mod merge;
pub mod selector;
pub mod session;
pub mod sim;

pub use engine::{EngineSettings, EngineState, InjectionEngine};
pub use merge::{apply_merge, merge_text, text_to_markup};
pub use selector::{RoleGroup, SelectorMenu, group_roles, menu_items};
pub use session::InjectionSession;
pub use sim::{SELECTOR_BUTTON, SimulatedPage};
