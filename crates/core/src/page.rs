//! Host page trait: the foreign chat page DOM, seen through opaque handles.
//!
//! Rolecast does not own the page it runs on. The chat vendor controls the
//! markup and its framework state, so the engine only ever touches the page
//! through this narrow surface and must tolerate any call failing.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PageError;

/// Opaque handle to an element in the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a chat platform's prompt input accepts text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditingMode {
    /// A rich-text region (`contenteditable`); written as markup
    ContentEditable,
    /// A value-bearing field (`<textarea>`, `<input>`); written as a value
    PlainField,
}

/// Notifications dispatched after writing, so the page's own framework
/// picks up the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntheticEvent {
    Input,
    Change,
}

impl SyntheticEvent {
    /// DOM event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            SyntheticEvent::Input => "input",
            SyntheticEvent::Change => "change",
        }
    }

    /// Both events bubble so delegated listeners see them.
    pub fn bubbles(&self) -> bool {
        true
    }
}

/// A row in the role selector dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuItem {
    /// Non-selectable area label
    Header { label: String },
    /// Selectable role entry
    Role { id: String, label: String },
}

/// User interaction with the mounted selector UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// The selector button was clicked
    ButtonActivated,
    /// A click landed outside the selector UI
    OutsideClick,
    /// A role entry was picked from the dropdown
    RoleChosen(String),
}

/// The host page DOM.
///
/// Reads of missing elements return `None`. The page may mutate between any
/// two calls, so every write reports failure instead of panicking.
pub trait Page: Send + Sync {
    /// Full current URL (changes on client-side navigation).
    fn url(&self) -> String;

    /// Current hostname.
    fn hostname(&self) -> String;

    /// First element matching `selector`, if any.
    fn query_selector(&self, selector: &str) -> Option<ElementId>;

    /// Whether the element is still attached to the document.
    fn is_connected(&self, element: ElementId) -> bool;

    /// Rendered text of an element (content-editable regions).
    fn text_content(&self, element: ElementId) -> Result<String, PageError>;

    /// Value of a plain field.
    fn value(&self, element: ElementId) -> Result<String, PageError>;

    fn set_value(&self, element: ElementId, value: &str) -> Result<(), PageError>;

    fn set_inner_html(&self, element: ElementId, html: &str) -> Result<(), PageError>;

    fn dispatch(&self, element: ElementId, event: SyntheticEvent) -> Result<(), PageError>;

    /// Place the caret after the last character of a plain field.
    fn move_caret_to_end(&self, element: ElementId) -> Result<(), PageError>;

    /// Collapse the document selection to the end of a content-editable region.
    fn collapse_selection_to_end(&self, element: ElementId) -> Result<(), PageError>;

    fn focus(&self, element: ElementId) -> Result<(), PageError>;

    /// Insert the selector button next to `anchor`, returning the button.
    fn mount_selector(&self, anchor: ElementId) -> Result<ElementId, PageError>;

    /// Show the dropdown under `button` with `items`, or hide it on `None`.
    fn render_menu(&self, button: ElementId, items: Option<&[MenuItem]>) -> Result<(), PageError>;

    /// Detach an element this system inserted.
    fn remove(&self, element: ElementId);
}
