//! Per-page injection session.
//!
//! Everything the engine holds about the current page lives here and is
//! owned by exactly one engine. It is torn down and rebuilt whenever the URL
//! changes or the input element leaves the document.

use rolecast_core::page::{ElementId, Page};
use rolecast_platforms::PlatformDescriptor;
use tracing::debug;

use crate::selector::SelectorMenu;

#[derive(Debug, Clone, Default)]
pub struct InjectionSession {
    /// Detected platform; `None` on unsupported pages
    pub platform: Option<&'static PlatformDescriptor>,

    /// The prompt input, once found
    pub input: Option<ElementId>,

    /// Our selector button, when mounted
    pub button: Option<ElementId>,

    pub menu: SelectorMenu,

    /// URL the session was built for
    pub url: String,
}

impl InjectionSession {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn button_mounted(&self) -> bool {
        self.button.is_some()
    }

    /// Remove mounted UI and forget the page's elements. The URL is kept.
    pub fn reset(&mut self, page: &dyn Page) {
        if let Some(button) = self.button.take() {
            debug!(button = %button, "Removing selector button");
            page.remove(button);
        }
        self.menu.close();
        self.input = None;
        self.platform = None;
    }
}
