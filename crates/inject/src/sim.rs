//! In-memory host page.
//!
//! Stands in for a chat vendor's DOM in tests and in `rolecast simulate`.
//! Elements are matched by exact selector string, and every write, event,
//! focus change, and menu render is recorded for inspection.

use rolecast_core::error::PageError;
use rolecast_core::page::{EditingMode, ElementId, MenuItem, Page, SyntheticEvent};
use rolecast_platforms::hostname_of;
use std::collections::HashMap;
use std::sync::Mutex;

pub const SELECTOR_BUTTON: &str = "button.rolecast-selector";

#[derive(Debug)]
struct SimElement {
    selector: String,
    /// `None` for elements that take no text (our button)
    mode: Option<EditingMode>,
    value: String,
    html: String,
    connected: bool,
    caret_at_end: bool,
    events: Vec<SyntheticEvent>,
}

#[derive(Debug, Default)]
struct SimState {
    url: String,
    next_id: u64,
    order: Vec<u64>,
    elements: HashMap<u64, SimElement>,
    focused: Option<ElementId>,
    menu: Option<(ElementId, Vec<MenuItem>)>,
}

#[derive(Debug)]
pub struct SimulatedPage {
    state: Mutex<SimState>,
}

impl SimulatedPage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(SimState {
                url: url.into(),
                next_id: 1,
                ..SimState::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Client-side navigation: the URL changes, the document stays.
    pub fn navigate(&self, url: impl Into<String>) {
        self.lock().url = url.into();
    }

    pub fn insert_input(&self, selector: &str, mode: EditingMode) -> ElementId {
        self.insert_input_with(selector, mode, "")
    }

    /// Add an input element already holding `text`.
    pub fn insert_input_with(&self, selector: &str, mode: EditingMode, text: &str) -> ElementId {
        let (value, html) = match mode {
            EditingMode::PlainField => (text.to_string(), String::new()),
            EditingMode::ContentEditable => (String::new(), text.to_string()),
        };
        self.insert(SimElement {
            selector: selector.to_string(),
            mode: Some(mode),
            value,
            html,
            connected: true,
            caret_at_end: false,
            events: Vec::new(),
        })
    }

    fn insert(&self, element: SimElement) -> ElementId {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.order.push(id);
        state.elements.insert(id, element);
        ElementId(id)
    }

    /// The host page removes an element.
    pub fn detach(&self, element: ElementId) {
        let mut state = self.lock();
        if let Some(el) = state.elements.get_mut(&element.0) {
            el.connected = false;
        }
        if state.menu.as_ref().is_some_and(|(button, _)| *button == element) {
            state.menu = None;
        }
    }

    /// Text a user would see in the input.
    pub fn input_text(&self, element: ElementId) -> String {
        let state = self.lock();
        match state.elements.get(&element.0) {
            Some(el) if el.mode == Some(EditingMode::ContentEditable) => html_to_text(&el.html),
            Some(el) => el.value.clone(),
            None => String::new(),
        }
    }

    pub fn inner_html(&self, element: ElementId) -> String {
        self.lock()
            .elements
            .get(&element.0)
            .map(|el| el.html.clone())
            .unwrap_or_default()
    }

    pub fn events(&self, element: ElementId) -> Vec<SyntheticEvent> {
        self.lock()
            .elements
            .get(&element.0)
            .map(|el| el.events.clone())
            .unwrap_or_default()
    }

    pub fn caret_at_end(&self, element: ElementId) -> bool {
        self.lock()
            .elements
            .get(&element.0)
            .is_some_and(|el| el.caret_at_end)
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.lock().focused
    }

    /// Connected selector buttons, oldest first.
    pub fn mounted_buttons(&self) -> Vec<ElementId> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter(|id| {
                state
                    .elements
                    .get(*id)
                    .is_some_and(|el| el.connected && el.selector == SELECTOR_BUTTON)
            })
            .map(|id| ElementId(*id))
            .collect()
    }

    /// Items of the open dropdown, if one is showing.
    pub fn open_menu(&self) -> Option<Vec<MenuItem>> {
        self.lock().menu.as_ref().map(|(_, items)| items.clone())
    }

    fn with_connected<T>(
        &self,
        element: ElementId,
        f: impl FnOnce(&mut SimElement) -> Result<T, PageError>,
    ) -> Result<T, PageError> {
        let mut state = self.lock();
        match state.elements.get_mut(&element.0) {
            Some(el) if el.connected => f(el),
            _ => Err(PageError::ElementDetached(element.0)),
        }
    }

    fn with_editable<T>(
        &self,
        element: ElementId,
        f: impl FnOnce(&mut SimElement, EditingMode) -> Result<T, PageError>,
    ) -> Result<T, PageError> {
        self.with_connected(element, |el| match el.mode {
            Some(mode) => f(el, mode),
            None => Err(PageError::NotEditable(element.0)),
        })
    }
}

/// Approximate `innerText` of paragraph markup.
fn html_to_text(html: &str) -> String {
    if !html.contains("<p>") {
        return unescape_html(&html.replace("<br>", "\n"));
    }
    html.split("</p>")
        .filter(|chunk| !chunk.is_empty())
        .map(|chunk| {
            let inner = chunk.trim_start_matches("<p>");
            if inner == "<br>" {
                String::new()
            } else {
                unescape_html(&inner.replace("<br>", "\n"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

impl Page for SimulatedPage {
    fn url(&self) -> String {
        self.lock().url.clone()
    }

    fn hostname(&self) -> String {
        hostname_of(&self.url()).unwrap_or_default()
    }

    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        let state = self.lock();
        state
            .order
            .iter()
            .find(|id| {
                state
                    .elements
                    .get(*id)
                    .is_some_and(|el| el.connected && el.selector == selector)
            })
            .map(|id| ElementId(*id))
    }

    fn is_connected(&self, element: ElementId) -> bool {
        self.lock()
            .elements
            .get(&element.0)
            .is_some_and(|el| el.connected)
    }

    fn text_content(&self, element: ElementId) -> Result<String, PageError> {
        self.with_editable(element, |el, mode| {
            Ok(match mode {
                EditingMode::ContentEditable => html_to_text(&el.html),
                EditingMode::PlainField => el.value.clone(),
            })
        })
    }

    fn value(&self, element: ElementId) -> Result<String, PageError> {
        self.with_editable(element, |el, _| Ok(el.value.clone()))
    }

    fn set_value(&self, element: ElementId, value: &str) -> Result<(), PageError> {
        self.with_editable(element, |el, _| {
            el.value = value.to_string();
            el.caret_at_end = false;
            Ok(())
        })
    }

    fn set_inner_html(&self, element: ElementId, html: &str) -> Result<(), PageError> {
        self.with_editable(element, |el, _| {
            el.html = html.to_string();
            el.caret_at_end = false;
            Ok(())
        })
    }

    fn dispatch(&self, element: ElementId, event: SyntheticEvent) -> Result<(), PageError> {
        self.with_connected(element, |el| {
            el.events.push(event);
            Ok(())
        })
    }

    fn move_caret_to_end(&self, element: ElementId) -> Result<(), PageError> {
        self.with_editable(element, |el, _| {
            el.caret_at_end = true;
            Ok(())
        })
    }

    fn collapse_selection_to_end(&self, element: ElementId) -> Result<(), PageError> {
        self.with_editable(element, |el, _| {
            el.caret_at_end = true;
            Ok(())
        })
    }

    fn focus(&self, element: ElementId) -> Result<(), PageError> {
        self.with_connected(element, |_| Ok(()))?;
        self.lock().focused = Some(element);
        Ok(())
    }

    fn mount_selector(&self, anchor: ElementId) -> Result<ElementId, PageError> {
        if !self.is_connected(anchor) {
            return Err(PageError::ElementDetached(anchor.0));
        }
        Ok(self.insert(SimElement {
            selector: SELECTOR_BUTTON.to_string(),
            mode: None,
            value: String::new(),
            html: String::new(),
            connected: true,
            caret_at_end: false,
            events: Vec::new(),
        }))
    }

    fn render_menu(&self, button: ElementId, items: Option<&[MenuItem]>) -> Result<(), PageError> {
        let mut state = self.lock();
        let connected = state
            .elements
            .get(&button.0)
            .is_some_and(|el| el.connected);
        if !connected {
            return Err(PageError::ElementDetached(button.0));
        }
        state.menu = items.map(|items| (button, items.to_vec()));
        Ok(())
    }

    fn remove(&self, element: ElementId) {
        self.detach(element);
    }
}
