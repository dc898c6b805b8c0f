//! Merging generated text into a live prompt input.
//!
//! Chat front ends track their own state from input events, not from DOM
//! mutation. After writing, the engine dispatches the events the page's
//! framework listens for; otherwise the page may not notice the new text
//! (the send button stays disabled, the draft is lost on the next render).

use rolecast_core::error::PageError;
use rolecast_core::page::{EditingMode, ElementId, Page, SyntheticEvent};

/// Combine what is already in the input with new text.
///
/// Non-empty existing content is kept and separated from the new text by a
/// blank line. Trailing whitespace of the existing content is dropped so
/// repeated merges do not accumulate empty lines.
pub fn merge_text(existing: &str, new_text: &str) -> String {
    let existing = existing.trim_end();
    if existing.trim().is_empty() {
        new_text.to_string()
    } else {
        format!("{existing}\n\n{new_text}")
    }
}

/// Convert plain text into paragraph markup for a content-editable region.
///
/// Paragraphs (split on a blank line) become `<p>` blocks, single line
/// breaks inside a paragraph become `<br>`, and an empty paragraph is kept
/// as `<p><br></p>` the way rich-text editors represent it. All text is
/// HTML-escaped.
pub fn text_to_markup(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    text.split("\n\n")
        .map(|paragraph| {
            if paragraph.is_empty() {
                "<p><br></p>".to_string()
            } else {
                let lines: Vec<String> = paragraph.split('\n').map(escape_html).collect();
                format!("<p>{}</p>", lines.join("<br>"))
            }
        })
        .collect()
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Merge `new_text` into the input element and notify the page.
///
/// Returns the combined text now held by the input.
pub fn apply_merge(
    page: &dyn Page,
    input: ElementId,
    mode: EditingMode,
    new_text: &str,
) -> Result<String, PageError> {
    match mode {
        EditingMode::PlainField => {
            let current = page.value(input)?;
            let combined = merge_text(&current, new_text);
            page.set_value(input, &combined)?;
            page.dispatch(input, SyntheticEvent::Input)?;
            page.dispatch(input, SyntheticEvent::Change)?;
            page.focus(input)?;
            page.move_caret_to_end(input)?;
            Ok(combined)
        }
        EditingMode::ContentEditable => {
            let current = page.text_content(input)?;
            let combined = merge_text(&current, new_text);
            page.set_inner_html(input, &text_to_markup(&combined))?;
            page.dispatch(input, SyntheticEvent::Input)?;
            page.collapse_selection_to_end(input)?;
            page.focus(input)?;
            Ok(combined)
        }
    }
}
