//! Platform registry: classifies a page by hostname and says where its
//! prompt input lives.

use rolecast_core::page::EditingMode;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Identity of a supported chat platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformId {
    ChatGpt,
    Claude,
    Gemini,
    DeepSeek,
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(descriptor(*self).name)
    }
}

/// How to find and write to a platform's prompt input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformDescriptor {
    pub id: PlatformId,

    /// Human-readable name
    pub name: &'static str,

    /// The page belongs to this platform if its hostname contains any of these
    pub host_matchers: &'static [&'static str],

    /// Selector for the prompt input element
    pub input_selector: &'static str,

    pub editing_mode: EditingMode,
}

impl PlatformDescriptor {
    pub fn is_content_editable(&self) -> bool {
        self.editing_mode == EditingMode::ContentEditable
    }

    /// Whether `hostname` (already lowercased) belongs to this platform.
    fn matches_host(&self, hostname: &str) -> bool {
        self.host_matchers.iter().any(|m| hostname.contains(m))
    }
}

/// Every supported platform, in detection order.
pub static PLATFORMS: [PlatformDescriptor; 4] = [
    PlatformDescriptor {
        id: PlatformId::ChatGpt,
        name: "ChatGPT",
        host_matchers: &["chat.openai.com", "chatgpt.com"],
        input_selector: "#prompt-textarea",
        editing_mode: EditingMode::ContentEditable,
    },
    PlatformDescriptor {
        id: PlatformId::Claude,
        name: "Claude",
        host_matchers: &["claude.ai"],
        input_selector: "div.ProseMirror[contenteditable=\"true\"]",
        editing_mode: EditingMode::ContentEditable,
    },
    PlatformDescriptor {
        id: PlatformId::Gemini,
        name: "Gemini",
        host_matchers: &["gemini.google.com"],
        input_selector: "rich-textarea .ql-editor",
        editing_mode: EditingMode::ContentEditable,
    },
    PlatformDescriptor {
        id: PlatformId::DeepSeek,
        name: "DeepSeek",
        host_matchers: &["chat.deepseek.com"],
        input_selector: "textarea#chat-input",
        editing_mode: EditingMode::PlainField,
    },
];

/// All descriptors in detection order.
pub fn all() -> &'static [PlatformDescriptor] {
    &PLATFORMS
}

/// The descriptor row for a platform.
pub fn descriptor(id: PlatformId) -> &'static PlatformDescriptor {
    match id {
        PlatformId::ChatGpt => &PLATFORMS[0],
        PlatformId::Claude => &PLATFORMS[1],
        PlatformId::Gemini => &PLATFORMS[2],
        PlatformId::DeepSeek => &PLATFORMS[3],
    }
}

/// The first platform whose host matchers occur in `hostname`.
///
/// `None` means the page is unsupported and nothing should activate.
pub fn detect_platform(hostname: &str) -> Option<&'static PlatformDescriptor> {
    let host = hostname.trim().to_ascii_lowercase();
    let found = PLATFORMS.iter().find(|p| p.matches_host(&host));
    match found {
        Some(p) => debug!(host = %host, platform = p.name, "Platform detected"),
        None => debug!(host = %host, "No supported platform"),
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chatgpt_hosts_resolve() {
        assert_eq!(
            detect_platform("chat.openai.com").map(|p| p.id),
            Some(PlatformId::ChatGpt)
        );
        assert_eq!(
            detect_platform("chatgpt.com").map(|p| p.id),
            Some(PlatformId::ChatGpt)
        );
    }

    #[test]
    fn unknown_host_is_none() {
        assert!(detect_platform("example.com").is_none());
        assert!(detect_platform("").is_none());
    }

    #[test]
    fn detection_ignores_case() {
        assert_eq!(
            detect_platform("Claude.AI").map(|p| p.id),
            Some(PlatformId::Claude)
        );
    }

    #[test]
    fn subdomains_match() {
        assert_eq!(
            detect_platform("www.chatgpt.com").map(|p| p.id),
            Some(PlatformId::ChatGpt)
        );
    }

    #[test]
    fn descriptor_lookup_agrees_with_table() {
        for row in all() {
            assert_eq!(descriptor(row.id), row);
        }
    }

    #[test]
    fn editing_modes() {
        assert!(descriptor(PlatformId::Gemini).is_content_editable());
        assert!(!descriptor(PlatformId::DeepSeek).is_content_editable());
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(PlatformId::ChatGpt.to_string(), "ChatGPT");
    }

    #[test]
    fn descriptor_serializes() {
        let json = serde_json::to_string(descriptor(PlatformId::DeepSeek)).unwrap();
        assert!(json.contains("\"plain_field\""));
        assert!(json.contains("chat.deepseek.com"));
    }
}
