//! The canonical role prompt template.
//!
//! ```text
//! Role: <name>
//!
//! Task: [Describe what you need help with]
//!
//! Role Context:
//! - Area: <area>
//! - Description: <description>
//! - Skills:
//!   - <skill>
//! - Tools:
//!   - <tool>
//! - Constraints:
//!   - <constraint>
//! - Behavior: <behavior>
//! - Additional Info: <more info>
//!
//! Additional Context: [Add any other details that may help]
//! ```
//!
//! Absent, blank, and empty-list fields produce no line at all. A role with
//! no context fields renders only the first two sections.

use rolecast_core::role::Role;

pub const TASK_PLACEHOLDER: &str = "Task: [Describe what you need help with]";
pub const CONTEXT_HEADER: &str = "Role Context:";
pub const MORE_CONTEXT_PLACEHOLDER: &str = "Additional Context: [Add any other details that may help]";

const SECTION_SEPARATOR: &str = "\n\n";

/// Render a role as a prompt. Pure and deterministic.
pub fn format_role(role: &Role) -> String {
    let mut sections = vec![
        format!("Role: {}", role.name.trim()),
        TASK_PLACEHOLDER.to_string(),
    ];

    let context = context_lines(role);
    if !context.is_empty() {
        let mut block = String::from(CONTEXT_HEADER);
        for line in context {
            block.push('\n');
            block.push_str(&line);
        }
        sections.push(block);
        sections.push(MORE_CONTEXT_PLACEHOLDER.to_string());
    }

    sections.join(SECTION_SEPARATOR)
}

fn context_lines(role: &Role) -> Vec<String> {
    let mut lines = Vec::new();
    push_scalar(&mut lines, "Area", role.area.as_deref());
    push_scalar(&mut lines, "Description", role.description.as_deref());
    push_list(&mut lines, "Skills", &role.skills);
    push_list(&mut lines, "Tools", &role.tools);
    push_list(&mut lines, "Constraints", &role.constraints);
    push_scalar(&mut lines, "Behavior", role.behavior.as_deref());
    push_scalar(&mut lines, "Additional Info", role.more_info.as_deref());
    lines
}

fn push_scalar(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
        lines.push(format!("- {label}: {value}"));
    }
}

fn push_list(lines: &mut Vec<String>, label: &str, items: &[String]) {
    let items: Vec<&str> = items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .collect();
    if items.is_empty() {
        return;
    }
    lines.push(format!("- {label}:"));
    lines.extend(items.into_iter().map(|i| format!("  - {i}")));
}
