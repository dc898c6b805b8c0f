//! Role selector UI model: grouping and dropdown state.
//!
//! Roles without an area come first in their stored order. The rest are
//! grouped under their area label, areas sorted lexicographically, with
//! stored order kept inside each area.

use rolecast_core::error::PageError;
use rolecast_core::page::{ElementId, MenuItem, Page};
use rolecast_core::role::Role;
use std::collections::BTreeMap;

/// Roles sharing an area (or the ungrouped bucket when `area` is `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct RoleGroup<'a> {
    pub area: Option<&'a str>,
    pub roles: Vec<&'a Role>,
}

pub fn group_roles(roles: &[Role]) -> Vec<RoleGroup<'_>> {
    let mut ungrouped = Vec::new();
    let mut by_area: BTreeMap<&str, Vec<&Role>> = BTreeMap::new();

    for role in roles {
        match role.area_label() {
            Some(area) => by_area.entry(area).or_default().push(role),
            None => ungrouped.push(role),
        }
    }

    let mut groups = Vec::with_capacity(by_area.len() + 1);
    if !ungrouped.is_empty() {
        groups.push(RoleGroup {
            area: None,
            roles: ungrouped,
        });
    }
    groups.extend(by_area.into_iter().map(|(area, roles)| RoleGroup {
        area: Some(area),
        roles,
    }));
    groups
}

/// Flatten grouped roles into dropdown rows.
pub fn menu_items(roles: &[Role]) -> Vec<MenuItem> {
    let mut items = Vec::with_capacity(roles.len());
    for group in group_roles(roles) {
        if let Some(area) = group.area {
            items.push(MenuItem::Header {
                label: area.to_string(),
            });
        }
        items.extend(group.roles.into_iter().map(|role| MenuItem::Role {
            id: role.id.clone(),
            label: role.name.clone(),
        }));
    }
    items
}

/// Open/closed state of the dropdown and the rows it shows.
#[derive(Debug, Clone, Default)]
pub struct SelectorMenu {
    open: bool,
    items: Vec<MenuItem>,
}

impl SelectorMenu {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild rows from a new role list. Open state is kept.
    pub fn update(&mut self, roles: &[Role]) {
        self.items = menu_items(roles);
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Button activation. Returns the new open state.
    pub fn toggle(&mut self) -> bool {
        self.open = !self.open;
        self.open
    }

    /// Returns whether the menu was open.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    /// Pick a role by ID; the menu closes either way.
    pub fn choose<'a>(&mut self, roles: &'a [Role], id: &str) -> Option<&'a Role> {
        self.open = false;
        roles.iter().find(|r| r.id == id)
    }

    /// Push the current state to the page.
    pub fn render(&self, page: &dyn Page, button: ElementId) -> Result<(), PageError> {
        let items = self.open.then_some(self.items.as_slice());
        page.render_menu(button, items)
    }
}
