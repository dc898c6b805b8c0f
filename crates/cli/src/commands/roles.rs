//! `rolecast roles`: role management commands.

use rolecast_core::role::{Role, RoleDraft};
use rolecast_core::storage::RoleStore;
use rolecast_inject::group_roles;

use super::{find_role, load_config, open_store};
use crate::{RoleFields, RolesAction};

pub async fn run(action: RolesAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let store = open_store(&config);

    match action {
        RolesAction::List { grouped } => list(&store, grouped).await,
        RolesAction::Show { id } => show(&store, &id).await,
        RolesAction::Add(fields) => add(&store, fields).await,
        RolesAction::Edit { id, fields } => edit(&store, &id, fields).await,
        RolesAction::Delete { id } => delete(&store, &id).await,
        RolesAction::Export { output } => {
            let json = export(&store).await?;
            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Exported roles to {}", path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
        RolesAction::Import { file } => {
            let json = std::fs::read_to_string(&file)
                .map_err(|e| format!("Failed to read {}: {e}", file.display()))?;
            let count = import(&store, &json).await?;
            println!("Imported {count} role(s) from {}", file.display());
            Ok(())
        }
    }
}

async fn list(store: &dyn RoleStore, grouped: bool) -> Result<(), Box<dyn std::error::Error>> {
    let roles = store.get_all().await?;
    if roles.is_empty() {
        println!("No roles saved. Add one with `rolecast roles add --name <name>`.");
        return Ok(());
    }

    if !grouped {
        for role in &roles {
            match role.area_label() {
                Some(area) => println!("{}  {}  [{area}]", role.id, role.name),
                None => println!("{}  {}", role.id, role.name),
            }
        }
        return Ok(());
    }

    for group in group_roles(&roles) {
        let indent = match group.area {
            Some(area) => {
                println!("{area}");
                "  "
            }
            None => "",
        };
        for role in group.roles {
            println!("{indent}{}  {}", role.id, role.name);
        }
    }
    Ok(())
}

async fn show(store: &dyn RoleStore, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let role = find_role(store, id).await?;

    println!("{}", role.name);
    println!("  ID:          {}", role.id);
    print_opt("Area", role.area.as_deref());
    print_opt("Description", role.description.as_deref());
    print_list("Skills", &role.skills);
    print_list("Tools", &role.tools);
    print_list("Constraints", &role.constraints);
    print_opt("Behavior", role.behavior.as_deref());
    print_opt("More info", role.more_info.as_deref());
    println!("  Created:     {}", role.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Updated:     {}", role.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    Ok(())
}

fn print_opt(label: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        println!("  {:<12} {value}", format!("{label}:"));
    }
}

fn print_list(label: &str, items: &[String]) {
    if !items.is_empty() {
        println!("  {:<12} {}", format!("{label}:"), items.join(", "));
    }
}

async fn add(store: &dyn RoleStore, fields: RoleFields) -> Result<(), Box<dyn std::error::Error>> {
    if fields.name.is_none() {
        return Err("--name is required".into());
    }
    let mut draft = RoleDraft::default();
    apply_fields(&mut draft, fields);

    let role = store.save(draft).await?;
    println!("Saved role '{}' ({})", role.name, role.id);
    Ok(())
}

async fn edit(
    store: &dyn RoleStore,
    id: &str,
    fields: RoleFields,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut draft = find_role(store, id).await?.to_draft();
    apply_fields(&mut draft, fields);

    let role = store.save(draft).await?;
    println!("Updated role '{}' ({})", role.name, role.id);
    Ok(())
}

async fn delete(store: &dyn RoleStore, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    if store.delete(id).await? {
        println!("Deleted role {id}");
    } else {
        println!("No role with id '{id}'");
    }
    Ok(())
}

/// Serialize all roles in stored order.
pub(crate) async fn export(store: &dyn RoleStore) -> rolecast_core::Result<String> {
    let roles = store.get_all().await?;
    Ok(serde_json::to_string_pretty(&roles)?)
}

/// Replace every stored role with the exported list in `json`.
pub(crate) async fn import(store: &dyn RoleStore, json: &str) -> rolecast_core::Result<usize> {
    let roles: Vec<Role> = serde_json::from_str(json)?;
    let count = roles.len();
    store.replace_all(roles).await?;
    Ok(count)
}

/// Overwrite the draft with every field given on the command line.
/// Repeatable list flags replace the whole list when present.
fn apply_fields(draft: &mut RoleDraft, fields: RoleFields) {
    if let Some(name) = fields.name {
        draft.name = name;
    }
    if fields.area.is_some() {
        draft.area = fields.area;
    }
    if fields.description.is_some() {
        draft.description = fields.description;
    }
    if !fields.skills.is_empty() {
        draft.skills = fields.skills;
    }
    if !fields.tools.is_empty() {
        draft.tools = fields.tools;
    }
    if !fields.constraints.is_empty() {
        draft.constraints = fields.constraints;
    }
    if fields.behavior.is_some() {
        draft.behavior = fields.behavior;
    }
    if fields.more_info.is_some() {
        draft.more_info = fields.more_info;
    }
}
