//! `rolecast onboard`: first-time setup.

use rolecast_config::AppConfig;
use rolecast_core::storage::RoleStore;

use super::open_store;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Rolecast: First-Time Setup");
    println!("==========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\nConfig already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("Created config.toml at: {}", config_path.display());
    }

    let config = super::load_config()?;
    let store = open_store(&config);
    let roles = store.get_all().await?;
    if roles.is_empty() {
        println!("\nNext steps:");
        println!("   1. Add a role: rolecast roles add --name \"Code Reviewer\" --area Engineering");
        println!("   2. Preview it: rolecast format <id>");
        println!("   3. Try it:     rolecast simulate --url https://chatgpt.com/ --role <id>\n");
    } else {
        println!("\n{} role(s) already saved.", roles.len());
    }

    println!("Setup complete.");
    Ok(())
}
