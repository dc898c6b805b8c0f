//! `rolecast status`: show configuration and storage status.

use rolecast_config::AppConfig;
use rolecast_inject::group_roles;
use rolecast_platforms::PLATFORMS;
use rolecast_store::spawn_role_responder;
use std::sync::Arc;

use super::{load_config, open_store};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;

    println!("Rolecast Status");
    println!("===============");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Storage:      {}", config.storage.backend);
    if config.storage.backend == "file" {
        println!("  Storage file: {}", config.storage.file_path().display());
    }
    println!("  Storage key:  {}", config.storage.key);
    println!(
        "  Engine:       poll {}ms, timeout {}ms, navigation {}ms, settle {}ms",
        config.engine.poll_interval_ms,
        config.engine.search_timeout_ms,
        config.engine.navigation_interval_ms,
        config.engine.settle_delay_ms
    );
    println!(
        "  Logging:      {}{}",
        config.logging.level,
        if config.logging.json { " (json)" } else { "" }
    );

    // Ask the way a page context would, so a broken store shows up as zero
    let (requester, responder) = spawn_role_responder(Arc::new(open_store(&config)));
    let roles = requester.get_roles().await;
    drop(requester);
    responder.await?;

    let areas = group_roles(&roles)
        .iter()
        .filter(|g| g.area.is_some())
        .count();
    println!("  Roles:        {} ({} area(s))", roles.len(), areas);

    let platforms: Vec<&str> = PLATFORMS.iter().map(|p| p.name).collect();
    println!("  Platforms:    {}", platforms.join(", "));

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  Config file found");
    } else {
        println!("\n  No config file; run `rolecast onboard` first");
    }

    Ok(())
}
