//! `rolecast format`: print the prompt text for a role.

use rolecast_prompt::format_role;

use super::{find_role, load_config, open_store};

pub async fn run(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let store = open_store(&config);

    let role = find_role(&store, id).await?;

    println!("{}", format_role(&role));
    Ok(())
}
