//! `rolecast detect`: classify a hostname.

use rolecast_platforms::{detect_platform, hostname_of};

pub fn run(input: &str) -> Result<(), Box<dyn std::error::Error>> {
    let hostname =
        hostname_of(input).ok_or_else(|| format!("'{input}' is not a hostname or URL"))?;

    match detect_platform(&hostname) {
        Some(platform) => {
            println!("{hostname}: {}", platform.name);
            println!("  Input selector: {}", platform.input_selector);
            println!(
                "  Editing mode:   {}",
                if platform.is_content_editable() {
                    "content-editable"
                } else {
                    "plain field"
                }
            );
        }
        None => println!("{hostname}: not a supported chat platform"),
    }
    Ok(())
}
