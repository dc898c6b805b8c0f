//! Hostname extraction for URLs and bare hosts.

use url::Url;

/// The lowercased host of `input`, which may be a full URL or a bare
/// hostname such as `claude.ai`.
///
/// Userinfo and ports are never part of the result. `None` when nothing
/// parseable with a host is given.
pub fn hostname_of(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let parsed = if input.contains("://") {
        Url::parse(input)
    } else {
        Url::parse(&format!("https://{input}"))
    };

    match parsed {
        Ok(url) => url.host_str().map(|host| host.to_ascii_lowercase()),
        Err(e) => {
            tracing::debug!(input = %input, error = %e, "Not a URL or hostname");
            None
        }
    }
}
