//! Working out which bot a page belongs to from its host and path.

/// Hosts under this domain carry the bot name in the path.
pub const HOSTED_DOMAIN: &str = "noemt.dev";

/// Path segment used by the dashboard itself rather than a bot.
pub const DASHBOARD_SEGMENT: &str = "dashboard";

/// Custom domains resolve the bot name through the service; hosted domains
/// and localhost take it from the path.
pub fn is_custom_domain(host: &str) -> bool {
    let hostname = strip_port(host.trim()).to_ascii_lowercase();
    !hostname.is_empty() && !hostname.contains(HOSTED_DOMAIN) && hostname != "localhost"
}

fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}

/// First non-empty path segment.
pub fn bot_name_from_path(path: &str) -> Option<&str> {
    path.split('/').find(|segment| !segment.is_empty())
}

/// Like [`bot_name_from_path`] but refuses the dashboard's own segment.
pub fn dashboard_bot_name(path: &str) -> Option<&str> {
    bot_name_from_path(path).filter(|segment| *segment != DASHBOARD_SEGMENT)
}

/// Picks the custom-domain answer when there is one, otherwise the path.
pub fn choose_bot_name(custom: Option<String>, path: &str) -> Option<String> {
    custom
        .filter(|name| !name.trim().is_empty())
        .or_else(|| bot_name_from_path(path).map(str::to_string))
}
