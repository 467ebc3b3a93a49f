//! User agent handling for HTTP requests.

pub const USER_AGENT: &str = "hnharvest/0.3 (story archive; contact via repository)";

/// Browser user agent used for page fetches in impersonate mode.
///
/// Some publishers refuse obviously automated clients outright.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:133.0) Gecko/20100101 Firefox/133.0";

/// Resolve user agent from config value.
/// - None => default hnharvest user agent
/// - "impersonate" => browser user agent
/// - other => custom user agent string
pub fn resolve_user_agent(config: Option<&str>) -> String {
    match config {
        None => USER_AGENT.to_string(),
        Some("impersonate") => BROWSER_USER_AGENT.to_string(),
        Some(custom) => custom.to_string(),
    }
}
