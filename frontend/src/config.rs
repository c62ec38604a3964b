const DEV_BASE: &str = "http://localhost:8000/api";
const PROD_BASE: &str = "https://api.rigroute.app/api";

/// Backend base URL, fixed at build time: `PLANNER_ENV=development` selects
/// the development backend, anything else the production one. Either default
/// can be overridden through the matching environment variable at compile
/// time; there is no runtime override.
pub fn server_base() -> String {
    let configured = if matches!(option_env!("PLANNER_ENV"), Some("development")) {
        option_env!("PLANNER_BACKEND_URL").unwrap_or(DEV_BASE)
    } else {
        option_env!("PLANNER_SERVER_URL").unwrap_or(PROD_BASE)
    };
    configured.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_base_has_no_trailing_slash() {
        assert!(!server_base().ends_with('/'));
    }

    #[test]
    fn test_server_base_is_absolute() {
        assert!(server_base().starts_with("http"));
    }
}
