use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MedSched";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Days covered by the "upcoming" agenda view, inclusive of today.
/// A default, not a law; callers may pass their own window.
pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 7;

/// Timeout for calls against the remote reminder store.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "medsched=info"
}

/// Base URL of the remote reminder store.
/// `MEDSCHED_STORE_URL` overrides the local default.
pub fn store_base_url() -> String {
    std::env::var("MEDSCHED_STORE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// Get the application data directory
/// ~/MedSched/ on all platforms (user-visible, matches the host app)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("MedSched")
}

/// Path of the on-device agenda cache database.
pub fn cache_db_path() -> PathBuf {
    app_data_dir().join("agenda_cache.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("MedSched"));
    }

    #[test]
    fn cache_db_under_app_data() {
        let path = cache_db_path();
        assert!(path.starts_with(app_data_dir()));
        assert!(path.ends_with("agenda_cache.db"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn lookahead_covers_a_week() {
        assert_eq!(DEFAULT_LOOKAHEAD_DAYS, 7);
    }
}
