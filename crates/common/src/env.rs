//! Environment/runtime helpers
//!
//! Small readers over process environment variables shared by the server
//! binary and the test suites.

use std::str::FromStr;

use tracing::warn;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    /// Reads `LOG_FORMAT`; anything other than `json` selects compact output.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT") {
            Ok(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// True when the variable is set to `1`, `true`, `yes` or `on`.
pub fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Parse a variable, warning (not failing) when it is present but malformed.
pub fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(%name, value = %raw, "ignoring malformed environment variable");
            None
        }
    }
}

/// Database-backed tests are skipped when `SKIP_DB_TESTS` is set.
pub fn skip_db_tests() -> bool {
    std::env::var("SKIP_DB_TESTS").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_flag_reads_truthy_values() {
        std::env::set_var("COMMON_TEST_FLAG_ON", "Yes");
        std::env::set_var("COMMON_TEST_FLAG_OFF", "0");
        assert!(env_flag("COMMON_TEST_FLAG_ON"));
        assert!(!env_flag("COMMON_TEST_FLAG_OFF"));
        assert!(!env_flag("COMMON_TEST_FLAG_MISSING"));
    }

    #[test]
    fn env_parse_ignores_garbage() {
        std::env::set_var("COMMON_TEST_PORT", "80x");
        assert_eq!(env_parse::<u16>("COMMON_TEST_PORT"), None);
        std::env::set_var("COMMON_TEST_PORT_OK", " 8081 ");
        assert_eq!(env_parse::<u16>("COMMON_TEST_PORT_OK"), Some(8081));
    }
}
