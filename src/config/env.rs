//! Environment variable overrides for build options.
//!
//! Variables are read once at load time; malformed values are ignored with a
//! warning so a bad shell export cannot break catalog builds.

use super::CatalogConfig;

pub const ENV_TIMEOUT_MS: &str = "TOOL_CATALOG_TIMEOUT_MS";
pub const ENV_MAX_CONCURRENCY: &str = "TOOL_CATALOG_MAX_CONCURRENCY";
pub const ENV_DEFER_HIGH: &str = "TOOL_CATALOG_DEFER_HIGH";

impl CatalogConfig {
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup (used by tests).
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup(ENV_TIMEOUT_MS) {
            match v.trim().parse::<u64>() {
                Ok(ms) => self.build.discovery_timeout_ms = ms,
                Err(e) => tracing::warn!(var = ENV_TIMEOUT_MS, value = %v, error = %e, "Ignoring invalid override"),
            }
        }
        if let Some(v) = lookup(ENV_MAX_CONCURRENCY) {
            match v.trim().parse::<usize>() {
                Ok(n) => self.build.max_concurrency = n,
                Err(e) => tracing::warn!(var = ENV_MAX_CONCURRENCY, value = %v, error = %e, "Ignoring invalid override"),
            }
        }
        if let Some(v) = lookup(ENV_DEFER_HIGH) {
            match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.build.defer_high = true,
                "0" | "false" | "no" => self.build.defer_high = false,
                _ => tracing::warn!(var = ENV_DEFER_HIGH, value = %v, "Ignoring invalid override"),
            }
        }
    }
}
