use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks. If [`init_config`] was never called, the
/// configuration is loaded from the default locations on first access.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get_or_init(|| ArcSwap::from_pointee(StaticConfig::load(None)))
        .load_full()
}

/// Initialize the global configuration
///
/// Loads configuration from `path` (or "config.toml" in the current
/// directory) and `SHORTENER__*` environment variables. Subsequent calls are
/// no-ops.
///
/// # Examples
/// ```no_run
/// use shortener::config::init_config;
/// init_config(Some("shortener.toml"));
/// ```
pub fn init_config(path: Option<&str>) {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load(path)));
}
