use std::{collections::HashMap, fs, path::Path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSettings {
    pub server_url: String,
    pub use_response_cache: bool,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            use_response_cache: true,
        }
    }
}

/// Defaults, then `path` when it exists, then the environment.
pub fn load_settings(path: &Path) -> DashboardSettings {
    let mut settings = DashboardSettings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

pub(crate) fn apply_file_overrides(settings: &mut DashboardSettings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        tracing::warn!("ignoring unreadable dashboard config");
        return;
    };

    if let Some(v) = file_cfg.get("server_url").and_then(toml::Value::as_str) {
        settings.server_url = v.to_string();
    }
    if let Some(v) = file_cfg
        .get("use_response_cache")
        .and_then(toml::Value::as_bool)
    {
        settings.use_response_cache = v;
    }
}

pub(crate) fn apply_env_overrides(
    settings: &mut DashboardSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("DASHBOARD_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(parsed) = lookup("APP__USE_RESPONSE_CACHE").and_then(|v| parse_flag(&v)) {
        settings.use_response_cache = parsed;
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
