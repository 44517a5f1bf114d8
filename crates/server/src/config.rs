use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use server_api::{Ledger, TRANSACTIONS_PER_PAGE};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub data_path: Option<PathBuf>,
    pub transactions_per_page: usize,
    pub simulated_latency_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            data_path: None,
            transactions_per_page: TRANSACTIONS_PER_PAGE,
            simulated_latency_ms: 0,
        }
    }
}

impl Settings {
    pub fn simulated_latency(&self) -> Duration {
        Duration::from_millis(self.simulated_latency_ms)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

pub(crate) fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) else {
        tracing::warn!("ignoring unreadable server.toml");
        return;
    };

    if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
        settings.server_bind = v.to_string();
    }
    if let Some(v) = file_cfg.get("data_path").and_then(toml::Value::as_str) {
        settings.data_path = Some(PathBuf::from(v));
    }
    if let Some(v) = file_cfg
        .get("transactions_per_page")
        .and_then(toml::Value::as_integer)
        .and_then(|v| usize::try_from(v).ok())
    {
        settings.transactions_per_page = v;
    }
    if let Some(v) = file_cfg
        .get("simulated_latency_ms")
        .and_then(toml::Value::as_integer)
        .and_then(|v| u64::try_from(v).ok())
    {
        settings.simulated_latency_ms = v;
    }
}

pub(crate) fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = lookup("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = lookup("APP__DATA_PATH") {
        settings.data_path = Some(PathBuf::from(v));
    }

    if let Some(parsed) = lookup("APP__TRANSACTIONS_PER_PAGE").and_then(|v| v.parse().ok()) {
        settings.transactions_per_page = parsed;
    }
    if let Some(parsed) = lookup("APP__SIMULATED_LATENCY_MS").and_then(|v| v.parse().ok()) {
        settings.simulated_latency_ms = parsed;
    }
}

/// Loads the configured fixture, or the bundled sample ledger when none is set.
pub fn load_ledger(settings: &Settings) -> anyhow::Result<Ledger> {
    let Some(path) = settings.data_path.as_ref() else {
        return Ledger::sample().context("bundled sample ledger is invalid");
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read ledger fixture '{}'", path.display()))?;
    Ledger::from_json(&raw)
        .with_context(|| format!("invalid ledger fixture '{}'", path.display()))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
