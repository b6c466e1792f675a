use std::{fs, path::PathBuf, time::Duration};

use anyhow::Context;
use client_core::{bills::DEFAULT_MODAL_WIDTH, http_store::DEFAULT_API_URL, PreviewOptions};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "billed.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub session_file: PathBuf,
    pub request_timeout_seconds: u64,
    pub modal_width: u32,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            session_file: PathBuf::from("./data/session.json"),
            request_timeout_seconds: 30,
            modal_width: DEFAULT_MODAL_WIDTH,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }

    pub fn preview(&self) -> PreviewOptions {
        PreviewOptions {
            modal_width: self.modal_width,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    api_url: Option<String>,
    session_file: Option<PathBuf>,
    request_timeout_seconds: Option<u64>,
    modal_width: Option<u32>,
    log_filter: Option<String>,
}

/// Defaults, then `billed.toml` from the working directory, then the
/// environment.
pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(CONFIG_FILE) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("failed to parse {CONFIG_FILE}"))?,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {CONFIG_FILE}"));
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.api_url {
        settings.api_url = v;
    }
    if let Some(v) = file_cfg.session_file {
        settings.session_file = v;
    }
    if let Some(v) = file_cfg.request_timeout_seconds {
        settings.request_timeout_seconds = v;
    }
    if let Some(v) = file_cfg.modal_width {
        settings.modal_width = v;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("BILLED_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = var("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = var("BILLED_SESSION_FILE") {
        settings.session_file = PathBuf::from(v);
    }
    if let Some(v) = var("APP__SESSION_FILE") {
        settings.session_file = PathBuf::from(v);
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }
    if let Some(v) = var("APP__MODAL_WIDTH") {
        if let Ok(parsed) = v.trim().parse::<u32>() {
            settings.modal_width = parsed;
        }
    }

    if let Some(v) = var("RUST_LOG") {
        settings.log_filter = v;
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
