use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use tracing::warn;
use workspace_core::{OfflineSamplePolicy, WorkspaceSettings};

#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleSettings {
    pub nifi_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub paste_settle_ms: u64,
    pub offline_samples: bool,
    pub visible_tabs: usize,
    pub log_filter: String,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            nifi_url: "https://localhost:8443/nifi-api".into(),
            username: None,
            password: None,
            paste_settle_ms: 500,
            offline_samples: true,
            visible_tabs: 3,
            log_filter: "info".into(),
        }
    }
}

impl ConsoleSettings {
    pub fn workspace_settings(&self) -> WorkspaceSettings {
        let defaults = WorkspaceSettings::default();
        WorkspaceSettings {
            paste_settle_delay: Duration::from_millis(self.paste_settle_ms),
            offline_samples: if self.offline_samples {
                OfflineSamplePolicy::demo()
            } else {
                OfflineSamplePolicy::Disabled
            },
            ..defaults
        }
    }
}

/// Defaults, then `path` when it exists, then the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<ConsoleSettings> {
    let mut settings = ConsoleSettings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read console config '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid console config '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut ConsoleSettings, raw: &str) -> anyhow::Result<()> {
    let table: toml::Table = toml::from_str(raw)?;

    if let Some(v) = table.get("nifi_url").and_then(|v| v.as_str()) {
        settings.nifi_url = v.to_string();
    }
    if let Some(v) = table.get("username").and_then(|v| v.as_str()) {
        settings.username = Some(v.to_string());
    }
    if let Some(v) = table.get("password").and_then(|v| v.as_str()) {
        settings.password = Some(v.to_string());
    }
    if let Some(v) = table.get("paste_settle_ms").and_then(|v| v.as_integer()) {
        settings.paste_settle_ms = u64::try_from(v).context("paste_settle_ms must not be negative")?;
    }
    if let Some(v) = table.get("offline_samples").and_then(|v| v.as_bool()) {
        settings.offline_samples = v;
    }
    if let Some(v) = table.get("visible_tabs").and_then(|v| v.as_integer()) {
        settings.visible_tabs = usize::try_from(v).context("visible_tabs must not be negative")?;
    }
    if let Some(v) = table.get("log_filter").and_then(|v| v.as_str()) {
        settings.log_filter = v.to_string();
    }
    Ok(())
}

fn apply_env(settings: &mut ConsoleSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("NIFI_URL") {
        settings.nifi_url = v;
    }
    if let Some(v) = lookup("APP__NIFI_URL") {
        settings.nifi_url = v;
    }

    if let Some(v) = lookup("NIFI_USERNAME") {
        settings.username = Some(v);
    }
    if let Some(v) = lookup("NIFI_PASSWORD") {
        settings.password = Some(v);
    }

    if let Some(v) = lookup("APP__PASTE_SETTLE_MS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.paste_settle_ms = parsed,
            Err(_) => warn!(value = %v, "ignoring invalid APP__PASTE_SETTLE_MS"),
        }
    }

    if let Some(v) = lookup("APP__OFFLINE_SAMPLES") {
        match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => settings.offline_samples = true,
            "0" | "false" | "no" | "off" => settings.offline_samples = false,
            _ => warn!(value = %v, "ignoring invalid APP__OFFLINE_SAMPLES"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let mut settings = ConsoleSettings::default();
        apply_file(
            &mut settings,
            r#"
                nifi_url = "https://nifi.internal:8443/nifi-api"
                username = "admin"
                paste_settle_ms = 250
                offline_samples = false
            "#,
        )
        .expect("valid config");

        assert_eq!(settings.nifi_url, "https://nifi.internal:8443/nifi-api");
        assert_eq!(settings.username.as_deref(), Some("admin"));
        assert_eq!(settings.paste_settle_ms, 250);
        assert!(!settings.offline_samples);
        assert_eq!(settings.visible_tabs, 3);
    }

    #[test]
    fn negative_delay_is_rejected() {
        let mut settings = ConsoleSettings::default();
        assert!(apply_file(&mut settings, "paste_settle_ms = -1").is_err());
    }

    #[test]
    fn prefixed_env_wins_and_bad_values_are_ignored() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("NIFI_URL", "http://plain:8080/nifi-api"),
            ("APP__NIFI_URL", "http://prefixed:8080/nifi-api"),
            ("NIFI_PASSWORD", "secret"),
            ("APP__PASTE_SETTLE_MS", "soon"),
            ("APP__OFFLINE_SAMPLES", "off"),
        ]);
        let mut settings = ConsoleSettings::default();

        apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.nifi_url, "http://prefixed:8080/nifi-api");
        assert_eq!(settings.password.as_deref(), Some("secret"));
        assert_eq!(settings.paste_settle_ms, 500);
        assert!(!settings.offline_samples);
    }

    #[test]
    fn workspace_settings_follow_console_values() {
        let settings = ConsoleSettings {
            paste_settle_ms: 20,
            offline_samples: false,
            ..ConsoleSettings::default()
        };
        let workspace = settings.workspace_settings();
        assert_eq!(workspace.paste_settle_delay, Duration::from_millis(20));
        assert_eq!(workspace.offline_samples, OfflineSamplePolicy::Disabled);
        assert!(workspace.ui_only);
    }
}
