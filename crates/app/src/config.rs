//! Settings file and environment overrides.

use shared::settings::AppSettings;
use std::fs;
use std::path::PathBuf;

pub fn config_path() -> Option<PathBuf> {
    let proj = directories::ProjectDirs::from("com.local", "Notch Chat", "NotchChat")?;
    let _ = fs::create_dir_all(proj.config_dir());
    Some(proj.config_dir().join("settings.json"))
}

/// Load settings from disk, writing defaults on first run. Environment
/// overrides are applied last and never written back.
pub fn load_settings() -> AppSettings {
    let mut settings = match config_path() {
        Some(path) if path.exists() => match fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                serde_json::from_slice::<AppSettings>(&bytes).map_err(|e| e.to_string())
            }) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
                AppSettings::default()
            }
        },
        _ => {
            let defaults = AppSettings::default();
            save_settings(&defaults);
            defaults
        }
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings
}

pub fn save_settings(settings: &AppSettings) {
    if let Some(path) = config_path() {
        match serde_json::to_vec_pretty(settings) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    tracing::warn!(path = %path.display(), error = %e, "failed to write settings");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode settings"),
        }
    }
}

pub fn apply_env_overrides<F>(settings: &mut AppSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup("NOTCH_CHAT_ENDPOINT") {
        settings.chat.endpoint = endpoint;
    }
    if let Some(model) = lookup("NOTCH_CHAT_MODEL") {
        settings.chat.model = Some(model).filter(|m| !m.is_empty());
    }
    if let Some(key) = lookup("NOTCH_CHAT_API_KEY") {
        settings.chat.api_key = Some(key).filter(|k| !k.is_empty());
    }
    if let Some(stream) = lookup("NOTCH_CHAT_STREAM") {
        let v = stream.trim().to_ascii_lowercase();
        settings.chat.stream = v == "1" || v == "true" || v == "yes";
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("NOTCH_CHAT_ENDPOINT", "http://localhost:8080/api/generate"),
            ("NOTCH_CHAT_MODEL", "qwen3"),
            ("NOTCH_CHAT_STREAM", "yes"),
        ]
        .into_iter()
        .collect();

        let mut settings = AppSettings::default();
        apply_env_overrides(&mut settings, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(settings.chat.endpoint, "http://localhost:8080/api/generate");
        assert_eq!(settings.chat.model.as_deref(), Some("qwen3"));
        assert!(settings.chat.stream);
        assert_eq!(settings.chat.api_key, None);
    }

    #[test]
    fn test_empty_api_key_clears() {
        let mut settings = AppSettings::default();
        settings.chat.api_key = Some("old".into());
        apply_env_overrides(&mut settings, |k| {
            (k == "NOTCH_CHAT_API_KEY").then(String::new)
        });
        assert_eq!(settings.chat.api_key, None);
    }
}
