use std::env;
use std::fs;
use std::path::Path;

use fieldquote_core::config::{resolve_config_path, AppConfig, LoadOptions};
use serde::Serialize;
use toml::Value;

use crate::commands::{load_config, CommandResult};

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let config = match load_config("config", options) {
        Ok(config) => config,
        Err(failure) => return failure,
    };

    let config_file_path = resolve_config_path(options.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let attribution = Attribution {
        file_doc: config_file_doc.as_ref(),
        file_path: config_file_path.as_deref(),
    };

    CommandResult::success_with_data(
        "config",
        "effective config (source precedence: env > file > default)",
        entries(&config, &attribution),
    )
}

struct Attribution<'a> {
    file_doc: Option<&'a Value>,
    file_path: Option<&'a Path>,
}

fn entries(config: &AppConfig, attribution: &Attribution<'_>) -> Vec<ConfigEntry> {
    let pricing = config.pricing_policy();
    let fields: [(&'static str, String, &[&str]); 12] = [
        ("database.url", config.database.url.clone(), &["FIELDQUOTE_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["FIELDQUOTE_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["FIELDQUOTE_DATABASE_TIMEOUT_SECS"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            &["FIELDQUOTE_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), &["FIELDQUOTE_SERVER_PORT"]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["FIELDQUOTE_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            &["FIELDQUOTE_LOGGING_LEVEL", "FIELDQUOTE_LOG_LEVEL"],
        ),
        (
            "logging.format",
            label(config.logging.format),
            &["FIELDQUOTE_LOGGING_FORMAT", "FIELDQUOTE_LOG_FORMAT"],
        ),
        (
            "pricing.tier_modifier_policy",
            label(pricing.tier_modifiers),
            &["FIELDQUOTE_PRICING_TIER_MODIFIER_POLICY"],
        ),
        (
            "pricing.line_rounding",
            label(pricing.line_rounding),
            &["FIELDQUOTE_PRICING_LINE_ROUNDING"],
        ),
        (
            "pricing.tier_overflow",
            label(pricing.tier_overflow),
            &["FIELDQUOTE_PRICING_TIER_OVERFLOW"],
        ),
        ("config_file", display_path(attribution.file_path), &[]),
    ];

    fields
        .into_iter()
        .map(|(key, value, env_keys)| ConfigEntry {
            key,
            value,
            source: field_source(key, env_keys, attribution),
        })
        .collect()
}

/// Renders an enum setting the way it is spelled in the config file.
fn label(value: impl Serialize) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(label)) => label,
        _ => "<unknown>".to_string(),
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string()).unwrap_or_else(|| "<none>".to_string())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(key_path: &str, env_keys: &[&str], attribution: &Attribution<'_>) -> String {
    if let Some(env_key) = env_keys
        .iter()
        .find(|env_key| env::var(env_key).is_ok_and(|value| !value.trim().is_empty()))
    {
        return format!("env ({env_key})");
    }

    if let Some(doc) = attribution.file_doc {
        if contains_path(doc, key_path) {
            return format!("file ({})", display_path(attribution.file_path));
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use toml::Value;

    use fieldquote_core::config::LogFormat;
    use fieldquote_core::LineRounding;

    use super::{contains_path, field_source, label, Attribution};

    #[test]
    fn enum_settings_use_config_file_spelling() {
        assert_eq!(label(LineRounding::WholeUnits), "whole_units");
        assert_eq!(label(LogFormat::Json), "json");
    }

    #[test]
    fn nested_keys_are_found_in_file_documents() {
        let doc: Value = "[pricing]\nline_rounding = \"cents\"\n".parse().expect("toml");

        assert!(contains_path(&doc, "pricing.line_rounding"));
        assert!(!contains_path(&doc, "pricing.tier_overflow"));
        assert!(!contains_path(&doc, "server.port"));
    }

    #[test]
    fn file_attribution_names_the_file() {
        let doc: Value = "[server]\nport = 9090\n".parse().expect("toml");
        let attribution =
            Attribution { file_doc: Some(&doc), file_path: Some(Path::new("fieldquote.toml")) };

        assert_eq!(
            field_source("server.port", &["FIELDQUOTE_TEST_UNSET_PORT"], &attribution),
            "file (fieldquote.toml)"
        );
        assert_eq!(field_source("server.bind_address", &[], &attribution), "default");
    }
}
