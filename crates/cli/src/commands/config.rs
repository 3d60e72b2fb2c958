use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use toml::Value;
use whispercart_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE};

use crate::commands::CommandResult;

#[derive(Debug, Serialize)]
struct ConfigField {
    key: &'static str,
    value: String,
    source: String,
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    precedence: &'static str,
    config_file: Option<String>,
    fields: Vec<ConfigField>,
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("config validation failed: {error}"),
                2,
            );
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let entries = [
        entry(
            "llm.provider",
            format!("{:?}", config.llm.provider).to_lowercase(),
            &["WHISPERCART_LLM_PROVIDER"],
        ),
        entry("llm.model", config.llm.model.clone(), &["WHISPERCART_LLM_MODEL"]),
        entry(
            "llm.base_url",
            config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            &["WHISPERCART_LLM_BASE_URL"],
        ),
        entry(
            "llm.api_key",
            redact_secret(config.llm.api_key.as_ref()),
            &["WHISPERCART_LLM_API_KEY", "HUGGINGFACE_API_TOKEN"],
        ),
        entry(
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            &["WHISPERCART_LLM_TIMEOUT_SECS"],
        ),
        entry(
            "llm.max_new_tokens",
            config.llm.max_new_tokens.to_string(),
            &["WHISPERCART_LLM_MAX_NEW_TOKENS"],
        ),
        entry(
            "polish.api_key",
            redact_secret(config.polish.api_key.as_ref()),
            &["WHISPERCART_POLISH_API_KEY", "OPENAI_API_KEY"],
        ),
        entry("polish.base_url", config.polish.base_url.clone(), &["WHISPERCART_POLISH_BASE_URL"]),
        entry("polish.model", config.polish.model.clone(), &["WHISPERCART_POLISH_MODEL"]),
        entry(
            "polish.timeout_secs",
            config.polish.timeout_secs.to_string(),
            &["WHISPERCART_POLISH_TIMEOUT_SECS"],
        ),
        entry(
            "polish.max_tokens",
            config.polish.max_tokens.to_string(),
            &["WHISPERCART_POLISH_MAX_TOKENS"],
        ),
        entry(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["WHISPERCART_SERVER_BIND_ADDRESS"],
        ),
        entry("server.port", config.server.port.to_string(), &["WHISPERCART_SERVER_PORT"]),
        entry(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["WHISPERCART_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        entry(
            "logging.level",
            config.logging.level.clone(),
            &["WHISPERCART_LOGGING_LEVEL", "WHISPERCART_LOG_LEVEL"],
        ),
        entry(
            "logging.format",
            format!("{:?}", config.logging.format).to_lowercase(),
            &["WHISPERCART_LOGGING_FORMAT", "WHISPERCART_LOG_FORMAT"],
        ),
    ];

    let fields = entries
        .into_iter()
        .map(|(key, value, env_keys)| ConfigField { key, value, source: source(key, env_keys) })
        .collect();

    let report = ConfigReport {
        precedence: "overrides > env > file > default",
        config_file: config_file_path.map(|path| path.display().to_string()),
        fields,
    };
    CommandResult::with_data("config", "effective configuration", &report)
}

fn entry(
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
) -> (&'static str, String, &'static [&'static str]) {
    (key, value, env_keys)
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from(DEFAULT_CONFIG_FILE), Path::new("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
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

/// Keeps the vendor prefix (`hf_`, `sk-`) so operators can tell keys apart.
fn redact_secret(secret: Option<&SecretString>) -> String {
    let Some(secret) = secret else {
        return "<unset>".to_string();
    };
    let trimmed = secret.expose_secret().trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    match trimmed.find(['-', '_']) {
        Some(index) if index > 0 => format!("{}***", &trimmed[..=index]),
        _ => "<redacted>".to_string(),
    }
}
