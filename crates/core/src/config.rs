use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "whispercart.toml";
pub const DEFAULT_HUGGINGFACE_URL: &str = "https://api-inference.huggingface.co/models";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub polish: PolishConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Remote model used for intent extraction, conversation and comparison.
#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_new_tokens: u32,
}

/// OpenAI-compatible chat endpoint used to polish negotiation offers.
#[derive(Clone, Debug)]
pub struct PolishConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "huggingface", alias = "hugging_face")]
    HuggingFace,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_api_key: Option<String>,
    pub polish_api_key: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::HuggingFace,
                api_key: None,
                base_url: None,
                model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
                timeout_secs: 10,
                max_new_tokens: 200,
            },
            polish: PolishConfig {
                api_key: None,
                base_url: DEFAULT_OPENAI_URL.to_string(),
                model: "gpt-3.5-turbo".to_string(),
                timeout_secs: 10,
                max_tokens: 300,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3002,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

fn has_secret(secret: Option<&SecretString>) -> bool {
    secret.is_some_and(|value| !value.expose_secret().trim().is_empty())
}

impl LlmConfig {
    /// Hugging Face needs a token, Ollama needs somewhere to connect to.
    pub fn remote_enabled(&self) -> bool {
        match self.provider {
            LlmProvider::HuggingFace => has_secret(self.api_key.as_ref()),
            LlmProvider::Ollama => {
                self.base_url.as_deref().is_some_and(|url| !url.trim().is_empty())
            }
        }
    }

    pub fn endpoint(&self) -> String {
        match self.provider {
            LlmProvider::HuggingFace => format!(
                "{}/{}",
                self.base_url.as_deref().unwrap_or(DEFAULT_HUGGINGFACE_URL).trim_end_matches('/'),
                self.model
            ),
            LlmProvider::Ollama => format!(
                "{}/api/generate",
                self.base_url.as_deref().unwrap_or("http://localhost:11434").trim_end_matches('/')
            ),
        }
    }
}

impl PolishConfig {
    pub fn enabled(&self) -> bool {
        has_secret(self.api_key.as_ref())
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "huggingface" | "hugging_face" | "hf" => Ok(Self::HuggingFace),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected huggingface|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_new_tokens) = llm.max_new_tokens {
                self.llm.max_new_tokens = max_new_tokens;
            }
        }

        if let Some(polish) = patch.polish {
            if let Some(polish_api_key_value) = polish.api_key {
                self.polish.api_key = Some(secret_value(polish_api_key_value));
            }
            if let Some(base_url) = polish.base_url {
                self.polish.base_url = base_url;
            }
            if let Some(model) = polish.model {
                self.polish.model = model;
            }
            if let Some(timeout_secs) = polish.timeout_secs {
                self.polish.timeout_secs = timeout_secs;
            }
            if let Some(max_tokens) = polish.max_tokens {
                self.polish.max_tokens = max_tokens;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("WHISPERCART_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        let llm_api_key =
            read_env("WHISPERCART_LLM_API_KEY").or_else(|| read_env("HUGGINGFACE_API_TOKEN"));
        if let Some(value) = llm_api_key {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("WHISPERCART_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("WHISPERCART_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("WHISPERCART_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("WHISPERCART_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("WHISPERCART_LLM_MAX_NEW_TOKENS") {
            self.llm.max_new_tokens = parse_u32("WHISPERCART_LLM_MAX_NEW_TOKENS", &value)?;
        }

        let polish_api_key =
            read_env("WHISPERCART_POLISH_API_KEY").or_else(|| read_env("OPENAI_API_KEY"));
        if let Some(value) = polish_api_key {
            self.polish.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("WHISPERCART_POLISH_BASE_URL") {
            self.polish.base_url = value;
        }
        if let Some(value) = read_env("WHISPERCART_POLISH_MODEL") {
            self.polish.model = value;
        }
        if let Some(value) = read_env("WHISPERCART_POLISH_TIMEOUT_SECS") {
            self.polish.timeout_secs = parse_u64("WHISPERCART_POLISH_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("WHISPERCART_POLISH_MAX_TOKENS") {
            self.polish.max_tokens = parse_u32("WHISPERCART_POLISH_MAX_TOKENS", &value)?;
        }

        if let Some(value) = read_env("WHISPERCART_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("WHISPERCART_SERVER_PORT") {
            self.server.port = parse_u16("WHISPERCART_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("WHISPERCART_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("WHISPERCART_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("WHISPERCART_LOGGING_LEVEL").or_else(|| read_env("WHISPERCART_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("WHISPERCART_LOGGING_FORMAT").or_else(|| read_env("WHISPERCART_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(polish_api_key) = overrides.polish_api_key {
            self.polish.api_key = Some(secret_value(polish_api_key));
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_polish(&self.polish)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), Path::new("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_timeout(section: &str, timeout_secs: u64) -> Result<(), ConfigError> {
    if timeout_secs == 0 || timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "{section}.timeout_secs must be in range 1..=300"
        )));
    }
    Ok(())
}

fn validate_url(key: &str, url: &str) -> Result<(), ConfigError> {
    let url = url.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!("{key} must start with http:// or https://")));
    }
    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    validate_timeout("llm", llm.timeout_secs)?;

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }
    if llm.max_new_tokens == 0 {
        return Err(ConfigError::Validation(
            "llm.max_new_tokens must be greater than zero".to_string(),
        ));
    }
    if let Some(base_url) = llm.base_url.as_deref().filter(|url| !url.trim().is_empty()) {
        validate_url("llm.base_url", base_url)?;
    }

    Ok(())
}

fn validate_polish(polish: &PolishConfig) -> Result<(), ConfigError> {
    validate_timeout("polish", polish.timeout_secs)?;
    validate_url("polish.base_url", &polish.base_url)?;

    if polish.max_tokens == 0 {
        return Err(ConfigError::Validation(
            "polish.max_tokens must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    polish: Option<PolishPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_new_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct PolishPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_tokens: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
