//! Engine configuration.
//!
//! Resolution order: builtin defaults, then an optional TOML file under the
//! platform config dir, then `PROMPTGATE_*` environment overrides. The
//! protection flag is owned by the embedding surface; the engine only reads
//! it at startup and honors toggle notices at runtime.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// Hosts the interceptor inspects by default. Everything else passes
/// through untouched.
pub const DEFAULT_ALLOWED_HOSTS: &[&str] = &[
    // OpenAI
    "chat.openai.com",
    "chatgpt.com",
    // Anthropic
    "claude.ai",
    // Google
    "gemini.google.com",
    "aistudio.google.com",
    "bard.google.com",
    "makersuite.google.com",
    "labs.google",
    // Perplexity
    "perplexity.ai",
    "www.perplexity.ai",
    "labs.perplexity.ai",
    // Aggregators
    "poe.com",
    "you.com",
    // HuggingFace
    "huggingface.co",
    // Microsoft
    "copilot.microsoft.com",
    "www.bing.com",
    // Other assistants
    "pi.ai",
    "heypi.com",
    "character.ai",
    "beta.character.ai",
    // Developer tools
    "groq.com",
    "console.groq.com",
    "chat.mistral.ai",
    "together.ai",
    "www.together.ai",
    "api.together.xyz",
    "cohere.com",
    "dashboard.cohere.com",
    "coral.cohere.com",
    "replicate.com",
    "deepai.org",
    "www.deepai.org",
    // Writing tools
    "jasper.ai",
    "www.jasper.ai",
    "app.jasper.ai",
    "copy.ai",
    "www.copy.ai",
    "app.copy.ai",
    "writesonic.com",
    "app.writesonic.com",
    "notion.so",
    "www.notion.so",
    // Code assistants
    "phind.com",
    "www.phind.com",
    // Other
    "forefront.ai",
    "www.forefront.ai",
    "chat.forefront.ai",
    "open-assistant.io",
    "www.llama2.ai",
];

/// Runtime configuration for the gate engine.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Master protection switch. When false the interceptor never suppresses.
    pub enabled: bool,
    /// Base URL of the remote scoring service.
    pub api_base: Url,
    /// Hard bound on the remote scan call.
    pub scan_timeout: Duration,
    /// Settle delay between writing text and replaying the send.
    pub replay_delay: Duration,
    /// Hostnames the interceptor is allowed to inspect.
    pub allowed_hosts: Vec<String>,
    /// Append-only decision audit log. None disables auditing.
    pub audit_path: Option<PathBuf>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: Url::parse("http://127.0.0.1:8787").expect("static default URL"),
            scan_timeout: Duration::from_millis(5000),
            replay_delay: Duration::from_millis(100),
            allowed_hosts: DEFAULT_ALLOWED_HOSTS.iter().map(|s| s.to_string()).collect(),
            audit_path: None,
        }
    }
}

/// On-disk shape of the optional config file. Every field is optional and
/// falls back to the builtin default.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    enabled: Option<bool>,
    api_base: Option<String>,
    scan_timeout_ms: Option<u64>,
    replay_delay_ms: Option<u64>,
    allowed_hosts: Option<Vec<String>>,
    audit_path: Option<PathBuf>,
}

impl GuardConfig {
    /// Load configuration: defaults, then the platform config file if it
    /// exists, then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = Self::config_file_path()
            && path.exists()
        {
            config.apply_file(&path)?;
        }
        config.apply_env()?;
        Ok(config)
    }

    /// Load from an explicit file, then environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_file(path)?;
        config.apply_env()?;
        Ok(config)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("promptgate").join("config.toml"))
    }

    fn apply_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: FileConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        if let Some(enabled) = file.enabled {
            self.enabled = enabled;
        }
        if let Some(base) = file.api_base {
            self.api_base = parse_url("api_base", &base)?;
        }
        if let Some(ms) = file.scan_timeout_ms {
            self.scan_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.replay_delay_ms {
            self.replay_delay = Duration::from_millis(ms);
        }
        if let Some(hosts) = file.allowed_hosts {
            self.allowed_hosts = hosts;
        }
        if let Some(path) = file.audit_path {
            self.audit_path = Some(path);
        }
        Ok(())
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(v) = std::env::var("PROMPTGATE_ENABLED") {
            self.enabled = parse_bool("PROMPTGATE_ENABLED", &v)?;
        }
        if let Ok(v) = std::env::var("PROMPTGATE_API_BASE") {
            self.api_base = parse_url("PROMPTGATE_API_BASE", &v)?;
        }
        if let Ok(v) = std::env::var("PROMPTGATE_SCAN_TIMEOUT_MS") {
            self.scan_timeout = Duration::from_millis(parse_u64("PROMPTGATE_SCAN_TIMEOUT_MS", &v)?);
        }
        if let Ok(v) = std::env::var("PROMPTGATE_REPLAY_DELAY_MS") {
            self.replay_delay = Duration::from_millis(parse_u64("PROMPTGATE_REPLAY_DELAY_MS", &v)?);
        }
        if let Ok(v) = std::env::var("PROMPTGATE_AUDIT_PATH") {
            self.audit_path = Some(PathBuf::from(v));
        }
        Ok(())
    }

    /// Endpoint for the sanitize call.
    pub fn sanitize_url(&self) -> Url {
        join_path(&self.api_base, "v1/sanitize")
    }

    /// Endpoint for the liveness probe.
    pub fn health_url(&self) -> Url {
        join_path(&self.api_base, "health")
    }
}

fn join_path(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    {
        let mut segments = url.path_segments_mut().expect("base URL cannot be opaque");
        segments.pop_if_empty();
        for seg in path.split('/') {
            segments.push(seg);
        }
    }
    url
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected 'true' or 'false', got '{other}'"),
        }),
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("must be a positive integer: {e}"),
    })
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("must be a valid URL: {e}"),
    })?;
    // Opaque URLs (mailto:, data:) cannot carry the endpoint paths.
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{value}' cannot serve as a base URL"),
        });
    }
    Ok(url)
}
