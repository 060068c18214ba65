//! Error types for PromptGate.
//!
//! Remote-scan failures are deliberately not errors: the gate degrades to
//! local-only classification and never surfaces a raw failure to the user
//! (see [`crate::scanner::ScanOutcome`]). The enums here cover the cases
//! that genuinely stop construction or configuration.

use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Rule table construction errors.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid pattern for rule '{name}': {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid token set for rule '{name}': {source}")]
    InvalidTokens {
        name: String,
        #[source]
        source: aho_corasick::BuildError,
    },
}

/// Engine assembly errors.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error(transparent)]
    Scanner(#[from] ScanError),
}

/// Remote scanner construction errors.
///
/// Runtime scan failures are represented as `ScanOutcome::Unavailable`, not
/// as this type.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid scoring endpoint '{url}': {source}")]
    Endpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
