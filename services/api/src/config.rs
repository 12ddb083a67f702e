//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use doc_analysis_core::pipeline::Latency;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which backend answers follow-up questions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QaBackend {
    Canned,
    OpenAi,
}

impl FromStr for QaBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "canned" => Ok(QaBackend::Canned),
            "openai" => Ok(QaBackend::OpenAi),
            other => Err(format!("'{}' is not one of: canned, openai", other)),
        }
    }
}

/// The visual theme handed to clients. Purely presentational: both themes
/// drive exactly the same behavior.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn accent(self) -> &'static str {
        match self {
            Theme::Light => "#2563eb",
            Theme::Dark => "#a78bfa",
        }
    }

    pub fn background(self) -> &'static str {
        match self {
            Theme::Light => "#f8fafc",
            Theme::Dark => "#0f172a",
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("'{}' is not one of: light, dark", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub cors_origin: String,
    pub latency: Latency,
    pub openai_api_key: Option<String>,
    pub tts_voice: String,
    pub qa_backend: QaBackend,
    pub qa_model: String,
    pub theme: Theme,
}

impl Default for Config {
    /// The configuration used when no environment variables are set.
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: Level::INFO,
            cors_origin: "http://localhost:5173".to_string(),
            latency: Latency::default(),
            openai_api_key: None,
            tts_voice: "alloy".to_string(),
            qa_backend: QaBackend::Canned,
            qa_model: "gpt-4o-mini".to_string(),
            theme: Theme::Dark,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        // --- Server Settings ---
        let bind_address = match lookup("BIND_ADDRESS") {
            Some(value) => value.parse::<SocketAddr>().map_err(|e| {
                ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
            })?,
            None => defaults.bind_address,
        };

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = lookup("CORS_ORIGIN").unwrap_or(defaults.cors_origin);

        // --- Simulated Processing Latency ---
        let latency = Latency {
            upload: millis(&lookup, "UPLOAD_DELAY_MS", defaults.latency.upload)?,
            analysis: millis(&lookup, "ANALYSIS_DELAY_MS", defaults.latency.analysis)?,
            audio_script: millis(&lookup, "AUDIO_SCRIPT_DELAY_MS", defaults.latency.audio_script)?,
        };

        // --- Adapter-specific Settings ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());
        let tts_voice = lookup("TTS_VOICE").unwrap_or(defaults.tts_voice);
        let qa_model = lookup("QA_MODEL").unwrap_or(defaults.qa_model);
        let qa_backend = match lookup("QA_BACKEND") {
            Some(value) => value
                .parse::<QaBackend>()
                .map_err(|e| ConfigError::InvalidValue("QA_BACKEND".to_string(), e))?,
            None => defaults.qa_backend,
        };
        if qa_backend == QaBackend::OpenAi && openai_api_key.is_none() {
            return Err(ConfigError::MissingVar("OPENAI_API_KEY".to_string()));
        }

        let theme = match lookup("THEME") {
            Some(value) => value
                .parse::<Theme>()
                .map_err(|e| ConfigError::InvalidValue("THEME".to_string(), e))?,
            None => defaults.theme,
        };

        Ok(Self {
            bind_address,
            log_level,
            cors_origin,
            latency,
            openai_api_key,
            tts_voice,
            qa_backend,
            qa_model,
            theme,
        })
    }
}

fn millis<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
