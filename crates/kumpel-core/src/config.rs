//! Configuration for Kumpel.
//!
//! Settings live in an optional `kumpel.json`. Every field has a default, so
//! a missing file or a partial file is fine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::checker::CheckMode;
use crate::error::{KumpelError, Result};
use crate::llm::DEFAULT_GEMINI_BASE_URL;
use crate::retry::{RetryPolicy, INITIAL_DELAY_SECONDS, MAX_RETRIES};

/// The default config file name.
pub const CONFIG_FILE_NAME: &str = "kumpel.json";

/// Environment variable that overrides the config file path.
pub const CONFIG_PATH_ENV: &str = "KUMPEL_CONFIG";

fn default_database_path() -> String {
    "stories.sqlite".to_string()
}

const fn default_max_retries() -> u32 {
    MAX_RETRIES
}

const fn default_initial_delay() -> u64 {
    INITIAL_DELAY_SECONDS
}

const fn default_preview_pause() -> u64 {
    3
}

fn default_api_key_env() -> String {
    "KUMPEL_GEMINI_API_KEY".to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_GEMINI_BASE_URL.to_string()
}

const fn default_request_timeout() -> u64 {
    120
}

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Path of the SQLite story library.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Attempts per retry budget.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry, in seconds. Doubles after each retry.
    #[serde(default = "default_initial_delay")]
    pub initial_delay_seconds: u64,

    /// Pause before the translation is revealed in the preview phase.
    #[serde(default = "default_preview_pause")]
    pub preview_pause_seconds: u64,

    /// How answers are judged.
    #[serde(default)]
    pub check_mode: CheckMode,

    /// Name of the environment variable holding the Gemini API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of the Gemini REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout of a single HTTP request, in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            max_retries: default_max_retries(),
            initial_delay_seconds: default_initial_delay(),
            preview_pause_seconds: default_preview_pause(),
            check_mode: CheckMode::default(),
            api_key_env: default_api_key_env(),
            api_base_url: default_api_base_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Config {
    /// Loads the configuration.
    ///
    /// Reads the file named by `KUMPEL_CONFIG` if set, otherwise
    /// `kumpel.json` in the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Self::load_from_file(&PathBuf::from(path));
        }
        let current_dir = std::env::current_dir().map_err(|e| {
            KumpelError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_dir(&current_dir)
    }

    /// Loads `kumpel.json` from a specific directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is invalid.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        Self::load_from_file(&dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns `KumpelError::ConfigParseError` if the file cannot be read or
    /// is not valid JSON, and `KumpelError::ConfigValidationError` if a value
    /// is out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(KumpelError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| KumpelError::config_parse(path, e.to_string()))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `KumpelError::ConfigValidationError` if any check fails.
    pub fn validate(&self) -> Result<()> {
        if self.max_retries == 0 {
            return Err(KumpelError::config_validation(
                "maxRetries must be greater than 0",
                "Set maxRetries to at least 1 in your kumpel.json",
            ));
        }

        if self.initial_delay_seconds == 0 {
            return Err(KumpelError::config_validation(
                "initialDelaySeconds must be greater than 0",
                "Set initialDelaySeconds to at least 1 in your kumpel.json",
            ));
        }

        if self.request_timeout_seconds == 0 {
            return Err(KumpelError::config_validation(
                "requestTimeoutSeconds must be greater than 0",
                "Set requestTimeoutSeconds to at least 1 in your kumpel.json",
            ));
        }

        if self.database_path.trim().is_empty() {
            return Err(KumpelError::config_validation(
                "databasePath must not be empty",
                "Provide a file path for the story library in your kumpel.json",
            ));
        }

        if self.api_key_env.trim().is_empty() {
            return Err(KumpelError::config_validation(
                "apiKeyEnv must not be empty",
                "Name the environment variable holding your API key, e.g. \"KUMPEL_GEMINI_API_KEY\"",
            ));
        }

        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(KumpelError::config_validation(
                format!("apiBaseUrl '{}' is not an http(s) URL", self.api_base_url),
                format!("Remove apiBaseUrl to use {DEFAULT_GEMINI_BASE_URL}"),
            ));
        }

        Ok(())
    }

    /// Reads the API key from the configured environment variable.
    ///
    /// # Errors
    ///
    /// Returns `KumpelError::MissingApiKey` if the variable is unset or blank.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(KumpelError::missing_api_key(&self.api_key_env)),
        }
    }

    /// Retry policy built from `maxRetries` and `initialDelaySeconds`.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_secs(self.initial_delay_seconds),
        )
    }

    /// Pause before the translation is revealed.
    #[must_use]
    pub const fn preview_pause(&self) -> Duration {
        Duration::from_secs(self.preview_pause_seconds)
    }

    /// Timeout of a single HTTP request.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}
