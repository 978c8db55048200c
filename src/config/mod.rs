//! Configuration system (layered: defaults < TOML file < .env < environment).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyllabusError};

/// Value shipped in the `.env` template; treated as "no key configured".
pub const PLACEHOLDER_API_KEY: &str = "your-anthropic-api-key-here";

/// Runtime configuration for the course assistant.
#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyllabusConfig {
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_results: usize,
    pub max_history: usize,
    pub max_tool_rounds: usize,
    pub request_timeout_secs: u64,
    pub docs_path: PathBuf,
    pub session_dir: Option<PathBuf>,
}

impl Default for SyllabusConfig {
    fn default() -> Self {
        Self {
            anthropic_api_key: None,
            anthropic_base_url: None,
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 800,
            temperature: 0.0,
            chunk_size: 800,
            chunk_overlap: 100,
            max_results: 5,
            max_history: 2,
            max_tool_rounds: 2,
            request_timeout_secs: 120,
            docs_path: PathBuf::from("../docs"),
            session_dir: None,
        }
    }
}

impl fmt::Debug for SyllabusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyllabusConfig")
            .field("anthropic_api_key", &self.anthropic_api_key.as_ref().map(|_| ".."))
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .field("max_results", &self.max_results)
            .field("max_history", &self.max_history)
            .field("max_tool_rounds", &self.max_tool_rounds)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("docs_path", &self.docs_path)
            .field("session_dir", &self.session_dir)
            .finish()
    }
}

impl SyllabusConfig {
    /// Load every layer.
    ///
    /// An explicit `path` must exist; without one, `~/.syllabus/config.toml`
    /// is read only if present. `.env` in the working directory is loaded
    /// into the process environment before environment overrides apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        let _ = dotenvy::dotenv(); // a missing .env is fine
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus process environment (after `.env`), no file layer.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SyllabusError::Configuration(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| SyllabusError::Configuration(format!("Invalid config file: {e}")))
    }

    /// Apply environment overrides read through `lookup`.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(key);
        }
        if let Some(url) = get("ANTHROPIC_BASE_URL") {
            self.anthropic_base_url = Some(url);
        }
        if let Some(model) = get("ANTHROPIC_MODEL") {
            self.model = model;
        }
        if let Some(path) = get("SYLLABUS_DOCS_PATH") {
            self.docs_path = PathBuf::from(path);
        }
        if let Some(dir) = get("SYLLABUS_SESSION_DIR") {
            self.session_dir = Some(PathBuf::from(dir));
        }

        override_parsed(&get, "SYLLABUS_CHUNK_SIZE", &mut self.chunk_size)?;
        override_parsed(&get, "SYLLABUS_CHUNK_OVERLAP", &mut self.chunk_overlap)?;
        override_parsed(&get, "SYLLABUS_MAX_RESULTS", &mut self.max_results)?;
        override_parsed(&get, "SYLLABUS_MAX_HISTORY", &mut self.max_history)?;
        override_parsed(&get, "SYLLABUS_MAX_TOOL_ROUNDS", &mut self.max_tool_rounds)?;
        override_parsed(&get, "SYLLABUS_REQUEST_TIMEOUT_SECS", &mut self.request_timeout_secs)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SyllabusError::Configuration("chunk_size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(SyllabusError::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.max_results == 0 {
            return Err(SyllabusError::Configuration("max_results must be positive".into()));
        }
        Ok(())
    }

    /// The configured API key, rejecting blanks and the template placeholder.
    pub fn api_key(&self) -> Result<String> {
        match self.anthropic_api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() && key != PLACEHOLDER_API_KEY => Ok(key.to_string()),
            _ => Err(SyllabusError::Authentication("Missing ANTHROPIC_API_KEY".into())),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_ok()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Directory for persisted sessions (`~/.syllabus/sessions` by default).
    pub fn session_dir(&self) -> PathBuf {
        self.session_dir
            .clone()
            .unwrap_or_else(|| default_syllabus_dir().join("sessions"))
    }
}

fn override_parsed<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) -> Result<()> {
    if let Some(raw) = get(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|_| SyllabusError::Configuration(format!("{key} has invalid value '{raw}'")))?;
    }
    Ok(())
}

fn default_syllabus_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".syllabus"))
        .unwrap_or_else(|| PathBuf::from(".syllabus"))
}

/// `~/.syllabus/config.toml`, when a home directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    directories::UserDirs::new().map(|dirs| dirs.home_dir().join(".syllabus").join("config.toml"))
}
