//! Error types for Syllabus.

use thiserror::Error;

/// Primary error type for all Syllabus operations.
#[derive(Error, Debug)]
pub enum SyllabusError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool already registered: {0}")]
    DuplicateTool(String),

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    /// A generator call failed; `round` is the 1-based generator call index.
    #[error("Generation failed in round {round}: {source}")]
    GeneratorCall {
        round: usize,
        #[source]
        source: Box<SyllabusError>,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Ingestion error: {0}")]
    Ingestion(String),

    #[error("Session error: {0}")]
    Session(String),
}

/// Coarse classification used for logging and user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Authentication,
    RateLimit,
    Network,
    Timeout,
    Configuration,
    Serialization,
    Api,
    Server,
    Tool,
    Generator,
    Ingestion,
    Unknown,
}

impl SyllabusError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a tool execution error.
    pub fn tool(tool_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolExecution {
            tool_name: tool_name.into(),
            message: message.into(),
        }
    }

    /// Wrap a backend failure with the generator call it happened in.
    pub fn generator_call(round: usize, source: SyllabusError) -> Self {
        Self::GeneratorCall {
            round,
            source: Box::new(source),
        }
    }

    /// Classify this error into a category.
    ///
    /// A `GeneratorCall` reports the category of the backend failure it wraps,
    /// so an expired key still reads as `Authentication`.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                401 | 403 => ErrorCategory::Authentication,
                429 => ErrorCategory::RateLimit,
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::UnknownTool(_)
            | Self::DuplicateTool(_)
            | Self::ToolExecution { .. }
            | Self::InvalidArgument(_) => ErrorCategory::Tool,
            Self::GeneratorCall { source, .. } => match source.category() {
                ErrorCategory::Unknown => ErrorCategory::Generator,
                other => other,
            },
            Self::Ingestion(_) => ErrorCategory::Ingestion,
            Self::Io(_) | Self::Session(_) => ErrorCategory::Unknown,
        }
    }

    /// The round a generator failure happened in, if this is one.
    pub fn failed_round(&self) -> Option<usize> {
        match self {
            Self::GeneratorCall { round, .. } => Some(*round),
            _ => None,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, SyllabusError>;
