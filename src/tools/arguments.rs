//! Typed access to tool call arguments.

use crate::error::SyllabusError;

/// Wrapper around a tool invocation's input payload providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, SyllabusError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| SyllabusError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument. JSON `null` counts as absent.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get an optional non-negative integer argument.
    pub fn get_u32_opt(&self, key: &str) -> Result<Option<u32>, SyllabusError> {
        match self.value.get(key) {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(v) => v
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| {
                    SyllabusError::InvalidArgument(format!(
                        "Argument {key} must be a non-negative integer"
                    ))
                }),
        }
    }
}
