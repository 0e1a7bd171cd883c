use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Top-level configuration structure for the file handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub bank_queue: QueueConfig,
    pub file_cache: FileCacheConfig,
}

impl HandlerConfig {
    /// Parses a configuration from a JSON document. Missing sections fall
    /// back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}

/// Scheduling class a background queue is registered under.
///
/// The host's task fabric weighs queues against each other by this class;
/// inside this crate it is carried for diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskPriority {
    Blocking,
    High,
    Normal,
    BackgroundHigh,
    #[default]
    BackgroundNormal,
    BackgroundLow,
}

impl TaskPriority {
    pub fn is_background(self) -> bool {
        matches!(
            self,
            Self::BackgroundHigh | Self::BackgroundNormal | Self::BackgroundLow
        )
    }
}

/// Settings for the bank execution queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub name: String,
    pub priority: TaskPriority,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: "BankExecutionQueue".to_string(),
            priority: TaskPriority::BackgroundNormal,
        }
    }
}

/// Settings for the default file cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCacheConfig {
    /// Directory that relative paths are resolved against.
    pub root: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = HandlerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, HandlerConfig::default());
        assert_eq!(config.bank_queue.name, "BankExecutionQueue");
        assert_eq!(config.bank_queue.priority, TaskPriority::BackgroundNormal);
        assert!(config.file_cache.root.is_none());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = HandlerConfig::from_json_str(
            r#"{ "bank_queue": { "priority": "High" }, "file_cache": { "root": "/banks" } }"#,
        )
        .unwrap();

        assert_eq!(config.bank_queue.name, "BankExecutionQueue");
        assert_eq!(config.bank_queue.priority, TaskPriority::High);
        assert_eq!(config.file_cache.root, Some(PathBuf::from("/banks")));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = HandlerConfig::from_json_str("{ not json").unwrap_err();
        assert!(format!("{err}").contains("invalid configuration"));
    }

    #[test]
    fn background_classes() {
        assert!(TaskPriority::BackgroundLow.is_background());
        assert!(!TaskPriority::Normal.is_background());
    }
}
