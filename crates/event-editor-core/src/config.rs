//! Editor configuration

use crate::error::ConfigError;
use crate::history::DEFAULT_HISTORY_LIMIT;
use serde::{Deserialize, Serialize};

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Capacity of the undo and redo stacks
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Display width of a collapsed fold's preview label
    #[serde(default = "default_fold_preview_width")]
    pub fold_preview_width: usize,

    /// Expand folds hiding a search match
    #[serde(default = "default_true")]
    pub unfold_on_search: bool,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_fold_preview_width() -> usize {
    48
}

fn default_true() -> bool {
    true
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            fold_preview_width: default_fold_preview_width(),
            unfold_on_search: default_true(),
        }
    }
}

impl EditorConfig {
    /// Parse host settings. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config = EditorConfig::from_json_str(r#"{"history_limit": 20}"#).unwrap();
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.fold_preview_width, 48);
        assert!(config.unfold_on_search);
        assert_eq!(EditorConfig::from_json_str("{}").unwrap(), EditorConfig::default());
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            EditorConfig::from_json_str(r#"{"history_limit": "many"}"#),
            Err(ConfigError::Json(_))
        ));
    }
}
