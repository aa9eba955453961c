//! Parser configuration.
//!
//! A [`ParserConfig`] is owned by a [`Grammar`](crate::Grammar) and applies
//! uniformly to every rule during a parse. It can be built in code or loaded
//! from a YAML / JSON document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::SprigError;

/// Default cap on simultaneously open rule applications.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Settings that govern how a grammar parses.
///
/// # Examples
///
/// ```rust
/// use sprig::ParserConfig;
/// let config = ParserConfig::default().with_skip_whitespace(false).with_max_depth(128);
/// assert!(!config.skip_whitespace);
/// assert_eq!(config.max_depth, 128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParserConfig {
    /// Skip runs of ASCII spaces (U+0020 only) before every rule application.
    pub skip_whitespace: bool,
    /// Once more than this many rule applications are open, the parse aborts
    /// with a fatal syntax error.
    pub max_depth: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            skip_whitespace: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skip_whitespace(mut self, skip: bool) -> Self {
        self.skip_whitespace = skip;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Loads a configuration file. `.json` files are read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, SprigError> {
        let text = std::fs::read_to_string(path).map_err(|e| SprigError::io(path.display(), e))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&text).map_err(|e| SprigError::config(path.display(), e))
        } else {
            Self::from_yaml(&text).map_err(|e| SprigError::config(path.display(), e))
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_skip_spaces_with_depth_64() {
        let config = ParserConfig::default();
        assert!(config.skip_whitespace);
        assert_eq!(config.max_depth, 64);
    }

    #[test]
    fn yaml_fields_are_optional() {
        let config = ParserConfig::from_yaml("skip_whitespace: false\n").unwrap();
        assert!(!config.skip_whitespace);
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn json_is_accepted() {
        let config = ParserConfig::from_json(r#"{"max_depth": 10}"#).unwrap();
        assert!(config.skip_whitespace);
        assert_eq!(config.max_depth, 10);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(ParserConfig::from_yaml("skip_tabs: true\n").is_err());
    }
}
