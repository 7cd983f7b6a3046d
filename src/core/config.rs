use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::error::{GqlError, Result};

pub const DEFAULT_ROOT: &str = "variables";
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    pub root: String,
    /// Deepest tree `Extractor` accepts. 0 disables the check.
    pub max_depth: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ExtractConfig {
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(|e| GqlError::Configuration(e.to_string()))?
        } else {
            toml::from_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &PathBuf) -> Result<()> {
        let content = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::to_string_pretty(self)
                .map_err(|e| GqlError::Configuration(e.to_string()))?
        } else {
            toml::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn depth_limit(&self) -> Option<usize> {
        if self.max_depth == 0 {
            None
        } else {
            Some(self.max_depth)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.root.is_empty() {
            return Err(GqlError::Configuration("root must not be empty".to_string()));
        }
        if self.root.contains('.') {
            return Err(GqlError::Configuration(format!(
                "root must not contain '.': {}",
                self.root
            )));
        }
        Ok(())
    }
}

pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ExtractConfig::default(),
        }
    }

    pub fn root<S: Into<String>>(mut self, root: S) -> Self {
        self.config.root = root.into();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    pub fn unlimited_depth(mut self) -> Self {
        self.config.max_depth = 0;
        self
    }

    pub fn build(self) -> ExtractConfig {
        self.config
    }
}

impl Default for ExtractConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
