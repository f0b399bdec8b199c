use heartgen_core::DEFAULT_EXTENSIONS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "heartgen.config.json";

/// heartgen configuration file format. Paths are relative to the scan root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Extra include directories passed to the front-end
    #[serde(default)]
    pub include_dirs: Vec<String>,

    /// heart-core directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_dir: Option<String>,

    /// Recognised source extensions, without the dot
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Generated file location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect()
}

impl Config {
    /// Load config from the scan root, falling back to defaults
    pub fn load(root: &Path) -> anyhow::Result<Self> {
        let config_path = root.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn include_dirs(&self, root: &Path) -> Vec<PathBuf> {
        self.include_dirs.iter().map(|dir| root.join(dir)).collect()
    }

    pub fn heart_dir(&self, root: &Path) -> Option<PathBuf> {
        self.heart_dir.as_ref().map(|dir| root.join(dir))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_dirs: vec![],
            heart_dir: None,
            extensions: default_extensions(),
            output: None,
        }
    }
}
