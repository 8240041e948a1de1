use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use spendlens_core::{Category, CategoryConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DATA_DIR_ENV: &str = "SPENDLENS_DATA_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the database and uploaded receipts live.
    pub data_dir: Option<PathBuf>,
    /// Base for receipt links; defaults to a `file://` URL into the data dir.
    pub public_base_url: Option<String>,
    pub ocr_timeout_secs: u64,
    pub ocr_lang: String,
    pub categories: Vec<Category>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            public_base_url: None,
            ocr_timeout_secs: 30,
            ocr_lang: "eng".to_string(),
            categories: Vec::new(),
        }
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "spendlens", "Spendlens")
}

pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|d| d.config_dir().join("config.toml"))
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config")
    }

    /// Load `path`, or the platform default. A missing file means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_config_path() {
                Some(p) => p,
                None => return Ok(Self::default()),
            },
        };
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("In {}", path.display()))
    }

    /// `$SPENDLENS_DATA_DIR`, then the config value, then the platform data dir.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return Ok(PathBuf::from(dir));
        }
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .context("Could not determine a data directory; set data_dir in the config")
    }

    pub fn public_base_url(&self, files_root: &Path) -> String {
        self.public_base_url
            .clone()
            .unwrap_or_else(|| format!("file://{}", files_root.display()))
    }

    pub fn ocr_timeout(&self) -> Duration {
        Duration::from_secs(self.ocr_timeout_secs)
    }

    pub fn category_config(&self) -> Result<CategoryConfig> {
        if self.categories.is_empty() {
            return Ok(CategoryConfig::default());
        }
        CategoryConfig::new(self.categories.clone()).context("Invalid categories in config")
    }
}
