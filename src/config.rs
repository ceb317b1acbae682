// ⚙️ Pipeline Configuration - TOML file with CLI overrides

use crate::error::ConfigError;
use crate::source::{REGISTRY_HEADER_LINES, TRANSACTION_PREAMBLE_LINES};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Building-register title extracts (표제부)
    pub registry_files: Vec<PathBuf>,

    /// Lease transaction extracts; building type comes from each file name
    pub transaction_files: Vec<PathBuf>,

    pub preamble_lines: usize,
    pub registry_header_lines: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        InputConfig {
            registry_files: Vec::new(),
            transaction_files: Vec::new(),
            preamble_lines: TRANSACTION_PREAMBLE_LINES,
            registry_header_lines: REGISTRY_HEADER_LINES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub csv: bool,
    pub json: bool,
    /// SQLite database to upsert summaries into
    pub database: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            dir: PathBuf::from("data/buildings/processed"),
            csv: true,
            json: true,
            database: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a config file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(PipelineConfig::default());
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// A run needs at least one transaction file. Registry files are
    /// optional: without them every building is simply unmatched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.transaction_files.is_empty() {
            return Err(ConfigError::MissingInput("transaction"));
        }
        Ok(())
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output.dir.join("buildings_processed.csv")
    }

    pub fn json_path(&self) -> PathBuf {
        self.output.dir.join("buildings_processed.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();

        assert!(config.input.registry_files.is_empty());
        assert!(config.input.transaction_files.is_empty());
        assert_eq!(config.input.preamble_lines, 16);
        assert_eq!(config.input.registry_header_lines, 1);
        assert!(config.output.csv);
        assert!(config.output.json);
        assert!(config.output.database.is_none());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let text = r#"
            [input]
            registry_files = ["raw/표제부_영통.csv"]
            transaction_files = ["raw/아파트(전월세)_실거래가_영통동.csv"]

            [output]
            database = "buildings.db"
            json = false
        "#;
        let config = PipelineConfig::from_toml_str(text, Path::new("reconcile.toml")).unwrap();

        assert_eq!(config.input.registry_files.len(), 1);
        assert_eq!(config.input.preamble_lines, 16);
        assert_eq!(config.output.database, Some(PathBuf::from("buildings.db")));
        assert!(config.output.csv);
        assert!(!config.output.json);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.csv_path(),
            PathBuf::from("data/buildings/processed/buildings_processed.csv")
        );
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let result = PipelineConfig::from_toml_str("[input\n", Path::new("bad.toml"));
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = PipelineConfig::load(Path::new("/nonexistent/reconcile.toml")).unwrap();
        assert_eq!(config, PipelineConfig::default());
    }
}
