use std::path::PathBuf;

use thiserror::Error;

/// Failures reading a source extract. Any of these fails the whole run
/// before a single row reaches the batch.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not valid UTF-8 (re-encode cp949/euc-kr extracts before ingesting)", .path.display())]
    Encoding { path: PathBuf },

    #[error(transparent)]
    BuildingType(#[from] crate::parser::UnknownBuildingType),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no {0} files configured")]
    MissingInput(&'static str),
}
