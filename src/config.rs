use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::GrabError;

pub const DEFAULT_CONFIG_FILE: &str = "grab-photos.json";
pub const DEFAULT_SOURCE_CSV: &str = "photos.csv";
pub const DEFAULT_URL_COLUMN: &str = "photo_url";
pub const DEFAULT_ID_COLUMN: &str = "participant_code";
pub const DEFAULT_DATE_COLUMN: &str = "diary_date";
pub const DEFAULT_TIME_COLUMN: &str = "meal_consume_time";
pub const DEFAULT_OUTPUT_DIR: &str = "pics";
pub const DEFAULT_CHUNK_SIZE: usize = 8192;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// On-disk shape of `grab-photos.json`. Every key is optional.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub source_csv: Option<String>,
    #[serde(default)]
    pub url_column: Option<String>,
    #[serde(default)]
    pub id_column: Option<String>,
    #[serde(default)]
    pub date_column: Option<String>,
    #[serde(default)]
    pub time_column: Option<String>,
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    pub url: String,
    pub id: String,
    pub date: String,
    pub time: String,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL_COLUMN.to_string(),
            id: DEFAULT_ID_COLUMN.to_string(),
            date: DEFAULT_DATE_COLUMN.to_string(),
            time: DEFAULT_TIME_COLUMN.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub source_csv: Utf8PathBuf,
    pub columns: Columns,
    pub output_dir: Utf8PathBuf,
    pub chunk_size: usize,
    pub timeout: Duration,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            source_csv: Utf8PathBuf::from(DEFAULT_SOURCE_CSV),
            columns: Columns::default(),
            output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
            chunk_size: DEFAULT_CHUNK_SIZE,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub source_csv: Option<String>,
    pub output_dir: Option<String>,
    pub chunk_size: Option<usize>,
    pub timeout_secs: Option<u64>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads the config file, if any, and applies `overrides` on top.
    ///
    /// Without an explicit path a missing `grab-photos.json` simply means
    /// "use the defaults"; an explicit path that cannot be read is an error.
    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, GrabError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| GrabError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content).map_err(|err| GrabError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(config, overrides)
    }

    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, GrabError> {
        let columns = Columns {
            url: column_name("url_column", config.url_column, DEFAULT_URL_COLUMN)?,
            id: column_name("id_column", config.id_column, DEFAULT_ID_COLUMN)?,
            date: column_name("date_column", config.date_column, DEFAULT_DATE_COLUMN)?,
            time: column_name("time_column", config.time_column, DEFAULT_TIME_COLUMN)?,
        };

        let source_csv = overrides
            .source_csv
            .or(config.source_csv)
            .unwrap_or_else(|| DEFAULT_SOURCE_CSV.to_string());
        let output_dir = overrides
            .output_dir
            .or(config.output_dir)
            .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string());

        let chunk_size = overrides
            .chunk_size
            .or(config.chunk_size)
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 {
            return Err(GrabError::InvalidConfig(
                "chunk_size must be greater than zero".to_string(),
            ));
        }

        let timeout_secs = overrides
            .timeout_secs
            .or(config.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(GrabError::InvalidConfig(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            source_csv: Utf8PathBuf::from(source_csv),
            columns,
            output_dir: Utf8PathBuf::from(output_dir),
            chunk_size,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn column_name(key: &str, value: Option<String>, default: &str) -> Result<String, GrabError> {
    match value {
        Some(name) if name.trim().is_empty() => Err(GrabError::InvalidConfig(format!(
            "{key} must not be empty"
        ))),
        Some(name) => Ok(name.trim().to_string()),
        None => Ok(default.to_string()),
    }
}
