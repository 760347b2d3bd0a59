use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum GrabError {
    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read dataset {path}: {message}")]
    #[diagnostic(help("check the --source path or the source_csv config key"))]
    DatasetRead { path: PathBuf, message: String },

    #[error("failed to parse dataset: {0}")]
    DatasetParse(String),

    #[error("dataset has no column named {0:?}")]
    #[diagnostic(help("column names are configured with the *_column config keys"))]
    MissingColumn(String),

    #[error("row has no value for column {0:?}")]
    MissingField(String),

    #[error("cannot parse {input:?} as a day-first date and time")]
    Timestamp { input: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("server returned status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

