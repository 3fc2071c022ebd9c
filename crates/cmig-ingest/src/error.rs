use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("read {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse csv {path}: {message}")]
    CsvParse { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, IngestError>;
