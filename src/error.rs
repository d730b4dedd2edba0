// ISF error taxonomy

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IsfError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid file extension: expected .isf, got '{0}'")]
    InvalidExtension(String),

    #[error("Unsupported curve encoding: {0} (only BINARY is supported)")]
    UnsupportedEncoding(String),

    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    #[error("Data length mismatch: :CURVE declares {declared} bytes, header implies {expected}")]
    DataLengthMismatch { declared: usize, expected: usize },

    #[error("Truncated data: expected {expected} samples, read {actual}")]
    TruncatedData { expected: usize, actual: usize },

    #[error("Missing required tag: {0}")]
    MissingTag(String),

    #[error("Invalid value for tag {tag}: '{value}'")]
    InvalidTagValue { tag: String, value: String },

    #[error("Unsupported sample width: {0} bytes")]
    UnsupportedWidth(usize),

    #[error("No ISF files to stack")]
    NoFiles,
}

pub type Result<T> = std::result::Result<T, IsfError>;
