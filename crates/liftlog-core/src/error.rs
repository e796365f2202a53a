//! Core error types for liftlog-core.
//!
//! Errors are split by how the pipeline reacts to them:
//! - [`MalformedSourceError`] and [`IoWriteError`] are fatal and abort a run.
//! - [`ValidationError`] is per record; the record is skipped and logged.
//! - [`ConfigError`] covers loading, saving and validating configuration.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::CanonicalField;

/// Core error type for liftlog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The input export could not be read as a table.
    #[error("Malformed source: {0}")]
    MalformedSource(#[from] MalformedSourceError),

    /// An output file could not be written.
    #[error("Write failed: {0}")]
    IoWrite(#[from] IoWriteError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Fatal ingestion errors.
#[derive(Error, Debug)]
pub enum MalformedSourceError {
    /// The source could not be opened or read.
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading failed part way through a stream with no known path.
    #[error("read failed: {0}")]
    Read(#[source] std::io::Error),

    /// The source is empty or its first row has no usable column names.
    #[error("header row is missing")]
    MissingHeader,

    /// A required canonical field has no matching column in the header.
    #[error("no column for required field '{field}' (looked for: {candidates}; header: {header})")]
    MissingColumn {
        field: CanonicalField,
        candidates: String,
        header: String,
    },

    /// The header is present but nothing follows it.
    #[error("no data rows after the header")]
    NoDataRows,

    /// A row could not be decoded (bad quoting, invalid UTF-8, ...).
    #[error("cannot decode row at line {line}: {message}")]
    Undecodable { line: u64, message: String },

    /// The configured delimiter is not a single ASCII byte.
    #[error("'{}' cannot be used as a delimiter", .0.escape_default())]
    UnsupportedDelimiter(char),
}

/// Why a single field failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    #[error("missing value")]
    Missing,

    #[error("not a number: '{0}'")]
    NonNumeric(String),

    #[error("negative value: '{0}'")]
    Negative(String),

    #[error("unparseable date: '{0}'")]
    UnparseableDate(String),

    #[error("unknown weight unit: '{0}'")]
    UnknownUnit(String),

    #[error("unparseable duration: '{0}'")]
    UnparseableDuration(String),

    #[error("zero weight and reps")]
    ZeroWeightAndReps,
}

/// Per-record validation failure, carrying the offending field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: CanonicalField,
    pub reason: ValidationReason,
}

impl ValidationError {
    pub fn new(field: CanonicalField, reason: ValidationReason) -> Self {
        Self { field, reason }
    }
}

/// Output could not be written; no partial file is left at `path`.
#[derive(Error, Debug)]
#[error("cannot write {path}: {source}")]
pub struct IoWriteError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl IoWriteError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown dot-path key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Failed to locate the configuration directory
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
