//! Error handling for ndx-sound
//!
//! Every failure surfaces to the caller unchanged; nothing here retries.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for ndx-sound operations
pub type Result<T> = std::result::Result<T, SoundError>;

/// Main error type for ndx-sound operations
#[derive(Error, Debug)]
pub enum SoundError {
    // Construction Errors
    #[error("Invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Invalid sampling rate {rate} Hz: {reason}")]
    InvalidRate { rate: f64, reason: String },

    #[error("Invalid starting time: {value}")]
    InvalidStartingTime { value: f64 },

    #[error("Invalid data shape {shape:?}: {reason}")]
    InvalidShape { shape: Vec<usize>, reason: String },

    #[error("Invalid data: {reason}")]
    InvalidData { reason: String },

    #[error("Invalid frequency range [{low}, {high}]")]
    InvalidFrequencyRange { low: f64, high: f64 },

    // Table Errors
    #[error("Device '{device}' is a {actual}, expected a {expected}")]
    DeviceKindMismatch {
        device: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Row index {index} out of bounds for table '{table}' with {len} rows")]
    RegionOutOfBounds {
        table: String,
        index: usize,
        len: usize,
    },

    #[error("Region references table '{table}', expected a {expected}")]
    TableMismatch { table: String, expected: &'static str },

    // Container Errors
    #[error("'{name}' already exists in {container}")]
    DuplicateName { container: String, name: String },

    #[error("Unknown device: {name}")]
    UnknownDevice { name: String },

    #[error("Unresolved link from '{from}': {reason}")]
    UnresolvedLink { from: String, reason: String },

    // Schema Errors
    #[error("Invalid spec for '{type_name}': {reason}")]
    InvalidSpec { type_name: String, reason: String },

    #[error("Namespace file not found; searched {searched:?}")]
    NamespaceNotFound { searched: Vec<PathBuf> },

    #[error("Type '{type_name}' already registered by namespace '{namespace}'")]
    NamespaceConflict { type_name: String, namespace: String },

    #[error("Unknown type '{type_name}' in namespace '{namespace}'")]
    UnknownType { type_name: String, namespace: String },

    #[error("Namespace '{namespace}' names schema source '{file}', which was not supplied")]
    MissingSchemaSource { namespace: String, file: String },

    // Visualization Errors
    #[error("Time {time}s outside of series range [{min}, {max}]")]
    TimeWindowOutOfRange { time: f64, min: f64, max: f64 },

    #[error("Audio buffer is not finite everywhere")]
    NonFiniteAudio,

    // Persistence Errors
    #[error("Checksum mismatch in {path}")]
    ChecksumMismatch { path: PathBuf },

    #[error("Unsupported file format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Failed to read file: {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}: {source}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // Serialization Errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl SoundError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SoundError::InvalidName { .. } => "INVALID_NAME",
            SoundError::InvalidRate { .. } => "INVALID_RATE",
            SoundError::InvalidStartingTime { .. } => "INVALID_STARTING_TIME",
            SoundError::InvalidShape { .. } => "INVALID_SHAPE",
            SoundError::InvalidData { .. } => "INVALID_DATA",
            SoundError::InvalidFrequencyRange { .. } => "INVALID_FREQUENCY_RANGE",
            SoundError::DeviceKindMismatch { .. } => "DEVICE_KIND_MISMATCH",
            SoundError::RegionOutOfBounds { .. } => "REGION_OUT_OF_BOUNDS",
            SoundError::TableMismatch { .. } => "TABLE_MISMATCH",
            SoundError::DuplicateName { .. } => "DUPLICATE_NAME",
            SoundError::UnknownDevice { .. } => "UNKNOWN_DEVICE",
            SoundError::UnresolvedLink { .. } => "UNRESOLVED_LINK",
            SoundError::InvalidSpec { .. } => "INVALID_SPEC",
            SoundError::NamespaceNotFound { .. } => "NAMESPACE_NOT_FOUND",
            SoundError::NamespaceConflict { .. } => "NAMESPACE_CONFLICT",
            SoundError::UnknownType { .. } => "UNKNOWN_TYPE",
            SoundError::MissingSchemaSource { .. } => "MISSING_SCHEMA_SOURCE",
            SoundError::TimeWindowOutOfRange { .. } => "TIME_WINDOW_OUT_OF_RANGE",
            SoundError::NonFiniteAudio => "NON_FINITE_AUDIO",
            SoundError::ChecksumMismatch { .. } => "CHECKSUM_MISMATCH",
            SoundError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            SoundError::FileReadError { .. } => "FILE_READ_ERROR",
            SoundError::FileWriteError { .. } => "FILE_WRITE_ERROR",
            SoundError::Io(_) => "IO_ERROR",
            SoundError::Wav(_) => "WAV_ERROR",
            SoundError::Json(_) => "JSON_ERROR",
            SoundError::Yaml(_) => "YAML_ERROR",
        }
    }

    /// Whether the error came from validating caller input, as opposed to
    /// the filesystem or a serializer.
    pub fn is_validation_error(&self) -> bool {
        !matches!(
            self,
            SoundError::FileReadError { .. }
                | SoundError::FileWriteError { .. }
                | SoundError::Io(_)
                | SoundError::Wav(_)
                | SoundError::Json(_)
                | SoundError::Yaml(_)
                | SoundError::NamespaceNotFound { .. }
                | SoundError::ChecksumMismatch { .. }
        )
    }
}
