use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, RiderError>;

/// The two error kinds callers need to tell apart.
///
/// Validation failures mean the input was structurally wrong and the
/// repository was left untouched; everything else is unexpected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unexpected,
}

/// Machine-readable reason attached to a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationCode {
    /// The payload parsed but its top level is not a JSON object.
    NotAnObject,
    /// The dictionary payload holds no entries at all.
    EmptyDictionary,
    /// A record that must be an object is some other JSON value.
    NonObjectRecord,
    /// The payload text is not valid JSON.
    MalformedJson,
    /// The payload is neither a dictionary nor an array of records.
    UnsupportedShape,
}

impl ValidationCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ValidationCode::NotAnObject => "not_an_object",
            ValidationCode::EmptyDictionary => "empty_dictionary",
            ValidationCode::NonObjectRecord => "non_object_record",
            ValidationCode::MalformedJson => "malformed_json",
            ValidationCode::UnsupportedShape => "unsupported_shape",
        }
    }
}

impl fmt::Display for ValidationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure raised by a transport collaborator while retrieving payload text.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("payload source not found: {0}")]
    NotFound(String),

    #[error("access denied to payload source: {0}")]
    AccessDenied(String),

    #[error("timed out fetching payload: {0}")]
    Timeout(String),

    #[error("malformed payload response: {0}")]
    MalformedResponse(String),
}

/// Error type covering the different failure cases that can occur when the
/// tool ingests, normalizes, or synchronizes rider data.
#[derive(Debug, Error)]
pub enum RiderError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when the input payload, a raw record, or a row is structurally wrong.
    #[error("validation failed ({code}): {message}")]
    Validation {
        code: ValidationCode,
        message: String,
    },

    /// Raised by the transport collaborator.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Raised when a destination write or read fails.
    #[error("destination error: {0}")]
    Destination(String),

    /// Raised when the TOML configuration file cannot be parsed.
    #[error("invalid configuration file: {0}")]
    ConfigFile(#[from] toml::de::Error),

    /// Raised when configuration values are inconsistent.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl RiderError {
    pub fn validation(code: ValidationCode, message: impl Into<String>) -> Self {
        RiderError::Validation {
            code,
            message: message.into(),
        }
    }

    /// Classifies the error into the two-kind taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RiderError::Validation { .. } | RiderError::MissingInput(_) => ErrorKind::Validation,
            RiderError::Transport(
                TransportError::NotFound(_)
                | TransportError::AccessDenied(_)
                | TransportError::MalformedResponse(_),
            ) => ErrorKind::Validation,
            _ => ErrorKind::Unexpected,
        }
    }

    /// Returns the validation code when this is a validation failure.
    pub fn validation_code(&self) -> Option<ValidationCode> {
        match self {
            RiderError::Validation { code, .. } => Some(*code),
            _ => None,
        }
    }
}
