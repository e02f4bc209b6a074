//! Error types for container decoding

use thiserror::Error;

/// Result type for decode operations
pub type Tiles3dResult<T> = Result<T, DecodeError>;

/// Hard failure decoding one container. Fatal for that file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("bad magic: expected {expected:?}, found {found:?}")]
    BadMagic { expected: String, found: String },

    #[error("unsupported {format} version {version} (supported: {supported})")]
    UnsupportedVersion { format: String, version: u32, supported: u32 },

    #[error("truncated {what}: needed {needed} bytes, {available} available")]
    Truncated { what: String, needed: u64, available: u64 },

    #[error("{format} chunk lengths require {required} bytes but header declares {declared}")]
    LengthMismatch { format: String, declared: u64, required: u64 },

    #[error("container nesting exceeds {limit} levels")]
    TooDeep { limit: usize },

    #[error("invalid JSON in {chunk}: {message}")]
    InvalidJson { chunk: String, message: String },

    #[error("invalid UTF-8 in {chunk}")]
    InvalidUtf8 { chunk: String },

    #[error("GLB first chunk is {found:?}, expected \"JSON\"")]
    MissingJsonChunk { found: String },

    #[error("unrecognised container format (leading bytes {found:?})")]
    UnknownFormat { found: String },

    #[error("invalid header field {field} = {value}")]
    InvalidHeaderField { field: String, value: u32 },
}

impl DecodeError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadMagic { .. } => "BAD_MAGIC",
            Self::UnsupportedVersion { .. } => "UNSUPPORTED_VERSION",
            Self::Truncated { .. } => "TRUNCATED",
            Self::LengthMismatch { .. } => "LENGTH_MISMATCH",
            Self::TooDeep { .. } => "TOO_DEEP",
            Self::InvalidJson { .. } => "INVALID_JSON",
            Self::InvalidUtf8 { .. } => "INVALID_UTF8",
            Self::MissingJsonChunk { .. } => "MISSING_JSON_CHUNK",
            Self::UnknownFormat { .. } => "UNKNOWN_FORMAT",
            Self::InvalidHeaderField { .. } => "INVALID_HEADER_FIELD",
        }
    }

    pub(crate) fn truncated(what: impl Into<String>, needed: usize, available: usize) -> Self {
        Self::Truncated { what: what.into(), needed: needed as u64, available: available as u64 }
    }

    pub(crate) fn json(chunk: &str, err: serde_json::Error) -> Self {
        Self::InvalidJson { chunk: chunk.to_string(), message: err.to_string() }
    }
}

/// Printable form of up to four leading bytes
pub(crate) fn tag_string(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take(4)
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                (b as char).to_string()
            } else {
                format!("\\x{:02x}", b)
            }
        })
        .collect()
}
