//! Error types for the ingestion engine.

use thiserror::Error;
use tokio_util::codec::AnyDelimiterCodecError;

/// Reasons a raw line is rejected by the parser.
///
/// Both variants are recovered locally: the line is dropped and ingestion
/// continues with the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line has fewer than four whitespace-delimited fields.
    #[error("expected at least 4 fields, found {found}")]
    MalformedFields {
        /// Number of fields actually present.
        found: usize,
    },

    /// The date and time fields do not match `YYYY-MM-DD HH:MM:SS`.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Fault raised by a connection's line source.
#[derive(Debug, Error)]
pub enum LineError {
    /// The underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line exceeded the configured maximum length.
    #[error("line exceeds maximum length of {max} bytes")]
    LineTooLong {
        /// Configured limit in bytes.
        max: usize,
    },
}

impl LineError {
    pub(crate) fn from_codec(err: AnyDelimiterCodecError, max: usize) -> Self {
        match err {
            AnyDelimiterCodecError::MaxChunkLengthExceeded => Self::LineTooLong { max },
            AnyDelimiterCodecError::Io(e) => Self::Io(e),
        }
    }
}

/// Errors surfaced while submitting records for aggregation.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The aggregation worker has shut down and accepts no more records.
    #[error("aggregation funnel closed")]
    Closed,
}

/// A name that does not map to any known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownName {
    /// What was being parsed, e.g. "severity".
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Result type alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display_messages() {
        let err = ParseError::MalformedFields { found: 3 };
        assert_eq!(err.to_string(), "expected at least 4 fields, found 3");

        let err = ParseError::InvalidTimestamp("2026-13-40 99:99:99".to_string());
        assert_eq!(err.to_string(), "invalid timestamp: 2026-13-40 99:99:99");
    }

    #[test]
    fn ingest_error_display_messages() {
        assert_eq!(IngestError::Closed.to_string(), "aggregation funnel closed");

        let err = UnknownName {
            kind: "severity",
            value: "FATAL".to_string(),
        };
        assert_eq!(err.to_string(), "unknown severity: FATAL");
    }

    #[test]
    fn line_error_from_codec() {
        let err = LineError::from_codec(AnyDelimiterCodecError::MaxChunkLengthExceeded, 16);
        assert!(matches!(err, LineError::LineTooLong { max: 16 }));
        assert_eq!(err.to_string(), "line exceeds maximum length of 16 bytes");

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = LineError::from_codec(AnyDelimiterCodecError::Io(io), 16);
        assert!(err.to_string().contains("reset by peer"));
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParseError>();
        assert_send_sync::<LineError>();
        assert_send_sync::<IngestError>();
    }
}
