//! Error types for the ingestion server.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur in the ingestion server and demo client.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the specified address.
    #[error("failed to bind to {0}: {1}")]
    BindFailed(SocketAddr, std::io::Error),

    /// Failed to connect to a server.
    #[error("failed to connect to {0}: {1}")]
    ConnectFailed(String, std::io::Error),

    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Failed to serialize a report or configuration.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_bind_failed_error_display() {
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 9000);
        let io_err = std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use");
        let err = ServerError::BindFailed(addr, io_err);

        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:9000"));
        assert!(msg.contains("address in use"));
    }

    #[test]
    fn test_connect_failed_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = ServerError::ConnectFailed("localhost:9000".to_string(), io_err);
        assert_eq!(err.to_string(), "failed to connect to localhost:9000: refused");
    }

    #[test]
    fn test_config_error_display() {
        let err = ServerError::Config("funnel_capacity must be greater than 0".to_string());
        assert!(err.to_string().contains("funnel_capacity"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<String>("invalid").expect_err("not json");
        let err: ServerError = json_err.into();
        assert!(matches!(err, ServerError::Serialization(_)));
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe");
        let err: ServerError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }
}
