// src/utils/errors.rs
//! Error types for the reader engine

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors raised by the reader engine
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Session start or restore with a blank target name
    #[error("invalid session: {0}")]
    InvalidSession(String),
    
    /// Delivery transport error or non-2xx response
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),
    
    /// Configuration could not be loaded or is invalid
    #[error("configuration error: {0}")]
    ConfigError(String),
    
    /// Session store read/write failure
    #[error("storage failed: {0}")]
    StorageFailed(String),
    
    /// Raw event stream failure
    #[error("event source failed: {0}")]
    SourceFailed(String),
    
    /// Background worker could not be shut down cleanly
    #[error("shutdown failed: {0}")]
    ShutdownFailed(String),
}

impl From<::config::ConfigError> for ReaderError {
    fn from(err: ::config::ConfigError) -> Self {
        ReaderError::ConfigError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    
    #[test]
    fn test_display() {
        let err = ReaderError::InvalidSession("target name is blank".to_string());
        assert_eq!(err.to_string(), "invalid session: target name is blank");
        
        let err = ReaderError::DeliveryFailed("status 502".to_string());
        assert_eq!(err.to_string(), "delivery failed: status 502");
    }
}
