//! Error types for RIS request assembly

use thiserror::Error;

use crate::khash::HashError;
use crate::validation::ValidationError;

/// Request assembly error
#[derive(Debug, Error)]
pub enum Error {
    /// Merchant ID missing or not numeric while a gift card needed hashing
    #[error("Invalid merchant ID: {0:?}")]
    InvalidMerchantId(String),

    /// Payment token hashing failed
    #[error("Payment token hashing failed: {0}")]
    Hash(#[from] HashError),

    /// Merchant acknowledgment was neither YES nor NO
    #[error("Unrecognized merchant acknowledgment: {0:?} (expected YES or NO)")]
    UnrecognizedMerchantAcknowledgment(String),

    /// Validation error kind name not one of LENGTH, REGEX, REQUIRED
    #[error("Expected value of the error type LENGTH, REGEX, REQUIRED, found [{0}]")]
    UnknownErrorKind(String),

    /// Field rejected by validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
