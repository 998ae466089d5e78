//! Unified error types for Plinks
//!
//! Gateway, codec and session failures all flow through `PlinksError` so the
//! view controllers can turn any of them into a single user-visible message.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all Plinks operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlinksError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl PlinksError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn wallet_unavailable(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::WalletUnavailable, msg)
    }

    pub fn authorization_denied(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthorizationDenied, msg)
    }

    pub fn contract_call(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ContractCallError, msg)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, msg)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(ErrorCode::MissingField, format!("Missing required field: {}", field))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, msg)
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkError, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, msg)
    }

    pub fn parse_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ParseError, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// True for the codec failures (`ValidationError` and its `MissingField` refinement)
    pub fn is_validation(&self) -> bool {
        matches!(self.code, ErrorCode::ValidationError | ErrorCode::MissingField)
    }
}

impl fmt::Display for PlinksError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for PlinksError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Wallet errors
    WalletUnavailable,
    AuthorizationDenied,

    // Remote contract errors
    ContractCallError,
    NotFound,

    // Link / input errors
    ValidationError,
    MissingField,

    // Transport
    NetworkError,

    // Startup
    ConfigError,

    // Parse errors
    ParseError,

    // Internal
    Internal,
}

/// Result type alias for Plinks operations
pub type PlinksResult<T> = Result<T, PlinksError>;

// Conversions from common error types

impl From<serde_json::Error> for PlinksError {
    fn from(e: serde_json::Error) -> Self {
        PlinksError::new(ErrorCode::ParseError, e.to_string())
    }
}

impl From<hex::FromHexError> for PlinksError {
    fn from(e: hex::FromHexError) -> Self {
        PlinksError::new(ErrorCode::ParseError, format!("Hex error: {}", e))
    }
}

impl From<url::ParseError> for PlinksError {
    fn from(e: url::ParseError) -> Self {
        PlinksError::new(ErrorCode::ValidationError, format!("Invalid URL: {}", e))
    }
}

impl From<std::io::Error> for PlinksError {
    fn from(e: std::io::Error) -> Self {
        PlinksError::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<reqwest::Error> for PlinksError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            PlinksError::new(ErrorCode::NetworkError, "Request timed out")
        } else if e.is_connect() {
            PlinksError::new(ErrorCode::NetworkError, "Connection failed")
        } else {
            PlinksError::new(ErrorCode::NetworkError, e.to_string())
        }
    }
}

impl From<ethers_core::abi::Error> for PlinksError {
    fn from(e: ethers_core::abi::Error) -> Self {
        PlinksError::new(ErrorCode::ContractCallError, format!("ABI error: {}", e))
    }
}

impl From<ethers_signers::WalletError> for PlinksError {
    fn from(e: ethers_signers::WalletError) -> Self {
        PlinksError::new(ErrorCode::AuthorizationDenied, format!("Signing failed: {}", e))
    }
}
