//! Shared types for Plinks
//!
//! These types are used across modules and serialize to the JSON the binary
//! prints.

use crate::error::{PlinksError, PlinksResult};
use ethers_core::types::{Address, H256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Asset
// =============================================================================

/// Assets a payment link can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    #[serde(rename = "DOT")]
    Dot,
    #[serde(rename = "WLD")]
    Wld,
}

impl Asset {
    /// Ticker as it appears in links and contract calls
    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Dot => "DOT",
            Asset::Wld => "WLD",
        }
    }
}

impl Default for Asset {
    fn default() -> Self {
        Asset::Dot
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Asset {
    type Err = PlinksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DOT" => Ok(Asset::Dot),
            "WLD" => Ok(Asset::Wld),
            _ => Err(PlinksError::validation(format!("Unsupported asset: {}", s))),
        }
    }
}

// =============================================================================
// Request identifier
// =============================================================================

/// Identifier the contract assigns to a payment request (a `bytes32`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RequestId(pub H256);

impl RequestId {
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_fixed_bytes()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

impl FromStr for RequestId {
    type Err = PlinksError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| PlinksError::validation("Request ID must start with 0x"))?;

        if hex_part.len() != 64 {
            return Err(PlinksError::validation(format!(
                "Request ID must be 32 bytes, got {} hex characters",
                hex_part.len()
            )));
        }

        let bytes = hex::decode(hex_part)?;
        Ok(RequestId(H256::from_slice(&bytes)))
    }
}

impl TryFrom<String> for RequestId {
    type Error = PlinksError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RequestId> for String {
    fn from(id: RequestId) -> Self {
        id.to_string()
    }
}

impl From<H256> for RequestId {
    fn from(hash: H256) -> Self {
        RequestId(hash)
    }
}

// =============================================================================
// Payment request
// =============================================================================

/// A payment request as carried by a payment link
///
/// `memo` is empty when the requester left it blank. `request_id` is only
/// present when the on-chain create call was confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub recipient: String,
    pub amount: String,
    pub asset: Asset,
    #[serde(default)]
    pub memo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
}

impl PaymentRequest {
    pub fn new(
        recipient: impl Into<String>,
        amount: impl Into<String>,
        asset: Asset,
        memo: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            amount: amount.into(),
            asset,
            memo: memo.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Check the required fields are present
    pub fn ensure_complete(&self) -> PlinksResult<()> {
        if self.recipient.is_empty() {
            return Err(PlinksError::missing_field("recipient"));
        }
        if self.amount.is_empty() {
            return Err(PlinksError::missing_field("amount"));
        }
        Ok(())
    }

    /// Full form validation: recipient is an EVM address, amount a positive decimal
    pub fn validate(&self) -> PlinksResult<()> {
        self.ensure_complete()?;
        crate::address::parse_address(&self.recipient)?;

        let raw = crate::units::parse_units(&self.amount)?;
        if raw.is_zero() {
            return Err(PlinksError::validation("Amount must be positive"));
        }
        Ok(())
    }
}

// =============================================================================
// Remote record
// =============================================================================

/// Authoritative record held by the payment request contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePaymentRecord {
    pub to: Address,
    pub asset: String,
    /// Decimal display form of the on-chain integer amount
    pub amount: String,
    pub memo: String,
    pub completed: bool,
}

impl RemotePaymentRecord {
    pub fn status(&self) -> RequestStatus {
        if self.completed {
            RequestStatus::Completed
        } else {
            RequestStatus::Pending
        }
    }
}

/// Lifecycle of a payment request, as tracked by the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Completed,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "Pending"),
            RequestStatus::Completed => write!(f, "Completed"),
        }
    }
}

// =============================================================================
// Best-effort outcome
// =============================================================================

/// Result of a step whose failure must not fail the surrounding action
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum Outcome<T> {
    Ok(T),
    Degraded(String),
}

impl<T> Outcome<T> {
    /// Wrap a fallible step, logging the degraded path
    pub fn from_result(module: &'static str, step: &'static str, result: PlinksResult<T>) -> Self {
        match result {
            Ok(value) => Outcome::Ok(value),
            Err(e) => {
                crate::log_warn!(module, "best-effort step failed, continuing", step = step, error = e);
                Outcome::Degraded(e.to_string())
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded(_))
    }

    pub fn degraded_reason(&self) -> Option<&str> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Degraded(reason) => Some(reason),
        }
    }
}
