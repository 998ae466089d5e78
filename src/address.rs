//! EVM Address Handling
//!
//! Parsing, EIP-55 checksum validation and display helpers for the
//! recipient, account and contract addresses the app passes around.

use crate::error::{PlinksError, PlinksResult};
use ethers_core::types::Address;
use tiny_keccak::{Hasher, Keccak};

/// Detailed address validation result
#[derive(Debug, Clone)]
pub struct AddressValidation {
    pub is_valid: bool,
    /// EIP-55 form of the address when it parsed
    pub normalized: Option<String>,
    pub checksum_valid: bool,
    pub warnings: Vec<String>,
}

impl AddressValidation {
    fn invalid(reason: &str) -> Self {
        Self {
            is_valid: false,
            normalized: None,
            checksum_valid: false,
            warnings: vec![reason.to_string()],
        }
    }
}

/// Validate an EVM address string
///
/// Mixed-case input must carry a correct EIP-55 checksum; all-lowercase or
/// all-uppercase input is accepted with a warning.
pub fn validate_address(address: &str) -> AddressValidation {
    let trimmed = address.trim();

    let hex_part = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(h) => h,
        None => return AddressValidation::invalid("Invalid format: missing 0x prefix"),
    };

    if hex_part.len() != 40 {
        return AddressValidation::invalid(&format!(
            "Invalid length: expected 40 hex characters, got {}",
            hex_part.len()
        ));
    }

    if !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return AddressValidation::invalid("Invalid hex characters");
    }

    let bytes = match hex::decode(hex_part.to_lowercase()) {
        Ok(b) if b.len() == 20 => b,
        _ => return AddressValidation::invalid("Invalid address bytes"),
    };

    let checksummed = eip55_checksum(&bytes);
    let mut warnings = Vec::new();

    let has_mixed_case = hex_part.chars().any(|c| c.is_ascii_uppercase())
        && hex_part.chars().any(|c| c.is_ascii_lowercase());
    let checksum_valid = if has_mixed_case {
        checksummed[2..] == *hex_part
    } else {
        warnings.push("Address has no EIP-55 checksum - using normalized form".to_string());
        true
    };

    if !checksum_valid {
        warnings.push("Invalid EIP-55 checksum - address may be corrupted".to_string());
    }

    if bytes.iter().all(|&b| b == 0) {
        warnings.push("Zero address".to_string());
    }

    AddressValidation {
        is_valid: checksum_valid,
        normalized: Some(checksummed),
        checksum_valid,
        warnings,
    }
}

/// Parse an address string, rejecting bad length, bad hex and bad checksums
pub fn parse_address(address: &str) -> PlinksResult<Address> {
    let validation = validate_address(address);
    if !validation.is_valid {
        let reason = validation.warnings.join("; ");
        return Err(PlinksError::validation(format!("Invalid address '{}'", address.trim()))
            .with_details(reason));
    }

    let hex_part = &address.trim()[2..];
    let bytes = hex::decode(hex_part.to_lowercase())?;
    Ok(Address::from_slice(&bytes))
}

/// EIP-55 representation of an address
pub fn to_checksum_address(address: &Address) -> String {
    eip55_checksum(address.as_bytes())
}

/// Short display form, `0x1234...abcd`
pub fn truncate_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn eip55_checksum(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut result = String::from("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };

        if ch.is_ascii_digit() || nibble < 8 {
            result.push(ch);
        } else {
            result.push(ch.to_ascii_uppercase());
        }
    }

    result
}

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}
