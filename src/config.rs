//! Application Configuration
//!
//! Endpoint, origin and contract settings, loaded from an optional JSON file
//! and validated once at startup. The contract address is configuration, not
//! a constant, and is checked for the exact `0x` + 40 hex digit shape.

use crate::address::validate_address;
use crate::error::{PlinksError, PlinksResult};
use ethers_core::types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Westend Asset Hub EVM endpoint
pub const DEFAULT_RPC_URL: &str = "https://westend-asset-hub-eth-rpc.polkadot.io";
pub const DEFAULT_CHAIN_ID: u64 = 420_420_421;
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x1CdaB5E4Ed70c52B73080CDA83c943790f2eDB95";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Origin the generated `/pay` and `/status` links point at
    pub origin: String,
    pub rpc_url: String,
    pub contract_address: String,
    pub chain_id: u64,
    /// Confirmations to wait for before a call counts as confirmed
    pub confirmations: u64,
    pub poll_interval_ms: u64,
    /// Per-request HTTP timeout of the RPC transport
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            confirmations: 1,
            poll_interval_ms: 2_000,
            request_timeout_secs: 30,
        }
    }
}

/// Outcome of `AppConfig::validate`
#[derive(Debug, Clone)]
pub struct ConfigValidation {
    pub is_valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

impl AppConfig {
    /// Load from a JSON file; missing keys fall back to defaults
    pub fn from_file(path: &Path) -> PlinksResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PlinksError::config(format!("Cannot read config file {}", path.display()))
                .with_details(e.to_string())
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> PlinksResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| PlinksError::config("Malformed config").with_details(e.to_string()))
    }

    /// Load (or default) and validate; startup fails on any error
    pub fn load(path: Option<&Path>) -> PlinksResult<Self> {
        let config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.ensure_valid()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigValidation {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        let contract = validate_address(&self.contract_address);
        if !contract.is_valid {
            errors.push(format!(
                "contract_address '{}': {}",
                self.contract_address,
                contract.warnings.join("; ")
            ));
        } else if self.contract().map(|a| a.is_zero()).unwrap_or(false) {
            errors.push("contract_address is the zero address".to_string());
        }

        match Url::parse(&self.origin) {
            Ok(origin) => {
                if origin.scheme() != "http" && origin.scheme() != "https" {
                    errors.push(format!("origin must be http or https, got {}", origin.scheme()));
                }
                if origin.path() != "/" || origin.query().is_some() || origin.fragment().is_some() {
                    errors.push("origin must not carry a path, query or fragment".to_string());
                }
            }
            Err(e) => errors.push(format!("origin is not a valid URL: {}", e)),
        }

        match Url::parse(&self.rpc_url) {
            Ok(rpc) => validate_rpc_scheme(&rpc, &mut warnings, &mut errors),
            Err(e) => errors.push(format!("rpc_url is not a valid URL: {}", e)),
        }

        if self.confirmations == 0 {
            errors.push("confirmations must be at least 1".to_string());
        }
        if self.poll_interval_ms == 0 {
            errors.push("poll_interval_ms must be positive".to_string());
        }
        if self.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be positive".to_string());
        }

        ConfigValidation {
            is_valid: errors.is_empty(),
            warnings,
            errors,
        }
    }

    /// Validate, logging warnings and failing on errors
    pub fn ensure_valid(&self) -> PlinksResult<()> {
        let validation = self.validate();
        for warning in &validation.warnings {
            crate::log_warn!("config", "configuration warning", detail = warning);
        }
        if validation.is_valid {
            Ok(())
        } else {
            Err(PlinksError::config("Invalid configuration").with_details(validation.errors.join("; ")))
        }
    }

    pub fn contract(&self) -> PlinksResult<Address> {
        crate::address::parse_address(&self.contract_address)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// HTTPS/WSS everywhere; plain HTTP/WS only for local development hosts
fn validate_rpc_scheme(url: &Url, warnings: &mut Vec<String>, errors: &mut Vec<String>) {
    let local = url
        .host_str()
        .map(|h| h == "localhost" || h == "127.0.0.1" || h.starts_with("192.168.") || h.starts_with("10."))
        .unwrap_or(false);

    match url.scheme() {
        "https" | "wss" => {}
        "http" | "ws" if local => {
            warnings.push("Unencrypted RPC endpoint allowed for local development only".to_string());
        }
        "http" | "ws" => errors.push("rpc_url must use https for remote endpoints".to_string()),
        other => errors.push(format!("Unsupported rpc_url scheme: {}", other)),
    }

    if !url.username().is_empty() || url.password().is_some() {
        warnings.push("Credentials in rpc_url - they will appear in error messages".to_string());
    }
}
