//! Payment Links
//!
//! Serializes payment requests into shareable URLs on the application's own
//! origin and parses them back.
//!
//! Format: `<origin>/pay?recipient=0x...&amount=2.5&asset=DOT&memo=rent[&requestId=0x...]`
//! Status: `<origin>/status?requestId=0x...`

use crate::error::{ErrorCode, PlinksError, PlinksResult};
use crate::types::{Asset, PaymentRequest, RequestId};
use thiserror::Error;
use url::Url;

pub const PAY_PATH: &str = "/pay";
pub const STATUS_PATH: &str = "/status";

const P_RECIPIENT: &str = "recipient";
const P_AMOUNT: &str = "amount";
const P_ASSET: &str = "asset";
const P_MEMO: &str = "memo";
const P_REQUEST_ID: &str = "requestId";

/// Link decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    #[error("Missing required parameter: {0}")]
    MissingField(&'static str),

    #[error("Unsupported asset: {0}")]
    InvalidAsset(String),

    #[error("Malformed request id: {0}")]
    InvalidRequestId(String),

    #[error("Invalid link: {0}")]
    InvalidUrl(String),
}

impl From<LinkError> for PlinksError {
    fn from(e: LinkError) -> Self {
        let code = match e {
            LinkError::MissingField(_) => ErrorCode::MissingField,
            _ => ErrorCode::ValidationError,
        };
        PlinksError::new(code, e.to_string())
    }
}

/// Builds and parses links for one application origin
#[derive(Debug, Clone)]
pub struct LinkCodec {
    origin: Url,
}

impl LinkCodec {
    pub fn new(origin: &str) -> PlinksResult<Self> {
        let origin = Url::parse(origin)?;
        if origin.cannot_be_a_base() {
            return Err(PlinksError::config(format!("Origin cannot be a base URL: {}", origin)));
        }
        Ok(Self { origin })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Encode a payment request as a `/pay` link
    pub fn encode(&self, request: &PaymentRequest) -> PlinksResult<String> {
        request.ensure_complete()?;

        let mut url = self.origin.join(PAY_PATH)?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair(P_RECIPIENT, &request.recipient)
                .append_pair(P_AMOUNT, &request.amount)
                .append_pair(P_ASSET, request.asset.symbol())
                .append_pair(P_MEMO, &request.memo);

            if let Some(id) = request.request_id {
                query.append_pair(P_REQUEST_ID, &id.to_string());
            }
        }

        Ok(url.to_string())
    }

    /// Decode a `/pay` link; relative links resolve against this origin
    pub fn decode(&self, link: &str) -> Result<PaymentRequest, LinkError> {
        let url = self.resolve(link)?;

        let recipient = required(&url, P_RECIPIENT)?;
        let amount = required(&url, P_AMOUNT)?;
        let asset_raw = required(&url, P_ASSET)?;
        let asset = asset_raw
            .parse::<Asset>()
            .map_err(|_| LinkError::InvalidAsset(asset_raw.clone()))?;

        let memo = param(&url, P_MEMO).unwrap_or_default();
        let request_id = param(&url, P_REQUEST_ID)
            .map(|raw| raw.parse::<RequestId>().map_err(|_| LinkError::InvalidRequestId(raw)))
            .transpose()?;

        Ok(PaymentRequest {
            recipient,
            amount,
            asset,
            memo,
            request_id,
        })
    }

    /// `/status` link for a request id
    pub fn status_link(&self, id: &RequestId) -> PlinksResult<String> {
        let mut url = self.origin.join(STATUS_PATH)?;
        url.query_pairs_mut().append_pair(P_REQUEST_ID, &id.to_string());
        Ok(url.to_string())
    }

    /// Request id carried by a `/status` link, if any
    pub fn decode_status(&self, link: &str) -> Result<Option<RequestId>, LinkError> {
        let url = self.resolve(link)?;
        param(&url, P_REQUEST_ID)
            .map(|raw| raw.parse::<RequestId>().map_err(|_| LinkError::InvalidRequestId(raw)))
            .transpose()
    }

    fn resolve(&self, link: &str) -> Result<Url, LinkError> {
        match Url::parse(link) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .origin
                .join(link)
                .map_err(|e| LinkError::InvalidUrl(e.to_string())),
            Err(e) => Err(LinkError::InvalidUrl(e.to_string())),
        }
    }
}

/// First non-empty value of a query parameter
fn param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, v)| k == key && !v.is_empty())
        .map(|(_, v)| v.into_owned())
}

fn required(url: &Url, key: &'static str) -> Result<String, LinkError> {
    param(url, key).ok_or(LinkError::MissingField(key))
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Encode a payment link for `origin`
pub fn encode(origin: &str, request: &PaymentRequest) -> PlinksResult<String> {
    LinkCodec::new(origin)?.encode(request)
}

/// Decode a payment link for `origin`
pub fn decode(origin: &str, link: &str) -> PlinksResult<PaymentRequest> {
    Ok(LinkCodec::new(origin)?.decode(link)?)
}
