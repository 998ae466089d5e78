//! Payment Request Contract Binding
//!
//! Calldata encoding, output decoding and event extraction for the deployed
//! payment request contract:
//!
//! ```text
//! event PaymentRequested(bytes32 indexed requestId, address indexed to, string asset, uint256 amount, string memo)
//! event PaymentCompleted(bytes32 indexed requestId, address indexed from, address indexed to)
//! function requestPayment(address to, string asset, uint256 amount, string memo) returns (bytes32)
//! function completePayment(bytes32 requestId)
//! function paymentRequests(bytes32 requestId) view returns (address to, string asset, uint256 amount, string memo, bool completed)
//! ```

use crate::error::{PlinksError, PlinksResult};
use crate::types::RequestId;
use ethers_core::abi::{self, ParamType, Token};
use ethers_core::types::{Address, Bytes, Log, H256, U256};
use ethers_core::utils::{id, keccak256};

pub const REQUEST_PAYMENT: &str = "requestPayment(address,string,uint256,string)";
pub const COMPLETE_PAYMENT: &str = "completePayment(bytes32)";
pub const PAYMENT_REQUESTS: &str = "paymentRequests(bytes32)";
pub const PAYMENT_REQUESTED_EVENT: &str = "PaymentRequested(bytes32,address,string,uint256,string)";
pub const PAYMENT_COMPLETED_EVENT: &str = "PaymentCompleted(bytes32,address,address)";

/// Topic0 of `PaymentRequested`
pub fn payment_requested_topic() -> H256 {
    H256::from(keccak256(PAYMENT_REQUESTED_EVENT))
}

/// Topic0 of `PaymentCompleted`
pub fn payment_completed_topic() -> H256 {
    H256::from(keccak256(PAYMENT_COMPLETED_EVENT))
}

/// A request as stored by the contract, amount still in the smallest unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRequest {
    pub to: Address,
    pub asset: String,
    pub amount: U256,
    pub memo: String,
    pub completed: bool,
}

impl StoredRequest {
    /// Unknown ids read back as a zeroed record; a stored request always has a recipient
    pub fn is_empty(&self) -> bool {
        self.to.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequestedEvent {
    pub request_id: RequestId,
    pub to: Address,
    pub asset: String,
    pub amount: U256,
    pub memo: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCompletedEvent {
    pub request_id: RequestId,
    pub from: Address,
    pub to: Address,
}

/// A decoded call to the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlinksCall {
    RequestPayment {
        to: Address,
        asset: String,
        amount: U256,
        memo: String,
    },
    CompletePayment(RequestId),
    PaymentRequests(RequestId),
}

impl PlinksCall {
    /// Decode calldata produced by `PlinksContract`
    pub fn decode(calldata: &[u8]) -> PlinksResult<Self> {
        if calldata.len() < 4 {
            return Err(PlinksError::contract_call("Calldata shorter than a selector"));
        }
        let (selector, args) = calldata.split_at(4);

        if selector == id(REQUEST_PAYMENT) {
            let tokens = abi::decode(&request_payment_inputs(), args)?;
            match tokens.as_slice() {
                [Token::Address(to), Token::String(asset), Token::Uint(amount), Token::String(memo)] => {
                    Ok(PlinksCall::RequestPayment {
                        to: *to,
                        asset: asset.clone(),
                        amount: *amount,
                        memo: memo.clone(),
                    })
                }
                _ => Err(unexpected(REQUEST_PAYMENT)),
            }
        } else if selector == id(COMPLETE_PAYMENT) {
            Ok(PlinksCall::CompletePayment(decode_request_id(args, COMPLETE_PAYMENT)?))
        } else if selector == id(PAYMENT_REQUESTS) {
            Ok(PlinksCall::PaymentRequests(decode_request_id(args, PAYMENT_REQUESTS)?))
        } else {
            Err(PlinksError::contract_call(format!(
                "Unknown selector 0x{}",
                hex::encode(selector)
            )))
        }
    }
}

/// Binding to one deployment of the payment request contract
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlinksContract {
    address: Address,
}

impl PlinksContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn request_payment_call(&self, to: Address, asset: &str, amount: U256, memo: &str) -> Bytes {
        with_selector(
            REQUEST_PAYMENT,
            &[
                Token::Address(to),
                Token::String(asset.to_string()),
                Token::Uint(amount),
                Token::String(memo.to_string()),
            ],
        )
    }

    pub fn complete_payment_call(&self, request_id: &RequestId) -> Bytes {
        with_selector(COMPLETE_PAYMENT, &[Token::FixedBytes(request_id.as_bytes().to_vec())])
    }

    pub fn payment_requests_call(&self, request_id: &RequestId) -> Bytes {
        with_selector(PAYMENT_REQUESTS, &[Token::FixedBytes(request_id.as_bytes().to_vec())])
    }

    /// Decode the return data of `paymentRequests`
    pub fn decode_payment_request(&self, output: &[u8]) -> PlinksResult<StoredRequest> {
        if output.is_empty() {
            return Err(PlinksError::contract_call("paymentRequests returned no data"));
        }

        let tokens = abi::decode(&stored_request_outputs(), output)?;
        match tokens.as_slice() {
            [Token::Address(to), Token::String(asset), Token::Uint(amount), Token::String(memo), Token::Bool(completed)] => {
                Ok(StoredRequest {
                    to: *to,
                    asset: asset.clone(),
                    amount: *amount,
                    memo: memo.clone(),
                    completed: *completed,
                })
            }
            _ => Err(unexpected(PAYMENT_REQUESTS)),
        }
    }

    /// First `PaymentRequested` emitted by this contract in `logs`
    pub fn find_payment_requested(&self, logs: &[Log]) -> Option<PaymentRequestedEvent> {
        let topic = payment_requested_topic();
        logs.iter()
            .filter(|log| log.address == self.address && log.topics.first() == Some(&topic))
            .find_map(|log| decode_payment_requested(log).ok())
    }

    /// First `PaymentCompleted` emitted by this contract in `logs`
    pub fn find_payment_completed(&self, logs: &[Log]) -> Option<PaymentCompletedEvent> {
        let topic = payment_completed_topic();
        logs.iter()
            .filter(|log| log.address == self.address && log.topics.first() == Some(&topic))
            .find_map(|log| decode_payment_completed(log).ok())
    }
}

fn request_payment_inputs() -> Vec<ParamType> {
    vec![
        ParamType::Address,
        ParamType::String,
        ParamType::Uint(256),
        ParamType::String,
    ]
}

fn stored_request_outputs() -> Vec<ParamType> {
    vec![
        ParamType::Address,
        ParamType::String,
        ParamType::Uint(256),
        ParamType::String,
        ParamType::Bool,
    ]
}

fn with_selector(signature: &str, args: &[Token]) -> Bytes {
    let mut calldata = id(signature).to_vec();
    calldata.extend_from_slice(&abi::encode(args));
    Bytes::from(calldata)
}

fn decode_request_id(args: &[u8], signature: &str) -> PlinksResult<RequestId> {
    let tokens = abi::decode(&[ParamType::FixedBytes(32)], args)?;
    match tokens.as_slice() {
        [Token::FixedBytes(bytes)] if bytes.len() == 32 => Ok(RequestId(H256::from_slice(bytes))),
        _ => Err(unexpected(signature)),
    }
}

fn topic_address(topic: &H256) -> Address {
    Address::from_slice(&topic.as_bytes()[12..])
}

fn decode_payment_requested(log: &Log) -> PlinksResult<PaymentRequestedEvent> {
    let (request_id, to) = match log.topics.as_slice() {
        [_, id, to, ..] => (RequestId(*id), topic_address(to)),
        _ => return Err(unexpected(PAYMENT_REQUESTED_EVENT)),
    };

    let tokens = abi::decode(
        &[ParamType::String, ParamType::Uint(256), ParamType::String],
        &log.data,
    )?;
    match tokens.as_slice() {
        [Token::String(asset), Token::Uint(amount), Token::String(memo)] => Ok(PaymentRequestedEvent {
            request_id,
            to,
            asset: asset.clone(),
            amount: *amount,
            memo: memo.clone(),
        }),
        _ => Err(unexpected(PAYMENT_REQUESTED_EVENT)),
    }
}

fn decode_payment_completed(log: &Log) -> PlinksResult<PaymentCompletedEvent> {
    match log.topics.as_slice() {
        [_, id, from, to, ..] => Ok(PaymentCompletedEvent {
            request_id: RequestId(*id),
            from: topic_address(from),
            to: topic_address(to),
        }),
        _ => Err(unexpected(PAYMENT_COMPLETED_EVENT)),
    }
}

fn unexpected(signature: &str) -> PlinksError {
    PlinksError::contract_call(format!("Unexpected ABI layout for {}", signature))
}
