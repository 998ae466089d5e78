//! In-memory chain and wallet doubles simulating the payment request contract

#![allow(dead_code)]

use async_trait::async_trait;
use ethers_core::abi::{self, Token};
use ethers_core::types::{
    Address, Bytes, Log, NameOrAddress, TransactionReceipt, TransactionRequest, H256, U256, U64,
};
use ethers_core::utils::keccak256;
use plinks::contract::{payment_completed_topic, payment_requested_topic, PlinksCall, StoredRequest};
use plinks::{ChainProvider, PlinksError, PlinksResult, WalletProvider};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

pub const CONTRACT: [u8; 20] = [0xc0; 20];
pub const ORIGIN: &str = "https://plinks.app";

pub fn contract_address() -> Address {
    Address::from(CONTRACT)
}

pub fn alice() -> Address {
    "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap()
}

pub fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

/// Failure switches for the simulated network
#[derive(Debug, Default, Clone)]
pub struct Faults {
    pub reject_signing: bool,
    pub revert_request: bool,
    pub revert_completion: bool,
    pub omit_event: bool,
    pub fail_transfer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: Address,
    pub to: Address,
    pub value: U256,
}

#[derive(Default)]
struct LedgerState {
    faults: Faults,
    requests: HashMap<H256, StoredRequest>,
    receipts: HashMap<H256, TransactionReceipt>,
    transfers: Vec<Transfer>,
    network_calls: usize,
    nonce: u64,
}

pub struct MockLedger {
    contract: Address,
    state: Mutex<LedgerState>,
}

impl MockLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            contract: contract_address(),
            state: Mutex::new(LedgerState::default()),
        })
    }

    pub fn set_faults(&self, faults: Faults) {
        self.state.lock().unwrap().faults = faults;
    }

    pub fn network_calls(&self) -> usize {
        self.state.lock().unwrap().network_calls
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.state.lock().unwrap().transfers.clone()
    }

    pub fn stored(&self, id: H256) -> Option<StoredRequest> {
        self.state.lock().unwrap().requests.get(&id).cloned()
    }

    fn submit(&self, from: Address, tx: TransactionRequest) -> PlinksResult<H256> {
        let mut state = self.state.lock().unwrap();
        state.network_calls += 1;

        if state.faults.reject_signing {
            return Err(PlinksError::authorization_denied("User rejected the request"));
        }

        state.nonce += 1;
        let tx_hash = H256::from(keccak256(state.nonce.to_be_bytes()));

        let to = match tx.to {
            Some(NameOrAddress::Address(to)) => to,
            _ => return Err(PlinksError::validation("transaction without recipient")),
        };

        let (success, logs) = if to == self.contract {
            let data = tx.data.clone().unwrap_or_default();
            self.execute(&mut state, from, &data, tx_hash)?
        } else {
            if state.faults.fail_transfer {
                return Err(PlinksError::network("insufficient funds for transfer"));
            }
            state.transfers.push(Transfer {
                from,
                to,
                value: tx.value.unwrap_or_default(),
            });
            (true, Vec::new())
        };

        let receipt = TransactionReceipt {
            transaction_hash: tx_hash,
            block_number: Some(U64::from(state.nonce)),
            from,
            to: Some(to),
            status: Some(U64::from(success as u64)),
            logs,
            ..Default::default()
        };
        state.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }

    fn execute(
        &self,
        state: &mut LedgerState,
        from: Address,
        data: &[u8],
        tx_hash: H256,
    ) -> PlinksResult<(bool, Vec<Log>)> {
        match PlinksCall::decode(data)? {
            PlinksCall::RequestPayment { to, asset, amount, memo } => {
                if state.faults.revert_request {
                    return Ok((false, Vec::new()));
                }
                let id = H256::from(keccak256([from.as_bytes(), tx_hash.as_bytes()].concat()));
                state.requests.insert(
                    id,
                    StoredRequest {
                        to,
                        asset: asset.clone(),
                        amount,
                        memo: memo.clone(),
                        completed: false,
                    },
                );
                if state.faults.omit_event {
                    return Ok((true, Vec::new()));
                }
                let log = Log {
                    address: self.contract,
                    topics: vec![payment_requested_topic(), id, address_topic(to)],
                    data: Bytes::from(abi::encode(&[
                        Token::String(asset),
                        Token::Uint(amount),
                        Token::String(memo),
                    ])),
                    ..Default::default()
                };
                Ok((true, vec![log]))
            }
            PlinksCall::CompletePayment(id) => {
                if state.faults.revert_completion {
                    return Ok((false, Vec::new()));
                }
                match state.requests.get_mut(&id.0) {
                    Some(request) if !request.completed => {
                        request.completed = true;
                        if state.faults.omit_event {
                            return Ok((true, Vec::new()));
                        }
                        let log = Log {
                            address: self.contract,
                            topics: vec![payment_completed_topic(), id.0, address_topic(from), address_topic(request.to)],
                            ..Default::default()
                        };
                        Ok((true, vec![log]))
                    }
                    _ => Ok((false, Vec::new())),
                }
            }
            PlinksCall::PaymentRequests(_) => Ok((true, Vec::new())),
        }
    }
}

fn address_topic(address: Address) -> H256 {
    let mut topic = [0u8; 32];
    topic[12..].copy_from_slice(address.as_bytes());
    H256::from(topic)
}

#[async_trait]
impl ChainProvider for MockLedger {
    async fn chain_id(&self) -> PlinksResult<u64> {
        Ok(420_420_421)
    }

    async fn call(&self, to: Address, data: Bytes) -> PlinksResult<Bytes> {
        let mut state = self.state.lock().unwrap();
        state.network_calls += 1;

        if to != self.contract {
            return Ok(Bytes::default());
        }
        match PlinksCall::decode(&data)? {
            PlinksCall::PaymentRequests(id) => {
                let stored = state.requests.get(&id.0).cloned().unwrap_or(StoredRequest {
                    to: Address::zero(),
                    asset: String::new(),
                    amount: U256::zero(),
                    memo: String::new(),
                    completed: false,
                });
                Ok(Bytes::from(abi::encode(&[
                    Token::Address(stored.to),
                    Token::String(stored.asset),
                    Token::Uint(stored.amount),
                    Token::String(stored.memo),
                    Token::Bool(stored.completed),
                ])))
            }
            _ => Err(PlinksError::contract_call("not a view function")),
        }
    }

    async fn wait_for_receipt(&self, tx_hash: H256, _confirmations: u64) -> PlinksResult<TransactionReceipt> {
        let mut state = self.state.lock().unwrap();
        state.network_calls += 1;
        state
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| PlinksError::network("unknown transaction"))
    }
}

/// Wallet over `MockLedger` with a fixed account list
pub struct MockWallet {
    ledger: Arc<MockLedger>,
    accounts: Vec<Address>,
    authorized: Mutex<bool>,
    events: broadcast::Sender<Vec<Address>>,
}

impl MockWallet {
    pub fn new(ledger: Arc<MockLedger>, accounts: Vec<Address>) -> Arc<Self> {
        Arc::new(Self {
            ledger,
            accounts,
            authorized: Mutex::new(false),
            events: broadcast::channel(8).0,
        })
    }

    /// Simulate an out-of-band account change
    pub fn emit(&self, accounts: Vec<Address>) {
        let _ = self.events.send(accounts);
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> PlinksResult<Vec<Address>> {
        *self.authorized.lock().unwrap() = true;
        Ok(self.accounts.clone())
    }

    async fn authorized_accounts(&self) -> PlinksResult<Vec<Address>> {
        if *self.authorized.lock().unwrap() {
            Ok(self.accounts.clone())
        } else {
            Ok(Vec::new())
        }
    }

    async fn send_transaction(&self, from: Address, tx: TransactionRequest) -> PlinksResult<H256> {
        self.ledger.submit(from, tx)
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<Address>> {
        self.events.subscribe()
    }

    fn chain(&self) -> Arc<dyn ChainProvider> {
        self.ledger.clone()
    }
}
