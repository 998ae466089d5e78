//! Chain and Wallet Providers
//!
//! `ChainProvider` is the read/confirmation side of a network connection and
//! `WalletProvider` the account authorization and signing side (the wallet
//! injection API). `RpcProvider` speaks Ethereum JSON-RPC over HTTPS and
//! `LocalWalletProvider` is a wallet backed by a local private key.

use crate::config::AppConfig;
use crate::error::{PlinksError, PlinksResult};
use async_trait::async_trait;
use ethers_core::types::transaction::eip2718::TypedTransaction;
use ethers_core::types::{Address, Bytes, TransactionReceipt, TransactionRequest, H256, U256, U64};
use ethers_signers::{LocalWallet, Signer};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Capacity of the account-change channel
const EVENT_CAPACITY: usize = 16;

// =============================================================================
// Traits
// =============================================================================

/// Read access to the network: calls, receipts and chain identity
#[async_trait]
pub trait ChainProvider: Send + Sync {
    async fn chain_id(&self) -> PlinksResult<u64>;

    /// Read-only contract call (`eth_call` at the latest block)
    async fn call(&self, to: Address, data: Bytes) -> PlinksResult<Bytes>;

    /// Resolve once the transaction is mined with at least `confirmations`
    async fn wait_for_receipt(&self, tx_hash: H256, confirmations: u64) -> PlinksResult<TransactionReceipt>;
}

/// Account authorization and transaction signing
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the user to authorize this application; returns authorized accounts
    async fn request_accounts(&self) -> PlinksResult<Vec<Address>>;

    /// Accounts already authorized, without prompting
    async fn authorized_accounts(&self) -> PlinksResult<Vec<Address>>;

    /// Sign and submit `tx` from `from`; returns the transaction hash
    async fn send_transaction(&self, from: Address, tx: TransactionRequest) -> PlinksResult<H256>;

    /// Out-of-band account-change notifications
    fn subscribe(&self) -> broadcast::Receiver<Vec<Address>>;

    /// Network the wallet submits to
    fn chain(&self) -> Arc<dyn ChainProvider>;
}

// =============================================================================
// JSON-RPC provider
// =============================================================================

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Ethereum JSON-RPC client
pub struct RpcProvider {
    client: reqwest::Client,
    url: String,
    poll_interval: Duration,
    next_id: AtomicU64,
}

impl RpcProvider {
    pub fn new(url: impl Into<String>, request_timeout: Duration, poll_interval: Duration) -> PlinksResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| PlinksError::network(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            poll_interval,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_config(config: &AppConfig) -> PlinksResult<Self> {
        Self::new(config.rpc_url.clone(), config.request_timeout(), config.poll_interval())
    }

    /// Issue one JSON-RPC request; a `null` result comes back as `None`
    async fn request<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> PlinksResult<Option<T>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        crate::log_debug!("provider", "rpc request", method = method, id = id);

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&RpcRequest {
                jsonrpc: "2.0",
                method,
                params,
                id,
            })
            .send()
            .await
            .map_err(|e| PlinksError::network(format!("RPC request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(PlinksError::network(format!(
                "RPC returned error status {}",
                response.status()
            )));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| PlinksError::parse_error(format!("Failed to parse RPC response: {}", e)))?;

        if let Some(error) = body.error {
            let details = match error.data {
                Some(data) => format!("rpc error code {}, data {}", error.code, data),
                None => format!("rpc error code {}", error.code),
            };
            return Err(PlinksError::contract_call(format!("{} failed: {}", method, error.message)).with_details(details));
        }

        Ok(body.result)
    }

    async fn required<T: DeserializeOwned>(&self, method: &str, params: serde_json::Value) -> PlinksResult<T> {
        self.request(method, params)
            .await?
            .ok_or_else(|| PlinksError::network(format!("No result in {} response", method)))
    }

    pub async fn block_number(&self) -> PlinksResult<u64> {
        let n: U64 = self.required("eth_blockNumber", serde_json::json!([])).await?;
        Ok(n.as_u64())
    }

    pub async fn transaction_receipt(&self, tx_hash: H256) -> PlinksResult<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", serde_json::json!([tx_hash])).await
    }

    pub async fn transaction_count(&self, address: Address) -> PlinksResult<U256> {
        self.required("eth_getTransactionCount", serde_json::json!([address, "pending"])).await
    }

    pub async fn gas_price(&self) -> PlinksResult<U256> {
        self.required("eth_gasPrice", serde_json::json!([])).await
    }

    pub async fn estimate_gas(&self, tx: &TransactionRequest) -> PlinksResult<U256> {
        self.required("eth_estimateGas", serde_json::json!([tx])).await
    }

    pub async fn send_raw_transaction(&self, raw: Bytes) -> PlinksResult<H256> {
        self.required("eth_sendRawTransaction", serde_json::json!([raw])).await
    }
}

#[async_trait]
impl ChainProvider for RpcProvider {
    async fn chain_id(&self) -> PlinksResult<u64> {
        let id: U64 = self.required("eth_chainId", serde_json::json!([])).await?;
        Ok(id.as_u64())
    }

    async fn call(&self, to: Address, data: Bytes) -> PlinksResult<Bytes> {
        let call = serde_json::json!({ "to": to, "data": data });
        self.required("eth_call", serde_json::json!([call, "latest"])).await
    }

    async fn wait_for_receipt(&self, tx_hash: H256, confirmations: u64) -> PlinksResult<TransactionReceipt> {
        let confirmations = confirmations.max(1);

        loop {
            if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
                if let Some(mined_at) = receipt.block_number {
                    let head = self.block_number().await?;
                    let depth = head.saturating_sub(mined_at.as_u64()) + 1;
                    if depth >= confirmations {
                        return Ok(receipt);
                    }
                    crate::log_debug!("provider", "awaiting confirmations", tx_hash = format!("{:?}", tx_hash), depth = depth);
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

// =============================================================================
// Local-key wallet
// =============================================================================

/// Wallet holding one private key, signing locally and submitting over RPC
pub struct LocalWalletProvider {
    wallet: LocalWallet,
    rpc: Arc<RpcProvider>,
    authorized: AtomicBool,
    events: broadcast::Sender<Vec<Address>>,
}

impl LocalWalletProvider {
    pub fn new(wallet: LocalWallet, chain_id: u64, rpc: Arc<RpcProvider>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            wallet: wallet.with_chain_id(chain_id),
            rpc,
            authorized: AtomicBool::new(false),
            events,
        }
    }

    /// Build from a hex private key (with or without `0x`)
    pub fn from_key_hex(key_hex: &str, chain_id: u64, rpc: Arc<RpcProvider>) -> PlinksResult<Self> {
        let wallet = LocalWallet::from_str(key_hex.trim().trim_start_matches("0x"))?;
        Ok(Self::new(wallet, chain_id, rpc))
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Withdraw authorization and notify subscribers with an empty account list
    pub fn revoke(&self) {
        self.authorized.store(false, Ordering::SeqCst);
        // No subscribers is fine
        let _ = self.events.send(Vec::new());
    }

    async fn fill(&self, from: Address, tx: TransactionRequest) -> PlinksResult<TypedTransaction> {
        let chain_id = self.wallet.chain_id();
        let mut tx = tx.from(from);

        if tx.nonce.is_none() {
            tx = tx.nonce(self.rpc.transaction_count(from).await?);
        }
        if tx.gas_price.is_none() {
            tx = tx.gas_price(self.rpc.gas_price().await?);
        }
        if tx.gas.is_none() {
            let gas = self.rpc.estimate_gas(&tx).await?;
            tx = tx.gas(gas);
        }

        Ok(tx.chain_id(chain_id).into())
    }
}

#[async_trait]
impl WalletProvider for LocalWalletProvider {
    async fn request_accounts(&self) -> PlinksResult<Vec<Address>> {
        self.authorized.store(true, Ordering::SeqCst);
        let accounts = vec![self.address()];
        let _ = self.events.send(accounts.clone());
        Ok(accounts)
    }

    async fn authorized_accounts(&self) -> PlinksResult<Vec<Address>> {
        if self.authorized.load(Ordering::SeqCst) {
            Ok(vec![self.address()])
        } else {
            Ok(Vec::new())
        }
    }

    async fn send_transaction(&self, from: Address, tx: TransactionRequest) -> PlinksResult<H256> {
        if !self.authorized.load(Ordering::SeqCst) || from != self.address() {
            return Err(PlinksError::authorization_denied("Account is not authorized for signing"));
        }

        let typed_tx = self.fill(from, tx).await?;
        let signature = self.wallet.sign_transaction(&typed_tx).await?;
        let raw = typed_tx.rlp_signed(&signature);

        let tx_hash = self.rpc.send_raw_transaction(raw).await?;
        crate::log_info!("provider", "transaction submitted", tx_hash = format!("{:?}", tx_hash), from = format!("{:?}", from));
        Ok(tx_hash)
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<Address>> {
        self.events.subscribe()
    }

    fn chain(&self) -> Arc<dyn ChainProvider> {
        self.rpc.clone()
    }
}
