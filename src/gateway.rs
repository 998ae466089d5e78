//! Payment Request Gateway
//!
//! Translates application values into calls against the payment request
//! contract and the responses back into application values. Each operation
//! is a single sequential exchange; nothing here retries or caches.

use crate::config::AppConfig;
use crate::contract::PlinksContract;
use crate::error::{ErrorCode, PlinksError, PlinksResult};
use crate::provider::ChainProvider;
use crate::session::SigningHandle;
use crate::types::{Asset, PaymentRequest, RemotePaymentRecord, RequestId};
use crate::units::{format_units, parse_units};
use ethers_core::types::{Address, TransactionReceipt, TransactionRequest, H256, U64};

#[derive(Debug, Clone)]
pub struct PaymentGateway {
    contract: PlinksContract,
    confirmations: u64,
}

impl PaymentGateway {
    pub fn new(contract_address: Address, confirmations: u64) -> Self {
        Self {
            contract: PlinksContract::new(contract_address),
            confirmations: confirmations.max(1),
        }
    }

    pub fn from_config(config: &AppConfig) -> PlinksResult<Self> {
        Ok(Self::new(config.contract()?, config.confirmations))
    }

    /// Register a request on-chain and return the identifier the contract emitted
    pub async fn create_request(
        &self,
        signer: &SigningHandle,
        recipient: &str,
        asset: Asset,
        amount: &str,
        memo: &str,
    ) -> PlinksResult<RequestId> {
        let to = crate::address::parse_address(recipient)?;
        let raw_amount = parse_units(amount)?;

        let data = self.contract.request_payment_call(to, asset.symbol(), raw_amount, memo);
        let tx = TransactionRequest::new().to(self.contract.address()).data(data);
        let receipt = self
            .submit(signer, tx)
            .await
            .map_err(|e| as_call_error("requestPayment", e))?;

        let event = self.contract.find_payment_requested(&receipt.logs).ok_or_else(|| {
            PlinksError::contract_call("PaymentRequested event missing from receipt")
                .with_details(format!("tx {:?}", receipt.transaction_hash))
        })?;

        crate::log_info!(
            "gateway",
            "payment request created",
            request_id = event.request_id,
            recipient = recipient,
            asset = asset
        );
        Ok(event.request_id)
    }

    /// Mark a request completed on-chain; the receipt must carry the matching `PaymentCompleted`
    pub async fn complete_request(&self, signer: &SigningHandle, request_id: &RequestId) -> PlinksResult<H256> {
        let data = self.contract.complete_payment_call(request_id);
        let tx = TransactionRequest::new().to(self.contract.address()).data(data);
        let receipt = self
            .submit(signer, tx)
            .await
            .map_err(|e| as_call_error("completePayment", e))?;

        let event = self
            .contract
            .find_payment_completed(&receipt.logs)
            .filter(|event| event.request_id == *request_id)
            .ok_or_else(|| {
                PlinksError::contract_call("PaymentCompleted event missing from receipt")
                    .with_details(format!("tx {:?}", receipt.transaction_hash))
            })?;

        crate::log_info!(
            "gateway",
            "payment request completed",
            request_id = request_id,
            from = format!("{:?}", event.from),
            to = format!("{:?}", event.to)
        );
        Ok(receipt.transaction_hash)
    }

    /// Read the authoritative record for a request
    pub async fn fetch_request(
        &self,
        provider: &dyn ChainProvider,
        request_id: &RequestId,
    ) -> PlinksResult<RemotePaymentRecord> {
        let output = provider
            .call(self.contract.address(), self.contract.payment_requests_call(request_id))
            .await
            .map_err(|e| as_call_error("paymentRequests", e))?;
        let stored = self.contract.decode_payment_request(&output)?;

        if stored.is_empty() {
            return Err(PlinksError::not_found(format!("No payment request with id {}", request_id)));
        }

        Ok(RemotePaymentRecord {
            to: stored.to,
            asset: stored.asset,
            amount: format_units(stored.amount),
            memo: stored.memo,
            completed: stored.completed,
        })
    }

    /// Send the value transfer a payment link asks for
    pub async fn send_payment(&self, signer: &SigningHandle, request: &PaymentRequest) -> PlinksResult<H256> {
        request.ensure_complete()?;
        let to = crate::address::parse_address(&request.recipient)?;
        let value = parse_units(&request.amount)?;

        let receipt = self.submit(signer, TransactionRequest::new().to(to).value(value)).await?;

        crate::log_info!(
            "gateway",
            "payment sent",
            tx_hash = format!("{:?}", receipt.transaction_hash),
            recipient = request.recipient,
            amount = request.amount,
            asset = request.asset
        );
        Ok(receipt.transaction_hash)
    }

    async fn submit(&self, signer: &SigningHandle, tx: TransactionRequest) -> PlinksResult<TransactionReceipt> {
        let tx_hash = signer.send(tx).await?;
        let receipt = signer.chain().wait_for_receipt(tx_hash, self.confirmations).await?;
        ensure_succeeded(&receipt)?;
        Ok(receipt)
    }
}

fn ensure_succeeded(receipt: &TransactionReceipt) -> PlinksResult<()> {
    if receipt.status == Some(U64::zero()) {
        return Err(PlinksError::contract_call("Transaction reverted")
            .with_details(format!("tx {:?}", receipt.transaction_hash)));
    }
    Ok(())
}

/// Fold signing, transport and revert failures of a contract call into `ContractCallError`
fn as_call_error(call: &str, e: PlinksError) -> PlinksError {
    match e.code {
        ErrorCode::ContractCallError => e,
        _ => PlinksError::contract_call(format!("{} failed", call)).with_details(e.to_string()),
    }
}
