//! Pay screen
//!
//! Opened from a payment link. The value transfer decides the outcome; marking
//! the request completed afterwards is best-effort.

use super::{connect_first, ActionOutcome, ViewState, MSG_INVALID_LINK, MSG_TRANSACTION_FAILED, MSG_WALLET_NOT_READY};
use crate::gateway::PaymentGateway;
use crate::link::LinkCodec;
use crate::session::SessionManager;
use crate::types::{Outcome, PaymentRequest};
use ethers_core::types::H256;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentConfirmation {
    pub tx_hash: H256,
    /// `None` when the link carried no request id
    pub completion: Option<Outcome<H256>>,
}

pub struct PayView {
    request: Option<PaymentRequest>,
    state: ViewState<PaymentConfirmation>,
}

impl PayView {
    /// Decode the link the screen was opened with
    pub fn open(codec: &LinkCodec, link: &str) -> Self {
        match codec.decode(link) {
            Ok(request) => Self {
                request: Some(request),
                state: ViewState::Idle,
            },
            Err(e) => {
                crate::log_warn!("pay", "rejected payment link", error = e);
                Self {
                    request: None,
                    state: ViewState::Error(MSG_INVALID_LINK.to_string()),
                }
            }
        }
    }

    pub fn request(&self) -> Option<&PaymentRequest> {
        self.request.as_ref()
    }

    pub fn state(&self) -> &ViewState<PaymentConfirmation> {
        &self.state
    }

    pub fn button_label(&self, session: &SessionManager) -> &'static str {
        if session.is_connected() {
            "Confirm Payment"
        } else {
            "Connect Wallet"
        }
    }

    /// Pay the request once; a confirmed payment is never sent again
    pub async fn confirm(&mut self, session: &mut SessionManager, gateway: &PaymentGateway) -> ActionOutcome {
        if self.state.is_loading() {
            return ActionOutcome::Busy;
        }
        if self.state.success().is_some() {
            return ActionOutcome::Finished;
        }
        let Some(request) = self.request.clone() else {
            return ActionOutcome::Finished;
        };

        if let Some(stop) = connect_first(session, &mut self.state).await {
            return stop;
        }
        let Some(handle) = session.handle().cloned() else {
            self.state = ViewState::Error(MSG_WALLET_NOT_READY.to_string());
            return ActionOutcome::Finished;
        };

        self.state = ViewState::Loading;

        let tx_hash = match gateway.send_payment(&handle, &request).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                crate::log_error!("pay", "transaction failed", error = e);
                self.state = ViewState::Error(MSG_TRANSACTION_FAILED.to_string());
                return ActionOutcome::Finished;
            }
        };

        let completion = match &request.request_id {
            Some(id) => Some(Outcome::from_result(
                "pay",
                "mark request completed",
                gateway.complete_request(&handle, id).await,
            )),
            None => None,
        };

        self.state = ViewState::Success(PaymentConfirmation { tx_hash, completion });
        ActionOutcome::Finished
    }
}
