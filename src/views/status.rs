//! Status screen: look up a request by id

use super::{connect_first, ActionOutcome, ViewState, MSG_CONNECT_AND_ENTER_ID, MSG_FETCH_FAILED};
use crate::gateway::PaymentGateway;
use crate::link::{LinkCodec, LinkError};
use crate::session::SessionManager;
use crate::types::{RemotePaymentRecord, RequestId, RequestStatus};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub request_id: RequestId,
    pub record: RemotePaymentRecord,
}

impl StatusReport {
    pub fn status(&self) -> RequestStatus {
        self.record.status()
    }

    pub fn message(&self) -> &'static str {
        match self.status() {
            RequestStatus::Pending => {
                "This payment request is still pending. The recipient needs to complete the payment."
            }
            RequestStatus::Completed => {
                "This payment has been successfully completed and verified on the blockchain."
            }
        }
    }
}

#[derive(Default)]
pub struct StatusView {
    /// Request id input, as typed or taken from the link
    pub request_id: String,
    state: ViewState<StatusReport>,
}

impl StatusView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefill from a `/status?requestId=...` link
    pub fn open(codec: &LinkCodec, link: &str) -> Self {
        let request_id = match codec.decode_status(link) {
            Ok(Some(id)) => id.to_string(),
            Ok(None) => String::new(),
            // Keep what was given; the lookup reports it
            Err(LinkError::InvalidRequestId(raw)) => raw,
            Err(e) => {
                crate::log_warn!("status", "unreadable status link", error = e);
                String::new()
            }
        };
        Self {
            request_id,
            state: ViewState::Idle,
        }
    }

    pub fn state(&self) -> &ViewState<StatusReport> {
        &self.state
    }

    pub fn button_label(&self, session: &SessionManager) -> &'static str {
        if self.state.is_loading() {
            "Loading..."
        } else if session.is_connected() {
            "Check Status"
        } else {
            "Connect Wallet"
        }
    }

    /// Look up immediately when opened with an id and a connected session
    pub async fn auto_lookup(&mut self, session: &SessionManager, gateway: &PaymentGateway) -> bool {
        if self.request_id.is_empty() || !session.is_connected() || !matches!(self.state, ViewState::Idle) {
            return false;
        }
        self.lookup(session, gateway).await;
        true
    }

    pub async fn submit(&mut self, session: &mut SessionManager, gateway: &PaymentGateway) -> ActionOutcome {
        if self.state.is_loading() {
            return ActionOutcome::Busy;
        }
        self.state = ViewState::Idle;

        if let Some(stop) = connect_first(session, &mut self.state).await {
            return stop;
        }

        self.lookup(session, gateway).await;
        ActionOutcome::Finished
    }

    async fn lookup(&mut self, session: &SessionManager, gateway: &PaymentGateway) {
        let provider = match session.provider() {
            Some(p) if !self.request_id.trim().is_empty() => p,
            _ => {
                self.state = ViewState::Error(MSG_CONNECT_AND_ENTER_ID.to_string());
                return;
            }
        };

        self.state = ViewState::Loading;

        let result = match self.request_id.trim().parse::<RequestId>() {
            Ok(id) => gateway
                .fetch_request(provider.as_ref(), &id)
                .await
                .map(|record| StatusReport { request_id: id, record }),
            Err(e) => Err(e),
        };

        self.state = match result {
            Ok(report) => ViewState::Success(report),
            Err(e) => {
                crate::log_error!("status", "status lookup failed", request_id = self.request_id, error = e);
                ViewState::Error(MSG_FETCH_FAILED.to_string())
            }
        };
    }
}
