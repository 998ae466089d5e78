//! Create-link screen
//!
//! Registers the request on-chain when it can, then always produces a link.
//! A failed registration only drops the request id from the link.

use super::{connect_first, ActionOutcome, ViewState, MSG_CREATE_FAILED, MSG_WALLET_NOT_READY};
use crate::gateway::PaymentGateway;
use crate::link::LinkCodec;
use crate::session::SessionManager;
use crate::types::{Asset, Outcome, PaymentRequest, RequestId};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateForm {
    pub recipient: String,
    pub amount: String,
    pub asset: Asset,
    pub memo: String,
}

impl CreateForm {
    pub fn to_request(&self) -> PaymentRequest {
        PaymentRequest::new(self.recipient.trim(), self.amount.trim(), self.asset, self.memo.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedLink {
    pub link: String,
    pub request_id: Outcome<RequestId>,
    /// Present when the request was registered on-chain
    pub status_link: Option<String>,
}

pub struct CreateView {
    codec: LinkCodec,
    pub form: CreateForm,
    state: ViewState<GeneratedLink>,
}

impl CreateView {
    pub fn new(codec: LinkCodec) -> Self {
        Self {
            codec,
            form: CreateForm::default(),
            state: ViewState::Idle,
        }
    }

    pub fn with_form(mut self, form: CreateForm) -> Self {
        self.form = form;
        self
    }

    pub fn state(&self) -> &ViewState<GeneratedLink> {
        &self.state
    }

    pub fn button_label(&self, session: &SessionManager) -> &'static str {
        if self.state.is_loading() {
            "Processing..."
        } else if session.is_connected() {
            "Generate Link"
        } else {
            "Connect Wallet"
        }
    }

    pub async fn submit(&mut self, session: &mut SessionManager, gateway: &PaymentGateway) -> ActionOutcome {
        if self.state.is_loading() {
            return ActionOutcome::Busy;
        }
        self.state = ViewState::Idle;

        if let Some(stop) = connect_first(session, &mut self.state).await {
            return stop;
        }

        let Some(handle) = session.handle().cloned() else {
            self.state = ViewState::Error(MSG_WALLET_NOT_READY.to_string());
            return ActionOutcome::Finished;
        };

        let mut request = self.form.to_request();
        if let Err(e) = request.validate() {
            self.state = ViewState::Error(e.message);
            return ActionOutcome::Finished;
        }

        self.state = ViewState::Loading;

        let request_id = Outcome::from_result(
            "create",
            "register request",
            gateway
                .create_request(&handle, &request.recipient, request.asset, &request.amount, &request.memo)
                .await,
        );
        if let Outcome::Ok(id) = &request_id {
            request = request.with_request_id(*id);
        }

        self.state = match self.build(&request, request_id) {
            Ok(generated) => ViewState::Success(generated),
            Err(e) => {
                crate::log_error!("create", "link generation failed", error = e);
                ViewState::Error(MSG_CREATE_FAILED.to_string())
            }
        };
        ActionOutcome::Finished
    }

    fn build(&self, request: &PaymentRequest, request_id: Outcome<RequestId>) -> crate::PlinksResult<GeneratedLink> {
        let link = self.codec.encode(request)?;
        let status_link = match &request_id {
            Outcome::Ok(id) => Some(self.codec.status_link(id)?),
            Outcome::Degraded(_) => None,
        };
        Ok(GeneratedLink {
            link,
            request_id,
            status_link,
        })
    }
}
