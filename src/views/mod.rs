//! View Controllers
//!
//! Each screen owns its own transient state and borrows the session from the
//! application root for the duration of an action. Gateway and codec errors
//! stop here and become one user-visible message.

pub mod create;
pub mod home;
pub mod nav;
pub mod pay;
pub mod status;

pub use create::{CreateForm, CreateView, GeneratedLink};
pub use home::HomeView;
pub use nav::{NavAction, NavState, NavView};
pub use pay::{PaymentConfirmation, PayView};
pub use status::{StatusReport, StatusView};

use crate::session::{ConnectOutcome, SessionManager};
use serde::Serialize;

// User-visible messages
pub const MSG_WALLET_NOT_READY: &str = "Wallet not connected properly. Please try reconnecting.";
pub const MSG_CREATE_FAILED: &str = "Failed to create payment link. Please try again.";
pub const MSG_INVALID_LINK: &str = "Invalid payment link. Missing required parameters.";
pub const MSG_TRANSACTION_FAILED: &str = "Transaction failed. Please try again.";
pub const MSG_FETCH_FAILED: &str = "Failed to fetch payment details. Please check the Request ID and try again.";
pub const MSG_CONNECT_AND_ENTER_ID: &str = "Please connect your wallet and enter a valid Request ID.";

/// Per-action state: idle -> loading -> (success | error)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum ViewState<T> {
    Idle,
    Loading,
    Success(T),
    Error(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Idle
    }
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            ViewState::Success(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ViewState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

/// What a user action ended up doing
#[derive(Debug, Clone)]
pub enum ActionOutcome {
    /// Trigger is disabled while a previous action is loading
    Busy,
    /// Session was disconnected, so the action only attempted to connect
    ConnectAttempted(ConnectOutcome),
    /// The action ran; inspect the view state for its result
    Finished,
}

/// Connect-first step shared by every action that needs a signer
///
/// Returns `Some` when the action must stop after the connect attempt.
pub(crate) async fn connect_first<T>(
    session: &mut SessionManager,
    state: &mut ViewState<T>,
) -> Option<ActionOutcome> {
    if session.is_connected() {
        return None;
    }

    let outcome = session.connect().await;
    if let ConnectOutcome::WalletUnavailable(prompt) = &outcome {
        *state = ViewState::Error(prompt.to_string());
    }
    Some(ActionOutcome::ConnectAttempted(outcome))
}
