//! Navigation bar: links plus the connect/disconnect control

use super::ActionOutcome;
use crate::address::{to_checksum_address, truncate_address};
use crate::session::SessionManager;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NavAction {
    Connect,
    Disconnect,
}

impl NavAction {
    pub fn label(&self) -> &'static str {
        match self {
            NavAction::Connect => "Connect Wallet",
            NavAction::Disconnect => "Disconnect",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavState {
    /// `0x1234...abcd` form of the active account
    pub account: Option<String>,
    pub action: NavAction,
}

pub struct NavView;

impl NavView {
    pub fn render(session: &SessionManager) -> NavState {
        match session.account() {
            Some(account) if session.is_connected() => NavState {
                account: Some(truncate_address(&to_checksum_address(&account))),
                action: NavAction::Disconnect,
            },
            _ => NavState {
                account: None,
                action: NavAction::Connect,
            },
        }
    }

    /// Run whichever action the control currently shows
    pub async fn toggle(session: &mut SessionManager) -> ActionOutcome {
        match Self::render(session).action {
            NavAction::Connect => ActionOutcome::ConnectAttempted(session.connect().await),
            NavAction::Disconnect => {
                session.disconnect();
                ActionOutcome::Finished
            }
        }
    }
}
