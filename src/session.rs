//! Wallet Session Manager
//!
//! Tracks whether the application holds an authorized account and the
//! signing handle derived from it. The session is owned by the application
//! root and lent to each view by `&mut`, never stored globally.

use crate::error::{PlinksError, PlinksResult};
use crate::provider::{ChainProvider, WalletProvider};
use ethers_core::types::{Address, TransactionRequest, H256};
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Shown when no wallet is available to connect to
pub const INSTALL_WALLET_MESSAGE: &str = "Please install a wallet to use this feature";

/// Authorization to sign and submit as one account
#[derive(Clone)]
pub struct SigningHandle {
    account: Address,
    wallet: Arc<dyn WalletProvider>,
}

impl SigningHandle {
    pub fn new(account: Address, wallet: Arc<dyn WalletProvider>) -> Self {
        Self { account, wallet }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// Network the handle submits to
    pub fn chain(&self) -> Arc<dyn ChainProvider> {
        self.wallet.chain()
    }

    /// Submit a transaction from this handle's account
    pub async fn send(&self, tx: TransactionRequest) -> PlinksResult<H256> {
        self.wallet.send_transaction(self.account, tx.from(self.account)).await
    }
}

impl fmt::Debug for SigningHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningHandle").field("account", &self.account).finish()
    }
}

/// Connection state visible to the views
#[derive(Debug, Clone, Default)]
pub struct WalletSession {
    pub connected: bool,
    pub account: Option<Address>,
    pub handle: Option<SigningHandle>,
}

/// Result of `SessionManager::connect`
#[derive(Debug, Clone)]
pub enum ConnectOutcome {
    Connected(Address),
    /// No wallet present; carries the prompt to show the user
    WalletUnavailable(&'static str),
    Failed(PlinksError),
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected(_))
    }
}

pub struct SessionManager {
    wallet: Option<Arc<dyn WalletProvider>>,
    events: Option<broadcast::Receiver<Vec<Address>>>,
    session: WalletSession,
}

impl SessionManager {
    /// `None` models an environment with no wallet installed
    pub fn new(wallet: Option<Arc<dyn WalletProvider>>) -> Self {
        let events = wallet.as_ref().map(|w| w.subscribe());
        Self {
            wallet,
            events,
            session: WalletSession::default(),
        }
    }

    pub fn session(&self) -> &WalletSession {
        &self.session
    }

    pub fn is_connected(&self) -> bool {
        self.session.connected
    }

    pub fn account(&self) -> Option<Address> {
        self.session.account
    }

    pub fn handle(&self) -> Option<&SigningHandle> {
        self.session.handle.as_ref()
    }

    /// Read provider of the active session
    pub fn provider(&self) -> Option<Arc<dyn ChainProvider>> {
        self.session.handle.as_ref().map(|h| h.chain())
    }

    /// Pick up an authorization granted in an earlier visit, without prompting
    pub async fn restore(&mut self) -> bool {
        let Some(wallet) = self.wallet.clone() else {
            return false;
        };

        match wallet.authorized_accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(account) => {
                    self.set_account(*account, wallet);
                    crate::log_info!("session", "restored authorized session", account = format!("{:?}", account));
                    true
                }
                None => false,
            },
            Err(e) => {
                crate::log_warn!("session", "could not list authorized accounts", error = e);
                false
            }
        }
    }

    /// Request authorization; failures are logged and leave the session unchanged
    pub async fn connect(&mut self) -> ConnectOutcome {
        let Some(wallet) = self.wallet.clone() else {
            crate::log_warn!("session", "no wallet available");
            return ConnectOutcome::WalletUnavailable(INSTALL_WALLET_MESSAGE);
        };

        let accounts = match wallet.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                crate::log_error!("session", "wallet connection failed", error = e);
                return ConnectOutcome::Failed(e);
            }
        };

        match accounts.first() {
            Some(account) => {
                self.set_account(*account, wallet);
                crate::log_info!("session", "wallet connected", account = format!("{:?}", account));
                ConnectOutcome::Connected(*account)
            }
            None => {
                let e = PlinksError::authorization_denied("Wallet returned no accounts");
                crate::log_error!("session", "wallet connection failed", error = e);
                ConnectOutcome::Failed(e)
            }
        }
    }

    /// Forget the local session; the wallet's own authorization is untouched
    pub fn disconnect(&mut self) {
        self.session = WalletSession::default();
        let stale = self.drain_events().len();
        crate::log_info!("session", "wallet disconnected", discarded_events = stale);
    }

    /// React to an out-of-band account list from the wallet.
    ///
    /// Only a connected session follows account switches; a disconnected one
    /// stays disconnected until `connect` or `restore`.
    pub fn handle_accounts_changed(&mut self, accounts: &[Address]) {
        match accounts.first() {
            None => {
                if self.session.connected {
                    crate::log_info!("session", "wallet reported no accounts, disconnecting");
                }
                self.session = WalletSession::default();
            }
            Some(_) if !self.session.connected => {
                crate::log_debug!("session", "ignoring account change while disconnected");
            }
            Some(account) if self.session.account != Some(*account) => {
                let Some(wallet) = self.wallet.clone() else {
                    return;
                };
                self.set_account(*account, wallet);
                crate::log_info!("session", "active account changed", account = format!("{:?}", account));
            }
            Some(_) => {}
        }
    }

    /// Apply every pending account-change notification; returns how many were seen
    pub fn pump_events(&mut self) -> usize {
        let pending = self.drain_events();
        for accounts in &pending {
            self.handle_accounts_changed(accounts);
        }
        pending.len()
    }

    fn drain_events(&mut self) -> Vec<Vec<Address>> {
        let mut pending = Vec::new();
        let Some(events) = self.events.as_mut() else {
            return pending;
        };
        loop {
            match events.try_recv() {
                Ok(accounts) => pending.push(accounts),
                Err(TryRecvError::Lagged(skipped)) => {
                    crate::log_warn!("session", "account notifications dropped", skipped = skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
        pending
    }

    fn set_account(&mut self, account: Address, wallet: Arc<dyn WalletProvider>) {
        self.session = WalletSession {
            connected: true,
            account: Some(account),
            handle: Some(SigningHandle::new(account, wallet)),
        };
    }
}
