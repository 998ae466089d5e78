//! Plinks Core Library
//!
//! Shareable payment links for EVM networks such as Polkadot Asset Hub.
//!
//! # Architecture
//!
//! This crate provides:
//! - **link**: Encoding payment requests as `/pay` URLs and decoding them back
//! - **gateway**: Create, complete and fetch requests on the payment request contract
//! - **session**: Wallet connection state and signing handles
//! - **provider**: JSON-RPC chain access and a local-key wallet
//! - **views**: Screen controllers for create, pay, status, home and nav
//!
//! The application root owns one `SessionManager` and lends it to the views:
//!
//! ```rust,ignore
//! use plinks::{AppConfig, LinkCodec, PaymentGateway, SessionManager};
//! use plinks::views::CreateView;
//!
//! let config = AppConfig::load(None)?;
//! let gateway = PaymentGateway::from_config(&config)?;
//! let mut session = SessionManager::new(Some(wallet));
//! session.restore().await;
//!
//! let mut view = CreateView::new(LinkCodec::new(&config.origin)?);
//! view.submit(&mut session, &gateway).await;
//! ```

pub mod address;
pub mod config;
pub mod contract;
pub mod error;
pub mod gateway;
pub mod link;
pub mod provider;
pub mod session;
pub mod types;
pub mod units;
pub mod utils;
pub mod views;

pub use config::AppConfig;
pub use error::{ErrorCode, PlinksError, PlinksResult};
pub use gateway::PaymentGateway;
pub use link::{LinkCodec, LinkError};
pub use provider::{ChainProvider, LocalWalletProvider, RpcProvider, WalletProvider};
pub use session::{ConnectOutcome, SessionManager, SigningHandle, WalletSession};
pub use types::*;
pub use units::{format_units, parse_units, UnitsError};
