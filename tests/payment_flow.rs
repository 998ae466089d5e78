//! End-to-end flows through the views against the in-memory contract

mod common;

use common::{alice, bob, contract_address, Faults, MockLedger, MockWallet, ORIGIN};
use ethers_core::types::U256;
use plinks::views::{
    ActionOutcome, CreateForm, CreateView, NavAction, NavView, PayView, StatusView, MSG_CONNECT_AND_ENTER_ID,
    MSG_FETCH_FAILED, MSG_INVALID_LINK, MSG_TRANSACTION_FAILED,
};
use plinks::{
    parse_units, Asset, ConnectOutcome, ErrorCode, LinkCodec, Outcome, PaymentGateway, RequestId, RequestStatus,
    SessionManager,
};
use std::sync::Arc;

fn codec() -> LinkCodec {
    LinkCodec::new(ORIGIN).unwrap()
}

fn gateway() -> PaymentGateway {
    PaymentGateway::new(contract_address(), 1)
}

fn rent_form() -> CreateForm {
    CreateForm {
        recipient: format!("{:?}", bob()),
        amount: "2.5".to_string(),
        asset: Asset::Dot,
        memo: "rent".to_string(),
    }
}

async fn connected_session(ledger: &Arc<MockLedger>) -> (SessionManager, Arc<MockWallet>) {
    let wallet = MockWallet::new(ledger.clone(), vec![alice()]);
    let mut session = SessionManager::new(Some(wallet.clone()));
    assert!(session.connect().await.is_connected());
    (session, wallet)
}

#[tokio::test]
async fn create_registers_request_and_links_it() {
    let ledger = MockLedger::new();
    let (mut session, _wallet) = connected_session(&ledger).await;
    let gateway = gateway();

    let mut view = CreateView::new(codec()).with_form(rent_form());
    assert_eq!(view.button_label(&session), "Generate Link");
    assert!(matches!(view.submit(&mut session, &gateway).await, ActionOutcome::Finished));

    let generated = view.state().success().expect("link generated");
    let id = match &generated.request_id {
        Outcome::Ok(id) => *id,
        Outcome::Degraded(reason) => panic!("registration degraded: {}", reason),
    };
    assert!(generated.link.starts_with("https://plinks.app/pay?recipient="));
    assert!(generated.link.ends_with(&format!("&amount=2.5&asset=DOT&memo=rent&requestId={}", id)));
    assert_eq!(
        generated.status_link.as_deref(),
        Some(format!("https://plinks.app/status?requestId={}", id).as_str())
    );

    // The link decodes back to the submitted request
    let decoded = codec().decode(&generated.link).unwrap();
    assert_eq!(decoded, rent_form().to_request().with_request_id(id));

    let stored = ledger.stored(id.0).unwrap();
    assert_eq!(stored.amount, parse_units("2.5").unwrap());
    assert_eq!(stored.to, bob());
}

#[tokio::test]
async fn disconnected_create_only_connects() {
    let ledger = MockLedger::new();
    let wallet = MockWallet::new(ledger.clone(), vec![alice()]);
    let mut session = SessionManager::new(Some(wallet));
    let gateway = gateway();

    let mut view = CreateView::new(codec()).with_form(rent_form());
    assert_eq!(view.button_label(&session), "Connect Wallet");

    match view.submit(&mut session, &gateway).await {
        ActionOutcome::ConnectAttempted(ConnectOutcome::Connected(account)) => assert_eq!(account, alice()),
        other => panic!("expected a connect attempt, got {:?}", other),
    }
    assert_eq!(ledger.network_calls(), 0);
    assert!(view.state().success().is_none());

    view.submit(&mut session, &gateway).await;
    assert!(view.state().success().is_some());
    assert!(ledger.network_calls() > 0);
}

#[tokio::test]
async fn disconnected_pay_and_status_never_touch_the_network() {
    let ledger = MockLedger::new();
    let gateway = gateway();
    let link = codec().encode(&rent_form().to_request()).unwrap();

    let mut session = SessionManager::new(Some(MockWallet::new(ledger.clone(), vec![alice()])));
    let mut pay = PayView::open(&codec(), &link);
    assert!(matches!(
        pay.confirm(&mut session, &gateway).await,
        ActionOutcome::ConnectAttempted(_)
    ));

    let mut session = SessionManager::new(Some(MockWallet::new(ledger.clone(), vec![alice()])));
    let mut status = StatusView::new();
    status.request_id = format!("0x{}", "11".repeat(32));
    assert!(matches!(
        status.submit(&mut session, &gateway).await,
        ActionOutcome::ConnectAttempted(_)
    ));

    assert_eq!(ledger.network_calls(), 0);
    assert!(ledger.transfers().is_empty());
}

#[tokio::test]
async fn reverted_registration_still_produces_link() {
    let ledger = MockLedger::new();
    ledger.set_faults(Faults { revert_request: true, ..Faults::default() });
    let (mut session, _wallet) = connected_session(&ledger).await;

    let mut view = CreateView::new(codec()).with_form(rent_form());
    view.submit(&mut session, &gateway()).await;

    let generated = view.state().success().expect("link despite revert");
    assert!(generated.request_id.is_degraded());
    assert!(generated.status_link.is_none());
    assert_eq!(
        generated.link,
        format!("https://plinks.app/pay?recipient={:?}&amount=2.5&asset=DOT&memo=rent", bob())
    );
}

#[tokio::test]
async fn missing_event_is_a_contract_call_error() {
    let ledger = MockLedger::new();
    ledger.set_faults(Faults { omit_event: true, ..Faults::default() });
    let (session, _wallet) = connected_session(&ledger).await;

    let err = gateway()
        .create_request(session.handle().unwrap(), &format!("{:?}", bob()), Asset::Wld, "1", "")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ContractCallError);
}

#[tokio::test]
async fn rejected_signing_is_a_contract_call_error() {
    let ledger = MockLedger::new();
    ledger.set_faults(Faults { reject_signing: true, ..Faults::default() });
    let (session, _wallet) = connected_session(&ledger).await;

    let err = gateway()
        .create_request(session.handle().unwrap(), &format!("{:?}", bob()), Asset::Dot, "1", "")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ContractCallError);
    assert!(err.details.unwrap().contains("rejected"));
}

#[tokio::test]
async fn invalid_amount_fails_before_any_call() {
    let ledger = MockLedger::new();
    let (mut session, _wallet) = connected_session(&ledger).await;

    let err = gateway()
        .create_request(session.handle().unwrap(), &format!("{:?}", bob()), Asset::Dot, "2,5", "")
        .await
        .unwrap_err();
    assert!(err.is_validation());

    let mut view = CreateView::new(codec()).with_form(CreateForm { amount: "0".to_string(), ..rent_form() });
    view.submit(&mut session, &gateway()).await;
    assert!(view.state().error().is_some());
    assert_eq!(ledger.network_calls(), 0);
}

#[tokio::test]
async fn pay_sends_transfer_and_completes_request() {
    let ledger = MockLedger::new();
    let (mut session, _wallet) = connected_session(&ledger).await;
    let gateway = gateway();

    let id = gateway
        .create_request(session.handle().unwrap(), &format!("{:?}", bob()), Asset::Dot, "2.5", "rent")
        .await
        .unwrap();
    let link = codec()
        .encode(&rent_form().to_request().with_request_id(id))
        .unwrap();

    let mut view = PayView::open(&codec(), &link);
    assert_eq!(view.request().unwrap().request_id, Some(id));
    assert_eq!(view.button_label(&session), "Confirm Payment");
    view.confirm(&mut session, &gateway).await;

    let confirmation = view.state().success().expect("payment succeeded");
    assert!(matches!(confirmation.completion, Some(Outcome::Ok(_))));

    let transfers = ledger.transfers();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].from, alice());
    assert_eq!(transfers[0].to, bob());
    assert_eq!(transfers[0].value, U256::exp10(18) * 5 / 2);

    // Confirming a paid link again sends nothing
    let calls = ledger.network_calls();
    assert!(matches!(view.confirm(&mut session, &gateway).await, ActionOutcome::Finished));
    assert_eq!(ledger.transfers().len(), 1);
    assert_eq!(ledger.network_calls(), calls);

    let record = gateway.fetch_request(ledger.as_ref(), &id).await.unwrap();
    assert_eq!(record.status(), RequestStatus::Completed);
}

#[tokio::test]
async fn completion_without_event_is_a_contract_call_error() {
    let ledger = MockLedger::new();
    let (session, _wallet) = connected_session(&ledger).await;
    let gateway = gateway();
    let handle = session.handle().unwrap();

    let id = gateway
        .create_request(handle, &format!("{:?}", bob()), Asset::Dot, "1", "")
        .await
        .unwrap();
    ledger.set_faults(Faults { omit_event: true, ..Faults::default() });

    let err = gateway.complete_request(handle, &id).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ContractCallError);
    assert!(err.message.contains("PaymentCompleted"));
}

#[tokio::test]
async fn reverted_completion_does_not_fail_payment() {
    let ledger = MockLedger::new();
    let (mut session, _wallet) = connected_session(&ledger).await;
    let gateway = gateway();

    let id = gateway
        .create_request(session.handle().unwrap(), &format!("{:?}", bob()), Asset::Dot, "1", "")
        .await
        .unwrap();
    ledger.set_faults(Faults { revert_completion: true, ..Faults::default() });

    let link = codec()
        .encode(&rent_form().to_request().with_request_id(id))
        .unwrap();
    let mut view = PayView::open(&codec(), &link);
    view.confirm(&mut session, &gateway).await;

    let confirmation = view.state().success().expect("transfer decides the outcome");
    match &confirmation.completion {
        Some(Outcome::Degraded(reason)) => assert!(reason.contains("reverted")),
        other => panic!("expected degraded completion, got {:?}", other),
    }
    assert_eq!(ledger.transfers().len(), 1);
}

#[tokio::test]
async fn failed_transfer_reports_and_skips_completion() {
    let ledger = MockLedger::new();
    let (mut session, _wallet) = connected_session(&ledger).await;
    let gateway = gateway();

    let id = gateway
        .create_request(session.handle().unwrap(), &format!("{:?}", bob()), Asset::Dot, "1", "")
        .await
        .unwrap();
    ledger.set_faults(Faults { fail_transfer: true, ..Faults::default() });

    let link = codec()
        .encode(&rent_form().to_request().with_request_id(id))
        .unwrap();
    let mut view = PayView::open(&codec(), &link);
    view.confirm(&mut session, &gateway).await;

    assert_eq!(view.state().error(), Some(MSG_TRANSACTION_FAILED));
    assert!(!ledger.stored(id.0).unwrap().completed);
}

#[tokio::test]
async fn pay_link_without_request_id_skips_completion() {
    let ledger = MockLedger::new();
    let (mut session, _wallet) = connected_session(&ledger).await;

    let link = codec().encode(&rent_form().to_request()).unwrap();
    let mut view = PayView::open(&codec(), &link);
    view.confirm(&mut session, &gateway()).await;

    let confirmation = view.state().success().unwrap();
    assert_eq!(confirmation.completion, None);
}

#[tokio::test]
async fn invalid_pay_link_shows_message() {
    let ledger = MockLedger::new();
    let (mut session, _wallet) = connected_session(&ledger).await;

    let mut view = PayView::open(&codec(), "https://plinks.app/pay?amount=1&asset=DOT");
    assert!(view.request().is_none());
    assert_eq!(view.state().error(), Some(MSG_INVALID_LINK));

    view.confirm(&mut session, &gateway()).await;
    assert_eq!(ledger.network_calls(), 0);
}

#[tokio::test]
async fn status_auto_lookup_reports_pending() {
    let ledger = MockLedger::new();
    let (session, _wallet) = connected_session(&ledger).await;
    let gateway = gateway();

    let id = gateway
        .create_request(session.handle().unwrap(), &format!("{:?}", bob()), Asset::Wld, "0.75", "coffee")
        .await
        .unwrap();

    let status_link = codec().status_link(&id).unwrap();
    let mut view = StatusView::open(&codec(), &status_link);
    assert!(view.auto_lookup(&session, &gateway).await);

    let report = view.state().success().expect("lookup succeeded");
    assert_eq!(report.request_id, id);
    assert_eq!(report.status(), RequestStatus::Pending);
    assert_eq!(report.record.amount, "0.75");
    assert_eq!(report.record.asset, "WLD");
    assert_eq!(report.record.memo, "coffee");
    assert!(report.message().contains("still pending"));

    // Display amount converts back to the stored integer
    assert_eq!(
        parse_units(&report.record.amount).unwrap(),
        ledger.stored(id.0).unwrap().amount
    );
}

#[tokio::test]
async fn unknown_request_id_is_not_found() {
    let ledger = MockLedger::new();
    let (mut session, _wallet) = connected_session(&ledger).await;
    let gateway = gateway();
    let unknown: RequestId = format!("0x{}", "22".repeat(32)).parse().unwrap();

    let err = gateway.fetch_request(ledger.as_ref(), &unknown).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let mut view = StatusView::new();
    view.request_id = unknown.to_string();
    view.submit(&mut session, &gateway).await;
    assert_eq!(view.state().error(), Some(MSG_FETCH_FAILED));

    let mut malformed = StatusView::new();
    malformed.request_id = "0x1234".to_string();
    malformed.submit(&mut session, &gateway).await;
    assert_eq!(malformed.state().error(), Some(MSG_FETCH_FAILED));

    let mut empty = StatusView::new();
    empty.submit(&mut session, &gateway).await;
    assert_eq!(empty.state().error(), Some(MSG_CONNECT_AND_ENTER_ID));
}

#[tokio::test]
async fn account_changes_drive_the_session() {
    let ledger = MockLedger::new();
    let (mut session, wallet) = connected_session(&ledger).await;
    assert_eq!(NavView::render(&session).action, NavAction::Disconnect);
    assert_eq!(NavView::render(&session).account.as_deref(), Some("0xd8dA...6045"));

    wallet.emit(vec![bob()]);
    assert_eq!(session.pump_events(), 1);
    assert_eq!(session.account(), Some(bob()));
    assert_eq!(session.handle().unwrap().account(), bob());

    wallet.emit(Vec::new());
    session.pump_events();
    assert!(!session.is_connected());
    assert_eq!(session.account(), None);
    assert_eq!(NavView::render(&session).action, NavAction::Connect);
}

#[tokio::test]
async fn disconnect_is_not_undone_by_account_notifications() {
    let ledger = MockLedger::new();
    let (mut session, wallet) = connected_session(&ledger).await;

    wallet.emit(vec![alice()]);
    assert!(matches!(NavView::toggle(&mut session).await, ActionOutcome::Finished));
    session.pump_events();
    assert!(!session.is_connected());

    wallet.emit(vec![bob()]);
    assert_eq!(session.pump_events(), 1);
    assert!(!session.is_connected());
    assert_eq!(session.account(), None);
    assert_eq!(NavView::render(&session).action, NavAction::Connect);
}

#[tokio::test]
async fn restore_and_disconnect() {
    let ledger = MockLedger::new();
    let (mut first, wallet) = connected_session(&ledger).await;

    // A fresh root finds the earlier authorization
    let mut second = SessionManager::new(Some(wallet.clone()));
    assert!(second.restore().await);
    assert_eq!(second.account(), Some(alice()));

    assert!(matches!(NavView::toggle(&mut first).await, ActionOutcome::Finished));
    assert!(!first.is_connected());
    assert!(second.is_connected());
}
