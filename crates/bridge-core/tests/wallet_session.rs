//! Transfer session state as a UI would observe it.

mod common;

use std::time::Duration;

use bridge_core::*;
use common::*;
use wallet_connect::ProviderEvent;

const TIMEOUT: Duration = Duration::from_secs(5);

fn usdc(amount: u64) -> U256 {
    units(amount, 6)
}

#[tokio::test]
async fn selecting_usdc_fills_balance_and_bridge_address() {
    let h = Harness::new();
    *h.evm.token_balance.lock().unwrap() = usdc(50);
    h.connect_evm().await;

    let session = TransferSession::new(h.orchestrator.clone());
    session.select_token("USDC", VENUE).await;

    let state = session.state();
    assert_eq!(state.token.as_deref(), Some("USDC"));
    assert_eq!(state.balance, Some(usdc(50)));
    assert_eq!(
        state.deposit_address.as_deref(),
        Some(h.orchestrator.config().bridge_contract_address.as_str())
    );
    assert_eq!(state.verified, None);
    assert!(state.notice.is_none());
    assert!(!state.loading);
}

#[tokio::test]
async fn selecting_eth_reports_guardian_verdict() {
    let h = Harness::with(MockEvmWallet::new("0x1"), MockAddressService::new(&[1]));
    h.connect_evm().await;

    let session = TransferSession::new(h.orchestrator.clone());
    session.select_token("ETH", VENUE).await;

    let state = session.state();
    assert!(state.deposit_address.is_some());
    assert_eq!(state.verified, Some(false));
}

#[tokio::test]
async fn balance_failure_becomes_a_notice() {
    let h = Harness::new();
    *h.evm.fail_balance.lock().unwrap() = true;
    h.connect_evm().await;

    let session = TransferSession::new(h.orchestrator.clone());
    session.select_token("USDC", VENUE).await;

    let state = session.state();
    assert_eq!(state.balance, None);
    assert!(state.notice.as_deref().unwrap().contains("USDC"));

    session.dismiss_notice();
    assert!(session.state().notice.is_none());
}

#[tokio::test]
async fn no_wallet_means_no_balance_and_no_notice() {
    let h = Harness::new();
    let session = TransferSession::new(h.orchestrator.clone());
    session.select_token("USDC", VENUE).await;

    let state = session.state();
    assert_eq!(state.balance, None);
    assert!(state.notice.is_none());
}

#[tokio::test]
async fn abandoned_session_publishes_nothing() {
    let h = Harness::new();
    *h.evm.token_balance.lock().unwrap() = usdc(50);
    h.connect_evm().await;

    let session = TransferSession::new(h.orchestrator.clone());
    session.abandon();
    session.select_token("USDC", VENUE).await;

    assert!(!session.is_active());
    assert_eq!(session.state(), SessionState::default());
}

#[tokio::test]
async fn session_without_selection_refuses_to_deposit() {
    let h = Harness::new();
    h.connect_evm().await;

    let session = TransferSession::new(h.orchestrator.clone());
    let err = session.deposit(usdc(10)).await.unwrap_err();
    assert!(matches!(err, BridgeError::UnsupportedToken(_)));
    assert!(h.evm.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn session_deposit_refreshes_balance() {
    let h = Harness::new();
    *h.evm.token_balance.lock().unwrap() = usdc(50);
    h.connect_evm().await;

    let session = TransferSession::new(h.orchestrator.clone());
    session.select_token("USDC", VENUE).await;
    *h.evm.token_balance.lock().unwrap() = usdc(40);

    session.deposit(usdc(10)).await.unwrap();
    assert_eq!(session.state().balance, Some(usdc(40)));
}

// ─── Wallet lifecycle ────────────────────────────────────────────────

#[tokio::test]
async fn disconnect_clears_connection_state() {
    let h = Harness::new();
    h.connect_evm().await;
    assert!(h.connector.state().is_connected());

    h.connector.disconnect().await;

    assert!(!h.connector.state().is_connected());
    assert!(h.connector.current().is_none());
    assert_eq!(h.evm.count("wallet_revokePermissions"), 1);
}

#[tokio::test]
async fn empty_account_list_resets_connection() {
    let h = Harness::new();
    h.connect_evm().await;
    let mut rx = h.connector.subscribe_state();

    h.evm.events.send(ProviderEvent::AccountsChanged(vec![])).unwrap();

    tokio::time::timeout(TIMEOUT, rx.wait_for(|s| !s.is_connected()))
        .await
        .unwrap()
        .unwrap();

    let err = h.orchestrator.balance("USDC").await.unwrap_err();
    assert!(matches!(err, BridgeError::Wallet(_)));
}

#[tokio::test]
async fn watcher_refreshes_balance_when_account_changes() {
    let h = Harness::new();
    *h.evm.token_balance.lock().unwrap() = usdc(50);
    h.connect_evm().await;

    let session = TransferSession::new(h.orchestrator.clone());
    session.select_token("USDC", VENUE).await;
    session.watch_wallet();
    let mut rx = session.subscribe();

    *h.evm.token_balance.lock().unwrap() = usdc(7);
    *h.evm.address.lock().unwrap() = OTHER.to_string();
    h.evm
        .events
        .send(ProviderEvent::AccountsChanged(vec![OTHER.into()]))
        .unwrap();

    tokio::time::timeout(TIMEOUT, rx.wait_for(|s| s.balance == Some(usdc(7))))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(h.connector.current().unwrap().address, OTHER);
}

#[tokio::test]
async fn stale_wallet_is_caught_before_submission() {
    let h = Harness::new();
    *h.evm.token_balance.lock().unwrap() = usdc(50);
    h.connect_evm().await;
    let mut rx = h.connector.subscribe_state();

    *h.evm.address.lock().unwrap() = OTHER.to_string();
    h.evm
        .events
        .send(ProviderEvent::AccountsChanged(vec![OTHER.into()]))
        .unwrap();
    tokio::time::timeout(
        TIMEOUT,
        rx.wait_for(|s| s.wallet().is_some_and(|w| w.address == OTHER)),
    )
    .await
    .unwrap()
    .unwrap();

    // Withdrawals are bound to the venue account, not whatever is connected now.
    let err = h
        .orchestrator
        .withdraw("USDC", VENUE, VENUE, usdc(10))
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::SelfCustodyMismatch { .. }));
}
