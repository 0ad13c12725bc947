use chrono::{TimeZone, Utc};
use escrow_settlement::application::engine::SettlementEngine;
use escrow_settlement::domain::escrow::{EscrowStatus, EscrowTransaction};
use escrow_settlement::domain::money::Balance;
use escrow_settlement::domain::order::{Order, OrderStatus, PaymentStatus};
use escrow_settlement::domain::ports::SettlementStore;
use escrow_settlement::domain::vendor::Vendor;
use escrow_settlement::infrastructure::in_memory::InMemoryStore;
use escrow_settlement::interfaces::json::api::SettlementApi;
use escrow_settlement::interfaces::json::command_reader::SettlementCommand;
use rust_decimal_macros::dec;
use std::sync::Arc;

async fn seeded_store() -> InMemoryStore {
    let now = Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap();
    let store = InMemoryStore::new();
    store
        .insert_vendor(Vendor::new("V1", Balance::new(dec!(10000))))
        .await
        .unwrap();
    store.insert_order(Order::paid("O1", now)).await.unwrap();
    store
        .insert_escrow(EscrowTransaction::held("E1", "O1", "V1", dec!(5000), now))
        .await
        .unwrap();
    store
}

fn api(store: &InMemoryStore) -> SettlementApi {
    SettlementApi::new(SettlementEngine::new(Arc::new(store.clone())))
}

fn command(body: &str) -> SettlementCommand {
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_release_scenario() {
    let store = seeded_store().await;
    let api = api(&store);

    let response = api
        .handle(command(
            r#"{"op":"release","orderId":"O1","releaseType":"manual_buyer","notes":"Confirmed","performedByUserId":"U9"}"#,
        ))
        .await;

    assert!(response.success);
    assert_eq!(response.status, 200);
    assert_eq!(
        response.message.as_deref(),
        Some("Escrow released. Vendor V1 credited 5000.")
    );

    let escrow = store.find_escrow_by_order("O1").await.unwrap().unwrap();
    assert_eq!(escrow.record.status, EscrowStatus::Released);

    let vendor = store.get_vendor("V1").await.unwrap().unwrap();
    assert_eq!(vendor.record.wallet_balance, Balance::new(dec!(15000)));
    assert_eq!(vendor.record.total_sales, 1);

    let ledger = store.ledger_for_vendor("V1").await.unwrap();
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].amount, dec!(5000));
    assert_eq!(ledger[0].balance_after, dec!(15000));
    assert_eq!(ledger[0].reference, "ESCROW-E1");

    let order = store.get_order("O1").await.unwrap().unwrap();
    assert_eq!(order.record.status, OrderStatus::Delivered);
    assert_eq!(order.record.escrow_status, EscrowStatus::Released);
}

#[tokio::test]
async fn test_refund_scenario() {
    let store = seeded_store().await;
    let api = api(&store);

    let response = api
        .handle(command(
            r#"{"op":"refund","orderId":"O1","reason":"Item not received","performedByUserId":"U9"}"#,
        ))
        .await;

    assert!(response.success);
    assert_eq!(
        response.message.as_deref(),
        Some("Escrow refunded. Order O1 cancelled.")
    );

    let escrow = store.find_escrow_by_order("O1").await.unwrap().unwrap();
    assert_eq!(escrow.record.status, EscrowStatus::Refunded);
    assert_eq!(escrow.record.refunded_by.as_deref(), Some("U9"));

    let vendor = store.get_vendor("V1").await.unwrap().unwrap();
    assert_eq!(vendor.record.wallet_balance, Balance::new(dec!(10000)));
    assert!(store.ledger_for_vendor("V1").await.unwrap().is_empty());

    let order = store.get_order("O1").await.unwrap().unwrap();
    assert_eq!(order.record.status, OrderStatus::Cancelled);
    assert_eq!(order.record.payment_status, PaymentStatus::Refunded);
    assert_eq!(order.record.escrow_status, EscrowStatus::Refunded);
}

#[tokio::test]
async fn test_terminal_states_are_mutually_exclusive() {
    let store = seeded_store().await;
    let api = api(&store);

    let first = api
        .handle(command(r#"{"op":"release","orderId":"O1"}"#))
        .await;
    assert!(first.success);

    let second = api
        .handle(command(r#"{"op":"refund","orderId":"O1"}"#))
        .await;
    assert!(!second.success);
    assert_eq!(second.status, 409);
    assert_eq!(
        second.error.as_deref(),
        Some("Escrow status is 'released', cannot refund.")
    );

    // The refund attempt changed nothing.
    let escrow = store.find_escrow_by_order("O1").await.unwrap().unwrap();
    assert_eq!(escrow.record.status, EscrowStatus::Released);
    let vendor = store.get_vendor("V1").await.unwrap().unwrap();
    assert_eq!(vendor.record.wallet_balance, Balance::new(dec!(15000)));
}
