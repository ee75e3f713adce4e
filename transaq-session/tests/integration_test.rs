//! Integration tests for transaq-session.
//!
//! These tests require a running connector bridge logged in to a Transaq
//! demo server. They are ignored by default and can be run with:
//!
//! ```bash
//! cargo test -p transaq-session --test integration_test -- --ignored
//! ```
//!
//! Configuration via environment variables:
//!   TC_BRIDGE_ADDR  (default: 127.0.0.1:50051)
//!   TC_LOGIN, TC_PASSWORD
//!   TC_HOST         (default: tr1-demo5.finam.ru)
//!   TC_PORT         (default: 3939)

use std::time::Duration;

use transaq_session::{Command, ConnectParams, Response, Session, SubSecurity, TransaqClient};

fn bridge_addr() -> String {
    std::env::var("TC_BRIDGE_ADDR").unwrap_or_else(|_| "127.0.0.1:50051".into())
}

fn params() -> ConnectParams {
    ConnectParams {
        login: std::env::var("TC_LOGIN").unwrap_or_default(),
        password: std::env::var("TC_PASSWORD").unwrap_or_default(),
        host: std::env::var("TC_HOST").unwrap_or_else(|_| "tr1-demo5.finam.ru".into()),
        port: std::env::var("TC_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3939),
        rq_delay: 100,
        session_timeout: 120,
        request_timeout: 20,
    }
}

async fn connected_client() -> (TransaqClient, transaq_session::SessionEvents) {
    let (client, mut events) = TransaqClient::connect(&bridge_addr(), params())
        .await
        .expect("Failed to reach the connector bridge");

    let status = tokio::time::timeout(Duration::from_secs(60), async {
        loop {
            let status = events.server_status.recv().await.expect("status channel closed");
            if status.connected.is_connected() {
                return status;
            }
        }
    })
    .await
    .expect("Timed out waiting for connected status");
    assert!(status.connected.is_connected());
    (client, events)
}

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_connect_and_receive_universe() {
    let (client, _events) = connected_client().await;

    // Reference data arrives right after login.
    tokio::time::sleep(Duration::from_secs(5)).await;
    let securities = client.securities().await;
    assert!(!securities.is_empty(), "no securities announced");
    assert!(!client.candle_kinds().await.is_empty(), "no candle kinds announced");

    client.disconnect().await;
}

// ============================================================================
// Market Data Tests
// ============================================================================

#[tokio::test]
#[ignore]
async fn test_history_request() {
    let (client, mut events) = connected_client().await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    let sber = client
        .securities()
        .await
        .into_iter()
        .find(|s| s.sec_code == "SBER" && s.board == "TQBR")
        .expect("SBER not in universe");
    let kind = client.candle_kinds().await.into_iter().next().unwrap();

    client
        .send_command(Command::GetHistoryData {
            sec_id: sber.sec_id,
            period: kind.id,
            count: 10,
            reset: true,
        })
        .await
        .unwrap();

    let candles = tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            if let Some(Response::Candles(c)) = events.responses.recv().await {
                if c.sec_id == sber.sec_id {
                    return c;
                }
            }
        }
    })
    .await
    .expect("Timed out waiting for candles");
    assert!(candles.items.len() <= 10);

    client.disconnect().await;
}

#[tokio::test]
#[ignore]
async fn test_subscribe_quotations() {
    let (client, mut events) = connected_client().await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    let sber = client
        .securities()
        .await
        .into_iter()
        .find(|s| s.sec_code == "SBER" && s.board == "TQBR")
        .expect("SBER not in universe");

    client
        .send_command(Command::Subscribe {
            quotations: vec![SubSecurity {
                sec_id: sber.sec_id,
                board: sber.board.clone(),
                sec_code: sber.sec_code.clone(),
            }],
            all_trades: vec![],
        })
        .await
        .unwrap();

    let got_quotations = tokio::time::timeout(Duration::from_secs(30), async {
        loop {
            if let Some(Response::Quotations(ticks)) = events.responses.recv().await {
                if ticks.iter().any(|t| t.sec_id == sber.sec_id) {
                    return true;
                }
            }
        }
    })
    .await
    .unwrap_or(false);
    // Outside trading hours no quotations arrive.
    println!("received quotations: {got_quotations}");

    client.disconnect().await;
}
