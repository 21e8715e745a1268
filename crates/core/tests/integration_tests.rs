// ═══════════════════════════════════════════════════════════════════
// Integration Tests — CotacaoApp facade against a mocked backend
// ═══════════════════════════════════════════════════════════════════

use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;

use cotacao_core::services::quotation_sync::FetchPhase;
use cotacao_core::storage::token::MemoryTokenStore;
use cotacao_core::CotacaoApp;

fn quotation_body(source: &str, target: &str, rate: f64) -> serde_json::Value {
    json!({
        "moeda_origem": source,
        "moeda_destino": target,
        "taxa_cambio": rate,
        "data_cotacao": "2025-08-25T14:30:00",
        "fonte": "api_externa"
    })
}

/// Poll a condition until it holds or a real-time deadline passes. The
/// facade spawns its fetches, so tests have to wait for them to land.
macro_rules! eventually {
    ($condition:expr, $what:literal) => {
        let mut settled = false;
        for _ in 0..150 {
            if $condition {
                settled = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(settled, "timed out waiting for {}", $what);
    };
}

#[tokio::test]
async fn fiat_sync_fetches_and_settles_on_startup() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/cotacao")
                .query_param("moeda_origem", "USD")
                .query_param("moeda_destino", "BRL");
            then.status(200).json_body(quotation_body("USD", "BRL", 5.1));
        })
        .await;

    let app = CotacaoApp::new(server.base_url(), Arc::new(MemoryTokenStore::new()));
    let engine = app.start_fiat_sync("USD", "BRL");

    eventually!(
        engine.lock().await.phase() == FetchPhase::Settled,
        "the fiat quotation to settle"
    );

    let mut guard = engine.lock().await;
    assert_eq!(guard.quotation().unwrap().exchange_rate, 5.1);
    assert!(guard.notice_visible());

    guard.edit_source_amount("100");
    assert_eq!(guard.conversion().target_amount(), "510.00");
}

#[tokio::test]
async fn fiat_sync_for_a_self_pair_stays_idle() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/cotacao");
            then.status(200).json_body(quotation_body("USD", "USD", 1.0));
        })
        .await;

    let app = CotacaoApp::new(server.base_url(), Arc::new(MemoryTokenStore::new()));
    let engine = app.start_fiat_sync("USD", "USD");

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(engine.lock().await.phase(), FetchPhase::Idle);
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn crypto_sync_polls_immediately_and_stops_on_drop() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/cripto/ambas-brl");
            then.status(200).json_body(json!({
                "USDT": {
                    "simbolo": "USDT",
                    "moeda_destino": "BRL",
                    "taxa_cambio": 5.52,
                    "data_cotacao": "2025-08-25T14:30:00",
                    "fonte": "Binance API"
                }
            }));
        })
        .await;

    let app = CotacaoApp::new(server.base_url(), Arc::new(MemoryTokenStore::new()));
    let (engine, subscription) = app.start_crypto_sync();

    eventually!(
        engine.lock().await.quotations().is_some(),
        "the crypto batch to settle"
    );
    assert_eq!(mock.hits_async().await, 1);

    drop(subscription);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(mock.hits_async().await, 1, "no polling after drop");
}

#[tokio::test]
async fn history_flows_through_the_facade() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/cotacao/historico");
            then.status(200).json_body(json!([
                quotation_body("USD", "BRL", 5.12),
                quotation_body("EUR", "BRL", 6.03),
            ]));
        })
        .await;

    let app = CotacaoApp::new(server.base_url(), Arc::new(MemoryTokenStore::new()));
    let history = app.fetch_history().await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn login_persists_a_token_that_a_later_app_instance_restores() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/auth/login");
            then.status(200)
                .json_body(json!({"access_token": "jwt-abc", "token_type": "bearer"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/auth/me")
                .header("authorization", "Bearer jwt-abc");
            then.status(200)
                .json_body(json!({"email": "ana@example.com", "full_name": "Ana Souza"}));
        })
        .await;

    let store = Arc::new(MemoryTokenStore::new());

    let mut app = CotacaoApp::new(server.base_url(), store.clone());
    app.session_mut()
        .login("ana@example.com", "secret1")
        .await
        .unwrap();
    assert!(app.session().is_authenticated());

    // a fresh instance sharing the store picks the session back up
    let mut next = CotacaoApp::new(server.base_url(), store);
    next.session_mut().restore().await;
    assert!(next.session().is_authenticated());
    assert_eq!(next.session().user().unwrap().email, "ana@example.com");
}
