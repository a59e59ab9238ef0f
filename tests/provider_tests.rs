mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::json;

use common::{extrinsic, MockUpstream};
use taowhale::models::{PriceQuote, TxKind};
use taowhale::providers::{build_http_client, ProviderError, TaostatsClient};
use taowhale::services::DeliveryError;

const ADDR: &str = "5F3sa2TJAWMqDhXG6jhV4N8ko9SxwGy8TpaNS1repo5EYjQX";
const T1: &str = "2025-03-01T12:30:00Z";

// ---------------------------------------------------------------------------
// TaoStats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_whale_fetch_filters_scales_and_caps() {
    let mock = MockUpstream::new();
    let mut records: Vec<_> = (0..12)
        .map(|i| extrinsic("add_stake", 10_000 + i, ADDR, Some(1), T1))
        .collect();
    records.insert(0, extrinsic("transfer", 500, ADDR, None, T1));
    mock.set_extrinsics(json!(records));
    let base = common::spawn_upstream(mock.clone()).await;

    let client = common::taostats(&base, Some("secret"));
    let whales = client
        .fetch_recent_large_transactions(Decimal::from(10_000))
        .await
        .unwrap();

    assert_eq!(whales.len(), 10);
    assert_eq!(whales[0].amount, Decimal::from(10_000));
    assert_eq!(whales[9].amount, Decimal::from(10_009));
    assert!(whales.iter().all(|w| w.kind == TxKind::Stake));
    assert_eq!(whales[0].source, ADDR);

    let query = mock.last_query.lock().unwrap().clone();
    assert_eq!(query.get("module").map(String::as_str), Some("subtensorModule"));
    assert_eq!(query.get("limit").map(String::as_str), Some("50"));
    assert_eq!(
        mock.last_authorization.lock().unwrap().as_deref(),
        Some("Bearer secret")
    );
}

#[tokio::test]
async fn test_unauthenticated_request_is_still_attempted() {
    let mock = MockUpstream::new();
    mock.extrinsic_status.store(401, Ordering::SeqCst);
    let base = common::spawn_upstream(mock.clone()).await;

    let client = common::taostats(&base, None);
    assert!(!client.is_authenticated());

    let result = client
        .fetch_recent_large_transactions(Decimal::from(10_000))
        .await;

    assert!(matches!(result, Err(ProviderError::Status(401))));
    assert_eq!(mock.extrinsic_requests.load(Ordering::SeqCst), 1);
    assert_eq!(mock.last_authorization.lock().unwrap().as_deref(), Some(""));
}

#[tokio::test]
async fn test_envelope_without_data_is_malformed() {
    let mock = MockUpstream::new();
    *mock.extrinsics.lock().unwrap() = json!({ "error": "maintenance" });
    let base = common::spawn_upstream(mock.clone()).await;

    let result = common::taostats(&base, None)
        .fetch_recent_large_transactions(Decimal::from(10_000))
        .await;

    assert!(matches!(result, Err(ProviderError::Malformed(_))));
}

#[tokio::test]
async fn test_slow_provider_times_out() {
    let mock = MockUpstream::new();
    mock.extrinsic_delay_ms.store(2_000, Ordering::SeqCst);
    let base = common::spawn_upstream(mock.clone()).await;

    let http = build_http_client(Duration::from_millis(200)).unwrap();
    let client = TaostatsClient::new(http, None).with_base_url(format!("{base}/api"));

    let result = client
        .fetch_recent_large_transactions(Decimal::from(10_000))
        .await;

    assert!(matches!(result, Err(ProviderError::Timeout)));
}

#[tokio::test]
async fn test_wallet_balance() {
    let mock = MockUpstream::new();
    *mock.balances.lock().unwrap() = json!({
        "data": [{
            "balance": "2000000000000",
            "stake": 1_500_000_000_000u64,
            "free": "500000000000"
        }]
    });
    let base = common::spawn_upstream(mock.clone()).await;

    let balance = common::taostats(&base, None)
        .fetch_wallet_balance(ADDR)
        .await
        .unwrap()
        .expect("balance should exist");

    assert_eq!(balance.address, ADDR);
    assert_eq!(balance.balance, Decimal::from(2_000));
    assert_eq!(balance.stake, Decimal::from(1_500));
    assert_eq!(balance.free, Decimal::from(500));
}

#[tokio::test]
async fn test_unknown_wallet_has_no_balance() {
    let mock = MockUpstream::new();
    let base = common::spawn_upstream(mock.clone()).await;

    let balance = common::taostats(&base, None)
        .fetch_wallet_balance(ADDR)
        .await
        .unwrap();

    assert!(balance.is_none());
}

#[tokio::test]
async fn test_wallet_stakes_skip_bad_records() {
    let mock = MockUpstream::new();
    *mock.stakes.lock().unwrap() = json!({
        "data": [
            { "netuid": 19, "hotkey": "5Hotkey", "stake": "250000000000" },
            { "netuid": 3, "hotkey": "5Other", "stake": "-1" },
        ]
    });
    let base = common::spawn_upstream(mock.clone()).await;

    let stakes = common::taostats(&base, None)
        .fetch_wallet_stakes(ADDR)
        .await
        .unwrap();

    assert_eq!(stakes.len(), 1);
    assert_eq!(stakes[0].subnet_id, Some(19));
    assert_eq!(stakes[0].stake, Decimal::from(250));
}

#[tokio::test]
async fn test_subnets_and_detail() {
    let mock = MockUpstream::new();
    *mock.subnets.lock().unwrap() = json!({
        "data": [
            { "netuid": 1, "name": "Apex", "emission": "0.05", "tempo": 360, "owner": "5Owner", "n": 200, "max_n": 256 },
            { "netuid": 7 },
        ]
    });
    let base = common::spawn_upstream(mock.clone()).await;
    let client = common::taostats(&base, None);

    let subnets = client.fetch_subnets(20).await.unwrap();
    assert_eq!(subnets.len(), 2);
    assert_eq!(subnets[0].name, "Apex");
    assert_eq!(subnets[0].emission, Decimal::new(5, 2));
    assert_eq!(subnets[1].name, "SN7");
    assert_eq!(
        mock.last_query.lock().unwrap().get("limit").map(String::as_str),
        Some("20")
    );

    let detail = client.fetch_subnet_detail(1).await.unwrap().unwrap();
    assert_eq!(detail.subnet.netuid, 1);
    assert_eq!(detail.miners, 200);
    assert_eq!(detail.max_n, 256);
    assert_eq!(
        mock.last_query.lock().unwrap().get("netuid").map(String::as_str),
        Some("1")
    );
}

// ---------------------------------------------------------------------------
// CoinGecko
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_price_quote() {
    let mock = MockUpstream::new();
    let base = common::spawn_upstream(mock.clone()).await;

    let quote = common::coingecko(&base).fetch_quote().await;

    assert_eq!(quote.usd, Decimal::from(285));
    assert_eq!(quote.eur, Decimal::new(2625, 1));
    assert_eq!(quote.change_24h_percent, Decimal::new(125, 2));
}

#[tokio::test]
async fn test_price_failure_returns_zero_quote() {
    let mock = MockUpstream::new();
    mock.price_status.store(500, Ordering::SeqCst);
    let base = common::spawn_upstream(mock.clone()).await;
    let client = common::coingecko(&base);

    assert!(client.try_fetch_quote().await.is_err());

    let quote = client.fetch_quote().await;
    assert_eq!(quote, PriceQuote::zero());
    assert!(quote.is_unknown());
}

#[tokio::test]
async fn test_price_without_coin_entry_is_unknown() {
    let mock = MockUpstream::new();
    *mock.price.lock().unwrap() = json!({});
    let base = common::spawn_upstream(mock.clone()).await;

    let quote = common::coingecko(&base).fetch_quote().await;
    assert!(quote.is_unknown());
}

// ---------------------------------------------------------------------------
// Telegram
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_notifier_sends_markdown() {
    let mock = MockUpstream::new();
    let base = common::spawn_upstream(mock.clone()).await;

    common::notifier(&base)
        .send("12345", "*hello*")
        .await
        .unwrap();

    let sent = mock.telegram_messages.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["chat_id"], "12345");
    assert_eq!(sent[0]["text"], "*hello*");
    assert_eq!(sent[0]["parse_mode"], "Markdown");
}

#[tokio::test]
async fn test_notifier_flood_control() {
    let mock = MockUpstream::new();
    mock.telegram_status.store(429, Ordering::SeqCst);
    let base = common::spawn_upstream(mock.clone()).await;

    let err = common::notifier(&base).send("12345", "hi").await.unwrap_err();

    match err {
        DeliveryError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(7)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_notifier_rejection() {
    let mock = MockUpstream::new();
    mock.telegram_status.store(400, Ordering::SeqCst);
    let base = common::spawn_upstream(mock.clone()).await;

    let err = common::notifier(&base).send("nowhere", "hi").await.unwrap_err();

    match err {
        DeliveryError::Rejected { status, description } => {
            assert_eq!(status, 400);
            assert_eq!(description, "Bad Request: chat not found");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_notifier_unreachable() {
    // Nothing listens on port 1
    let err = common::notifier("http://127.0.0.1:1")
        .send("12345", "hi")
        .await
        .unwrap_err();

    match err {
        DeliveryError::Transport(msg) => assert!(!msg.contains(common::BOT_TOKEN)),
        other => panic!("expected Transport, got {other:?}"),
    }
}
