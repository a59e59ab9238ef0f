#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use taowhale::alerts::DedupStore;
use taowhale::providers::{build_http_client, CoinGeckoClient, TaostatsClient};
use taowhale::services::{AlertSink, DaemonSettings, DeliveryError, Notifier, WhaleAlertDaemon};

pub const BOT_TOKEN: &str = "TEST";
pub const CHANNEL: &str = "@TestWhaleAlerts";

/// Stand-in for TaoStats, CoinGecko and the Telegram Bot API.
#[derive(Default)]
pub struct MockUpstream {
    pub extrinsics: Mutex<Value>,
    pub extrinsic_status: AtomicU16,
    pub extrinsic_delay_ms: AtomicU64,
    pub extrinsic_requests: AtomicUsize,
    pub last_authorization: Mutex<Option<String>>,
    pub last_query: Mutex<HashMap<String, String>>,
    pub balances: Mutex<Value>,
    pub stakes: Mutex<Value>,
    pub subnets: Mutex<Value>,
    pub price: Mutex<Value>,
    pub price_status: AtomicU16,
    pub telegram_status: AtomicU16,
    pub telegram_messages: Mutex<Vec<Value>>,
}

impl MockUpstream {
    pub fn new() -> Arc<Self> {
        let mock = Self::default();
        mock.extrinsic_status.store(200, Ordering::SeqCst);
        mock.price_status.store(200, Ordering::SeqCst);
        mock.telegram_status.store(200, Ordering::SeqCst);
        *mock.extrinsics.lock().unwrap() = json!({ "data": [] });
        *mock.balances.lock().unwrap() = json!({ "data": [] });
        *mock.stakes.lock().unwrap() = json!({ "data": [] });
        *mock.subnets.lock().unwrap() = json!({ "data": [] });
        *mock.price.lock().unwrap() = json!({
            "bittensor": { "usd": 285, "eur": 262.5, "usd_24h_change": 1.25 }
        });
        Arc::new(mock)
    }

    pub fn set_extrinsics(&self, records: Value) {
        *self.extrinsics.lock().unwrap() = json!({ "data": records });
    }

    pub fn telegram_texts(&self) -> Vec<String> {
        self.telegram_messages
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| m["text"].as_str().map(str::to_string))
            .collect()
    }
}

fn status(code: &AtomicU16) -> StatusCode {
    StatusCode::from_u16(code.load(Ordering::SeqCst)).unwrap_or(StatusCode::OK)
}

async fn extrinsics(
    State(mock): State<Arc<MockUpstream>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    mock.extrinsic_requests.fetch_add(1, Ordering::SeqCst);
    *mock.last_authorization.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    *mock.last_query.lock().unwrap() = query;

    let delay = mock.extrinsic_delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let body = mock.extrinsics.lock().unwrap().clone();
    (status(&mock.extrinsic_status), Json(body))
}

async fn balances(State(mock): State<Arc<MockUpstream>>) -> Json<Value> {
    Json(mock.balances.lock().unwrap().clone())
}

async fn stakes(State(mock): State<Arc<MockUpstream>>) -> Json<Value> {
    Json(mock.stakes.lock().unwrap().clone())
}

async fn subnets(
    State(mock): State<Arc<MockUpstream>>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    *mock.last_query.lock().unwrap() = query;
    Json(mock.subnets.lock().unwrap().clone())
}

async fn price(State(mock): State<Arc<MockUpstream>>) -> (StatusCode, Json<Value>) {
    let body = mock.price.lock().unwrap().clone();
    (status(&mock.price_status), Json(body))
}

async fn send_message(
    State(mock): State<Arc<MockUpstream>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let code = status(&mock.telegram_status);
    if code.is_success() {
        mock.telegram_messages.lock().unwrap().push(body);
        return (code, Json(json!({ "ok": true, "result": {} })));
    }

    let mut reply = json!({
        "ok": false,
        "error_code": code.as_u16(),
        "description": "Too Many Requests: retry after 7",
    });
    if code == StatusCode::TOO_MANY_REQUESTS {
        reply["parameters"] = json!({ "retry_after": 7 });
    } else {
        reply["description"] = json!("Bad Request: chat not found");
    }
    (code, Json(reply))
}

/// Serve the mock on an ephemeral port and return its base URL.
pub async fn spawn_upstream(mock: Arc<MockUpstream>) -> String {
    let app = Router::new()
        .route("/api/v1/extrinsic/latest", get(extrinsics))
        .route("/api/v1/balance/latest", get(balances))
        .route("/api/v1/stake/latest", get(stakes))
        .route("/api/v1/subnet/latest", get(subnets))
        .route("/cg/simple/price", get(price))
        .route(&format!("/tg/bot{BOT_TOKEN}/sendMessage"), post(send_message))
        .with_state(mock);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock upstream");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

pub fn http_client() -> reqwest::Client {
    build_http_client(Duration::from_secs(5)).unwrap()
}

pub fn taostats(base: &str, api_key: Option<&str>) -> TaostatsClient {
    TaostatsClient::new(http_client(), api_key.map(str::to_string))
        .with_base_url(format!("{base}/api"))
        .with_limits(50, 10)
}

pub fn coingecko(base: &str) -> CoinGeckoClient {
    CoinGeckoClient::new(http_client()).with_base_url(format!("{base}/cg"))
}

pub fn notifier(base: &str) -> Notifier {
    Notifier::new(http_client(), BOT_TOKEN.into()).with_api_base(format!("{base}/tg"))
}

pub fn settings() -> DaemonSettings {
    DaemonSettings {
        channel_id: CHANNEL.into(),
        min_amount: Decimal::from(10_000),
        poll_interval: Duration::from_millis(20),
        delivery_delay: Duration::ZERO,
        startup_announcement: false,
    }
}

pub fn daemon<S: AlertSink>(base: &str, sink: S, capacity: usize) -> WhaleAlertDaemon<S> {
    WhaleAlertDaemon::new(
        taostats(base, Some("key")),
        coingecko(base),
        sink,
        settings(),
        DedupStore::new(capacity),
    )
}

/// A TaoStats extrinsic record; `tao` is converted to rao.
pub fn extrinsic(call: &str, tao: u64, from: &str, netuid: Option<u16>, ts: &str) -> Value {
    json!({
        "call": call,
        "amount": (tao * 1_000_000_000).to_string(),
        "from": from,
        "netuid": netuid,
        "block_timestamp": ts,
    })
}

/// Sink that records every message and can be told to fail.
#[derive(Default, Clone)]
pub struct RecordingSink {
    pub sent: Arc<Mutex<Vec<(String, String)>>>,
    pub sent_at: Arc<Mutex<Vec<Instant>>>,
    pub fail_remaining: Arc<AtomicUsize>,
}

impl RecordingSink {
    pub fn fail_next(&self, n: usize) {
        self.fail_remaining.store(n, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    /// Gaps between consecutive successful sends.
    pub fn gaps(&self) -> Vec<Duration> {
        self.sent_at
            .lock()
            .unwrap()
            .windows(2)
            .map(|w| w[1] - w[0])
            .collect()
    }
}

impl AlertSink for RecordingSink {
    async fn send_message(&self, destination: &str, text: &str) -> Result<(), DeliveryError> {
        let failing = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(DeliveryError::RateLimited {
                retry_after: Some(Duration::from_secs(3)),
            });
        }
        self.sent_at.lock().unwrap().push(Instant::now());
        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), text.to_string()));
        Ok(())
    }
}
