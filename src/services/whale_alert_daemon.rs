use std::collections::HashSet;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, gauge, histogram};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::alerts::formatter::STARTUP_MESSAGE;
use crate::alerts::{classify, render, DedupStore};
use crate::config::AppConfig;
use crate::models::EventIdentity;
use crate::providers::{CoinGeckoClient, TaostatsClient};
use crate::services::notifier::AlertSink;

#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub channel_id: String,
    pub min_amount: Decimal,
    pub poll_interval: Duration,
    pub delivery_delay: Duration,
    pub startup_announcement: bool,
}

impl DaemonSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            channel_id: config.channel_id.clone(),
            min_amount: config.min_whale_amount,
            poll_interval: config.poll_interval(),
            delivery_delay: config.delivery_delay(),
            startup_announcement: config.startup_announcement,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DaemonState {
    /// Between cycles (sleeping, or not started yet).
    #[default]
    Idle,
    /// One fetch → classify → deliver pass in progress.
    Polling,
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub fetched: usize,
    pub duplicates: usize,
    pub delivered: usize,
    pub failed: usize,
    pub provider_unavailable: bool,
    pub finished_at: DateTime<Utc>,
}

/// Snapshot published after every state transition, read by `/health`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DaemonStatus {
    pub state: DaemonState,
    pub cycles: u64,
    pub dedup_size: usize,
    pub last_cycle: Option<CycleReport>,
}

/// One poll cycle:
/// 1. Fetch whale extrinsics and the TAO quote concurrently
/// 2. Skip identities already in `dedup`
/// 3. Classify, render and deliver the rest in provider order
/// 4. Record an identity only after its delivery succeeded
///
/// Provider failures become an empty cycle. Delivery failures are logged and
/// the event stays eligible for the next cycle.
pub async fn run_cycle<S: AlertSink>(
    chain: &TaostatsClient,
    oracle: &CoinGeckoClient,
    sink: &S,
    settings: &DaemonSettings,
    dedup: &mut DedupStore,
) -> CycleReport {
    let start = Instant::now();

    let (fetched, quote) = tokio::join!(
        chain.fetch_recent_large_transactions(settings.min_amount),
        oracle.fetch_quote(),
    );

    let mut provider_unavailable = false;
    let transactions = match fetched {
        Ok(t) => t,
        Err(e) => {
            tracing::warn!(error = %e, "Whale fetch failed, nothing to process this cycle");
            provider_unavailable = true;
            Vec::new()
        }
    };

    if transactions.is_empty() {
        tracing::info!("No whale movements detected");
    }

    let observed_at = Utc::now();
    let mut duplicates = 0usize;
    let mut delivered = 0usize;
    let mut failed = 0usize;
    // Failed sends are retried next cycle, not again for a repeat later in this batch.
    let mut failed_this_cycle: HashSet<EventIdentity> = HashSet::new();
    let mut attempts = 0usize;

    for tx in &transactions {
        let id = tx.identity();

        if dedup.contains(&id) || failed_this_cycle.contains(&id) {
            duplicates += 1;
            counter!("whale_duplicates_skipped_total").increment(1);
            tracing::debug!(kind = %tx.kind, amount = %tx.amount, "Already alerted, skipping");
            continue;
        }

        // Flood control between consecutive sends
        if attempts > 0 && !settings.delivery_delay.is_zero() {
            sleep(settings.delivery_delay).await;
        }
        attempts += 1;

        let alert = classify(tx, &quote, observed_at);
        let text = render(&alert);

        tracing::info!(
            kind = %tx.kind,
            amount = %tx.amount,
            tier = %alert.tier,
            subnet = ?tx.subnet,
            "New whale detected"
        );

        match sink.send_message(&settings.channel_id, &text).await {
            Ok(()) => {
                dedup.record(id);
                dedup.evict_if_over_capacity();
                delivered += 1;
                counter!("whale_alerts_delivered_total").increment(1);
                tracing::info!(channel = %settings.channel_id, "Posted whale alert");
            }
            Err(e) => {
                failed += 1;
                failed_this_cycle.insert(id);
                counter!("whale_alerts_failed_total").increment(1);
                tracing::error!(
                    error = %e,
                    channel = %settings.channel_id,
                    amount = %tx.amount,
                    "Failed to post whale alert, will retry next cycle"
                );
            }
        }
    }

    counter!("whale_poll_cycles_total").increment(1);
    gauge!("dedup_window_size").set(dedup.len() as f64);
    histogram!("poll_cycle_seconds").record(start.elapsed().as_secs_f64());

    if delivered > 0 || failed > 0 {
        tracing::info!(
            fetched = transactions.len(),
            delivered,
            failed,
            duplicates,
            "Whale poll cycle finished"
        );
    }

    CycleReport {
        fetched: transactions.len(),
        duplicates,
        delivered,
        failed,
        provider_unavailable,
        finished_at: Utc::now(),
    }
}

/// Long-running whale alert loop. Owns its dedup window; cycles never overlap.
pub struct WhaleAlertDaemon<S> {
    chain: TaostatsClient,
    oracle: CoinGeckoClient,
    sink: S,
    settings: DaemonSettings,
    dedup: DedupStore,
    state: DaemonState,
    cycles: u64,
    last_cycle: Option<CycleReport>,
    status_tx: watch::Sender<DaemonStatus>,
}

impl<S: AlertSink> WhaleAlertDaemon<S> {
    pub fn new(
        chain: TaostatsClient,
        oracle: CoinGeckoClient,
        sink: S,
        settings: DaemonSettings,
        dedup: DedupStore,
    ) -> Self {
        let (status_tx, _) = watch::channel(DaemonStatus::default());
        Self {
            chain,
            oracle,
            sink,
            settings,
            dedup,
            state: DaemonState::Idle,
            cycles: 0,
            last_cycle: None,
            status_tx,
        }
    }

    /// Status updates for observers that must not touch the daemon itself.
    pub fn subscribe(&self) -> watch::Receiver<DaemonStatus> {
        self.status_tx.subscribe()
    }

    pub fn state(&self) -> DaemonState {
        self.state
    }

    pub fn dedup(&self) -> &DedupStore {
        &self.dedup
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Post the "online" banner. Failure is only a warning.
    pub async fn announce_startup(&self) {
        if let Err(e) = self
            .sink
            .send_message(&self.settings.channel_id, STARTUP_MESSAGE)
            .await
        {
            tracing::warn!(error = %e, "Could not send startup message");
        }
    }

    /// Idle → Polling → Idle.
    pub async fn poll_once(&mut self) -> CycleReport {
        self.transition(DaemonState::Polling);

        let report = run_cycle(
            &self.chain,
            &self.oracle,
            &self.sink,
            &self.settings,
            &mut self.dedup,
        )
        .await;

        self.cycles += 1;
        self.last_cycle = Some(report.clone());
        self.transition(DaemonState::Idle);
        report
    }

    /// Poll until `shutdown` flips to `true`.
    ///
    /// A cycle in progress always runs to completion, deliveries included,
    /// and no further fetch happens afterwards. The sleep between cycles is
    /// not waited out: a shutdown request cuts it short.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            channel = %self.settings.channel_id,
            interval_secs = self.settings.poll_interval.as_secs(),
            min_amount = %self.settings.min_amount,
            dedup_capacity = self.dedup.capacity(),
            "Whale alert daemon started"
        );

        if self.settings.startup_announcement {
            self.announce_startup().await;
        }

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.poll_once().await;

            tokio::select! {
                _ = sleep(self.settings.poll_interval) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::warn!("Shutdown channel closed, stopping");
                        break;
                    }
                }
            }
        }

        tracing::info!(cycles = self.cycles, "Whale alert daemon stopped");
    }

    fn transition(&mut self, next: DaemonState) {
        tracing::debug!(from = ?self.state, to = ?next, "Daemon state transition");
        self.state = next;
        self.status_tx.send_replace(DaemonStatus {
            state: next,
            cycles: self.cycles,
            dedup_size: self.dedup.len(),
            last_cycle: self.last_cycle.clone(),
        });
    }
}
