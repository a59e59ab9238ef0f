use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus recorder: {e}"))?;

    // Pre-register counters so they appear even before the first increment.
    counter!("whale_poll_cycles_total").absolute(0);
    counter!("whale_alerts_delivered_total").absolute(0);
    counter!("whale_alerts_failed_total").absolute(0);
    counter!("whale_duplicates_skipped_total").absolute(0);
    counter!("malformed_records_total").absolute(0);
    counter!("provider_errors_total", "provider" => "taostats").absolute(0);
    counter!("provider_errors_total", "provider" => "coingecko").absolute(0);

    gauge!("dedup_window_size").set(0.0);

    // Histogram is lazily created on first record; force creation.
    histogram!("poll_cycle_seconds").record(0.0);

    Ok(handle)
}
