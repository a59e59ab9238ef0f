use std::sync::Arc;

use tokio::sync::watch;

use taowhale::alerts::DedupStore;
use taowhale::api::router::create_router;
use taowhale::config::AppConfig;
use taowhale::providers::{build_http_client, CoinGeckoClient, TaostatsClient};
use taowhale::services::{DaemonSettings, Notifier, WhaleAlertDaemon};
use taowhale::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration, daemon not started");
            return Err(e.into());
        }
    };

    let http = build_http_client(config.http_timeout())?;

    let chain = TaostatsClient::new(http.clone(), config.taostats_api_key.clone())
        .with_base_url(config.taostats_base_url.clone())
        .with_limits(config.extrinsic_page_size, config.max_alerts_per_poll);
    if !chain.is_authenticated() {
        tracing::warn!("TAOSTATS_API_KEY not set, TaoStats requests will be unauthenticated");
    }

    let oracle = CoinGeckoClient::new(http.clone()).with_base_url(config.coingecko_base_url.clone());
    let notifier = Notifier::new(http, config.bot_token.clone())
        .with_api_base(config.telegram_api_url.clone());

    let metrics_handle = taowhale::metrics::init_metrics()?;

    let daemon = WhaleAlertDaemon::new(
        chain.clone(),
        oracle.clone(),
        notifier.clone(),
        DaemonSettings::from_config(&config),
        DedupStore::new(config.dedup_capacity),
    );

    // --- Operational API (health, metrics, on-demand digest) ---
    if let Some(port) = config.port {
        let state = AppState {
            chain,
            oracle,
            notifier: Arc::new(notifier),
            status: daemon.subscribe(),
            metrics_handle,
            api_token: config.api_token.clone(),
            min_whale_amount: config.min_whale_amount,
        };
        let addr = format!("{}:{}", config.host, port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Server listening on {addr}");

        let router = create_router(state);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "HTTP server stopped");
            }
        });
    }

    // --- Shutdown: checked by the daemon between cycles ---
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                // A dropped sender would stop the daemon; hold it for the process lifetime.
                let _keep = shutdown_tx;
                std::future::pending::<()>().await;
            }
        }
    });

    daemon.run(shutdown_rx).await;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
