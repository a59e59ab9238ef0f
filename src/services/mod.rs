pub mod notifier;
pub mod whale_alert_daemon;

pub use notifier::{AlertSink, DeliveryError, Notifier};
pub use whale_alert_daemon::{
    run_cycle, CycleReport, DaemonSettings, DaemonState, DaemonStatus, WhaleAlertDaemon,
};
