//! Periodic security alert detector.
//!
//! Spawns a background task that runs the correlation sweep on a fixed
//! interval using `tokio::time::interval`. Runs until cancelled.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::alerts;

/// Run the alert detector loop.
///
/// Sweeps every `interval_secs` seconds until `cancel` is triggered. A
/// failing sweep is logged and the loop keeps going; one bad pass must
/// not kill the detector.
pub async fn run(pool: PgPool, interval_secs: u64, cancel: CancellationToken) {
    tracing::info!(interval_secs, "Alert detector started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Alert detector stopping");
                break;
            }
            _ = interval.tick() => {
                match alerts::run_sweep(&pool).await {
                    Ok(summary) => {
                        if summary.total() == 0 {
                            tracing::debug!("Detector sweep raised no alerts");
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Detector sweep failed");
                    }
                }
            }
        }
    }
}
