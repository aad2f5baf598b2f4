// src/ingest/scheduler.rs
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use crate::ingest::types::FeedProvider;
use crate::ingest::Pipeline;

/// Spawn the periodic cycle loop. The first tick fires immediately, so one
/// cycle runs at startup; subsequent cycles follow the configured interval.
pub fn spawn_cycle_loop(
    pipeline: Arc<Pipeline>,
    providers: Arc<Vec<Box<dyn FeedProvider>>>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            let summary = pipeline.run_cycle(&providers).await;
            info!(
                target: "scheduler",
                processed = summary.processed,
                admitted = summary.admitted,
                failed = summary.failed,
                "ingest tick"
            );
        }
    })
}
