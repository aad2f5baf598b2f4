//! News triage service — binary entrypoint.
//! Loads the pipeline config, wires the collaborators, and runs the periodic
//! ingestion loop. See `README.md` for quickstart.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use news_triage::classify::build_classifier;
use news_triage::config::PipelineConfig;
use news_triage::extract::{ArticleExtractor, HttpExtractor};
use news_triage::ingest::providers::rss::RssFeedProvider;
use news_triage::ingest::scheduler::spawn_cycle_loop;
use news_triage::ingest::types::FeedProvider;
use news_triage::ingest::Pipeline;
use news_triage::sink::{HttpIngestSink, MemorySink, VerdictSink};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

/// Expose /metrics when TRIAGE_METRICS_PORT is set.
fn init_metrics() {
    if let Ok(port) = std::env::var("TRIAGE_METRICS_PORT") {
        if let Ok(port) = port.parse::<u16>() {
            if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new()
                .with_http_listener(([0, 0, 0, 0], port))
                .install()
            {
                tracing::warn!(error = ?e, "prometheus exporter failed to start");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();
    init_metrics();

    // Malformed config is fatal; silently degrading would invalidate every
    // verdict produced afterwards.
    let config = PipelineConfig::load().context("loading pipeline config")?;

    let classifier = build_classifier(&config.classifier);
    let extractor: Arc<dyn ArticleExtractor> =
        Arc::new(HttpExtractor::new(config.extractor.timeout_secs));
    let sink: Arc<dyn VerdictSink> = match &config.sink.ingest_url {
        Some(url) => Arc::new(HttpIngestSink::new(
            url,
            config.sink.timeout_secs.unwrap_or(10),
        )),
        None => {
            tracing::warn!("no sink.ingest_url configured; using in-memory sink");
            Arc::new(MemorySink::new())
        }
    };

    let http = reqwest::Client::builder()
        .user_agent("news-triage/0.1")
        .connect_timeout(Duration::from_secs(4))
        .timeout(Duration::from_secs(20))
        .build()
        .context("building feed http client")?;
    let providers: Vec<Box<dyn FeedProvider>> = config
        .feeds
        .sources
        .iter()
        .map(|f| {
            Box::new(RssFeedProvider::from_url(&f.source, &f.url, http.clone()))
                as Box<dyn FeedProvider>
        })
        .collect();
    if providers.is_empty() {
        tracing::warn!("no feeds configured; the cycle loop will be idle");
    }

    let interval = config.feeds.interval_secs;
    let pipeline = Arc::new(Pipeline::new(config, classifier, extractor, sink));

    tracing::info!(interval_secs = interval, "triage scheduler starting");
    let handle = spawn_cycle_loop(pipeline, Arc::new(providers), interval);
    handle.await.context("scheduler task ended")?;
    Ok(())
}
