// src/sink.rs
//! Verdict delivery. The sink owns URL uniqueness; the pipeline's existence
//! pre-check is advisory only and concurrent writers racing on the same URL
//! must resolve through the sink's own insert-if-absent semantics.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::types::Verdict;

/// What the sink did with a delivered record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Stored,
    /// Duplicate URL; the sink kept its existing record.
    Ignored,
}

#[async_trait]
pub trait VerdictSink: Send + Sync {
    /// Advisory duplicate pre-check. Best-effort: a `false` here does not
    /// guarantee the later insert will store.
    async fn exists(&self, url: &str) -> Result<bool>;
    async fn deliver(&self, verdict: &Verdict) -> Result<Delivery>;
    fn name(&self) -> &'static str;
}

// ------------------------------------------------------------
// HTTP ingestion API sink
// ------------------------------------------------------------

/// Posts each verdict as JSON to an ingestion API with a bearer secret.
/// The remote enforces URL uniqueness and reports duplicates as "ignored".
pub struct HttpIngestSink {
    http: reqwest::Client,
    ingest_url: String,
}

impl HttpIngestSink {
    /// Secret comes from `INGEST_SECRET`.
    pub fn new(ingest_url: &str, timeout_secs: u64) -> Self {
        let secret = std::env::var("INGEST_SECRET").unwrap_or_default();
        let mut headers = reqwest::header::HeaderMap::new();
        if let Ok(value) =
            reqwest::header::HeaderValue::from_str(&format!("Bearer {secret}"))
        {
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        let http = reqwest::Client::builder()
            .user_agent("news-triage/0.1")
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("reqwest client");
        Self {
            http,
            ingest_url: ingest_url.to_string(),
        }
    }
}

#[async_trait]
impl VerdictSink for HttpIngestSink {
    async fn exists(&self, _url: &str) -> Result<bool> {
        // The ingestion API has no existence endpoint; duplicates surface as
        // "ignored" on insert, which is the authoritative path anyway.
        Ok(false)
    }

    async fn deliver(&self, verdict: &Verdict) -> Result<Delivery> {
        #[derive(Deserialize)]
        struct Resp {
            status: Option<String>,
            #[allow(dead_code)]
            id: Option<i64>,
        }

        let resp = self
            .http
            .post(&self.ingest_url)
            .json(verdict)
            .send()
            .await
            .context("posting verdict to ingestion API")?;
        if !resp.status().is_success() {
            return Err(anyhow!(
                "ingestion API returned {} for {}",
                resp.status(),
                verdict.url
            ));
        }
        let body: Resp = resp.json().await.context("ingestion API response")?;
        if body.status.as_deref() == Some("ignored") {
            info!(target: "sink", url = %verdict.url, "duplicate ignored by remote");
            return Ok(Delivery::Ignored);
        }
        Ok(Delivery::Stored)
    }

    fn name(&self) -> &'static str {
        "ingest-api"
    }
}

// ------------------------------------------------------------
// In-memory sink
// ------------------------------------------------------------

/// Insert-if-absent map keyed by URL. Used for dry runs and tests; its
/// uniqueness behavior mirrors the remote's ON CONFLICT DO NOTHING.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<HashMap<String, Verdict>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("sink lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, url: &str) -> Option<Verdict> {
        self.records.lock().expect("sink lock").get(url).cloned()
    }
}

#[async_trait]
impl VerdictSink for MemorySink {
    async fn exists(&self, url: &str) -> Result<bool> {
        Ok(self.records.lock().expect("sink lock").contains_key(url))
    }

    async fn deliver(&self, verdict: &Verdict) -> Result<Delivery> {
        let mut guard = self.records.lock().expect("sink lock");
        if guard.contains_key(&verdict.url) {
            return Ok(Delivery::Ignored);
        }
        guard.insert(verdict.url.clone(), verdict.clone());
        Ok(Delivery::Stored)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExtractStatus, FilterStatus, FilterVerdict};

    fn verdict(url: &str) -> Verdict {
        Verdict {
            title: "t".into(),
            url: url.into(),
            source: "s".into(),
            published_at: None,
            filter: FilterVerdict {
                status: FilterStatus::Clean,
                reason: None,
                word_count: 42,
            },
            categories: vec![],
            axes: vec![],
            admitted: true,
            admission_failures: vec![],
            degraded: vec![],
            extract_status: ExtractStatus::Failed,
            extract_method: "none".into(),
        }
    }

    #[tokio::test]
    async fn memory_sink_enforces_url_uniqueness() {
        let sink = MemorySink::new();
        assert_eq!(sink.deliver(&verdict("https://x/1")).await.unwrap(), Delivery::Stored);
        assert_eq!(sink.deliver(&verdict("https://x/1")).await.unwrap(), Delivery::Ignored);
        assert_eq!(sink.len(), 1);
        assert!(sink.exists("https://x/1").await.unwrap());
        assert!(!sink.exists("https://x/2").await.unwrap());
    }
}
