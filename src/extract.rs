// src/extract.rs
//! Article content extraction. Failure is a valid outcome, never an error:
//! the pipeline falls back to the feed summary and records the audit fields.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use tracing::{debug, warn};

use crate::ingest::normalize_text;
use crate::types::{ExtractStatus, ExtractedContent};

#[async_trait]
pub trait ArticleExtractor: Send + Sync {
    /// Fetch and extract full article text. Infallible by contract; failures
    /// come back as `status = failed`, `method = "none"`, empty text.
    async fn extract(&self, url: &str) -> ExtractedContent;
    fn name(&self) -> &'static str;
}

/// Plain HTTP extractor: fetch the page, drop script/style blocks, strip
/// tags, decode entities, collapse whitespace.
pub struct HttpExtractor {
    http: reqwest::Client,
}

impl HttpExtractor {
    pub fn new(timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("news-triage/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("reqwest client");
        Self { http }
    }
}

/// Strip `<script>`/`<style>` blocks wholesale before tag removal; their
/// content is never article text.
fn strip_code_blocks(html: &str) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").expect("code-block regex")
    });
    re.replace_all(html, " ").to_string()
}

pub fn html_to_text(html: &str) -> String {
    normalize_text(&strip_code_blocks(html))
}

#[async_trait]
impl ArticleExtractor for HttpExtractor {
    async fn extract(&self, url: &str) -> ExtractedContent {
        let resp = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "extract", %url, error = %e, "fetch failed");
                return ExtractedContent::failed();
            }
        };
        if !resp.status().is_success() {
            warn!(target: "extract", %url, status = %resp.status(), "non-success response");
            return ExtractedContent::failed();
        }
        let html = match resp.text().await {
            Ok(t) => t,
            Err(e) => {
                warn!(target: "extract", %url, error = %e, "body read failed");
                return ExtractedContent::failed();
            }
        };

        let text = html_to_text(&html);
        if text.is_empty() {
            return ExtractedContent::failed();
        }
        debug!(target: "extract", %url, chars = text.len(), "extracted");
        ExtractedContent {
            text,
            status: ExtractStatus::Success,
            method: self.name().to_string(),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
