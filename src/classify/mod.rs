// src/classify/mod.rs
//! Semantic classifier abstraction and input preparation.
//!
//! The classifier is an injected collaborator with explicit lifecycle: built
//! once at startup and passed by reference into the pipeline. Scores come
//! back in whatever order the backend chooses; callers re-project onto their
//! declared label order.

pub mod axes;
pub mod category;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{CategoryDescription, ClassifierConfig, InputStrategy};

/// Stateless scoring oracle. Both calls may return labels in any order; the
/// zero-shot variant typically sorts by descending confidence.
#[async_trait]
pub trait SemanticClassifier: Send + Sync {
    /// Cosine-style similarity in [-1, 1] against each labeled description.
    async fn similarity(
        &self,
        text: &str,
        candidates: &[CategoryDescription],
    ) -> Result<Vec<(String, f32)>>;

    /// Softmax-style probability per hypothesis-templated label.
    async fn zero_shot(
        &self,
        text: &str,
        labels: &[String],
        hypothesis_template: &str,
    ) -> Result<Vec<(String, f32)>>;

    fn name(&self) -> &'static str;
}

pub type DynClassifier = Arc<dyn SemanticClassifier>;

/// Build the classifier the config asks for. No endpoint means every model
/// call errors and the pipeline degrades (recorded on the verdict).
pub fn build_classifier(cfg: &ClassifierConfig) -> DynClassifier {
    match &cfg.endpoint {
        Some(url) => Arc::new(HttpClassifier::new(url, cfg.timeout_secs)),
        None => Arc::new(DisabledClassifier),
    }
}

/// First N sentences of `text`, split on terminal punctuation.
fn leading_sentences(text: &str, n: usize) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"[^.!?]+[.!?]+").expect("sentence regex"));
    let mut out = String::new();
    let mut taken = 0usize;
    for m in re.find_iter(text) {
        if taken >= n {
            break;
        }
        out.push_str(m.as_str());
        taken += 1;
    }
    if out.is_empty() {
        text.to_string()
    } else {
        out.trim().to_string()
    }
}

/// Combined title+body input for every classifier call, truncated per config.
/// The character strategy takes the first N chars of "{title}. {text}"; the
/// sentence strategy keeps the title and the first N body sentences.
pub fn combined_input(cfg: &ClassifierConfig, title: &str, text: &str) -> String {
    match cfg.strategy {
        InputStrategy::Chars => {
            let combined = format!("{title}. {text}");
            if combined.chars().count() > cfg.truncate_chars {
                combined.chars().take(cfg.truncate_chars).collect()
            } else {
                combined
            }
        }
        InputStrategy::Sentences => {
            format!("{title}\n\n{}", leading_sentences(text, cfg.lead_sentences))
        }
    }
}

/// Short anonymized id for dev logs; raw article text never hits the log.
pub(crate) fn anon_hash(text: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

// ------------------------------------------------------------
// HTTP-backed classifier
// ------------------------------------------------------------

/// Client for an inference endpoint exposing `/similarity` and `/zero-shot`.
/// Auth via `CLASSIFIER_API_KEY` when set.
pub struct HttpClassifier {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpClassifier {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("news-triage/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var("CLASSIFIER_API_KEY").ok(),
        }
    }

    async fn post_scores<B: Serialize>(&self, path: &str, body: &B) -> Result<Vec<(String, f32)>> {
        #[derive(Deserialize)]
        struct Resp {
            labels: Vec<String>,
            scores: Vec<f32>,
        }

        let mut req = self.http.post(format!("{}{path}", self.base_url)).json(body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.context("classifier request")?;
        if !resp.status().is_success() {
            return Err(anyhow!("classifier returned {}", resp.status()));
        }
        let body: Resp = resp.json().await.context("classifier response body")?;
        if body.labels.len() != body.scores.len() {
            return Err(anyhow!(
                "classifier returned {} labels but {} scores",
                body.labels.len(),
                body.scores.len()
            ));
        }
        Ok(body.labels.into_iter().zip(body.scores).collect())
    }
}

#[async_trait]
impl SemanticClassifier for HttpClassifier {
    async fn similarity(
        &self,
        text: &str,
        candidates: &[CategoryDescription],
    ) -> Result<Vec<(String, f32)>> {
        #[derive(Serialize)]
        struct Candidate<'a> {
            label: &'a str,
            description: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            text: &'a str,
            candidates: Vec<Candidate<'a>>,
        }

        debug!(target: "classify", id = %anon_hash(text), n = candidates.len(), "similarity call");
        let req = Req {
            text,
            candidates: candidates
                .iter()
                .map(|c| Candidate {
                    label: &c.name,
                    description: &c.description,
                })
                .collect(),
        };
        self.post_scores("/similarity", &req).await
    }

    async fn zero_shot(
        &self,
        text: &str,
        labels: &[String],
        hypothesis_template: &str,
    ) -> Result<Vec<(String, f32)>> {
        #[derive(Serialize)]
        struct Req<'a> {
            text: &'a str,
            labels: &'a [String],
            hypothesis_template: &'a str,
        }

        debug!(target: "classify", id = %anon_hash(text), n = labels.len(), "zero-shot call");
        let req = Req {
            text,
            labels,
            hypothesis_template,
        };
        self.post_scores("/zero-shot", &req).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

// ------------------------------------------------------------
// Disabled + scripted doubles
// ------------------------------------------------------------

/// Errors on every call; used when no endpoint is configured. The pipeline
/// keeps running and records the degradation on each verdict.
pub struct DisabledClassifier;

#[async_trait]
impl SemanticClassifier for DisabledClassifier {
    async fn similarity(
        &self,
        _text: &str,
        _candidates: &[CategoryDescription],
    ) -> Result<Vec<(String, f32)>> {
        Err(anyhow!("classifier disabled"))
    }

    async fn zero_shot(
        &self,
        _text: &str,
        _labels: &[String],
        _hypothesis_template: &str,
    ) -> Result<Vec<(String, f32)>> {
        Err(anyhow!("classifier disabled"))
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic double for tests and local runs: returns the configured
/// vectors verbatim, in whatever order they were given.
#[derive(Clone, Default)]
pub struct ScriptedClassifier {
    pub similarities: Vec<(String, f32)>,
    pub probabilities: Vec<(String, f32)>,
}

#[async_trait]
impl SemanticClassifier for ScriptedClassifier {
    async fn similarity(
        &self,
        _text: &str,
        _candidates: &[CategoryDescription],
    ) -> Result<Vec<(String, f32)>> {
        Ok(self.similarities.clone())
    }

    async fn zero_shot(
        &self,
        _text: &str,
        _labels: &[String],
        _hypothesis_template: &str,
    ) -> Result<Vec<(String, f32)>> {
        Ok(self.probabilities.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
