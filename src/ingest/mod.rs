// src/ingest/mod.rs
//! Ingestion orchestrator: drives one entry at a time through
//! dedup -> extract -> filter -> categorize -> score -> assemble -> deliver.
//!
//! Per-entry failures are isolated; nothing here aborts the batch.

pub mod providers;
pub mod scheduler;
pub mod types;

use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assemble;
use crate::classify::{self, DynClassifier};
use crate::config::PipelineConfig;
use crate::extract::ArticleExtractor;
use crate::filters;
use crate::ingest::types::FeedProvider;
use crate::sink::{Delivery, VerdictSink};
use crate::types::{ExtractStatus, FilterStatus, RawEntry, Verdict};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("triage_entries_total", "Entries seen across all feeds.");
        describe_counter!("triage_admitted_total", "Verdicts admitted for display.");
        describe_counter!("triage_filtered_total", "Entries rejected by the filter chain.");
        describe_counter!("triage_snippet_total", "Entries accepted but flagged thin.");
        describe_counter!(
            "triage_skipped_duplicate_total",
            "Entries skipped as duplicates (advisory check or sink)."
        );
        describe_counter!("triage_failed_total", "Entries that failed delivery.");
        describe_counter!(
            "triage_degraded_total",
            "Verdicts carrying at least one classifier degradation."
        );
        describe_counter!("triage_provider_errors_total", "Feed fetch/parse errors.");
        describe_histogram!("triage_parse_ms", "Feed XML parse time in milliseconds.");
        describe_histogram!("triage_entry_ms", "Per-entry pipeline time in milliseconds.");
        describe_gauge!("triage_last_run_ts", "Unix ts when the last cycle finished.");
    });
}

/// Normalize feed/article text: decode entities, strip tags, unify quotes,
/// collapse whitespace. Case and punctuation are preserved; the filter chain
/// reads both.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Per-cycle operator summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CycleSummary {
    pub processed: usize,
    pub admitted: usize,
    pub filtered: usize,
    pub snippet: usize,
    pub skipped_duplicate: usize,
    pub failed: usize,
}

/// Terminal state for one entry's pass through the pipeline.
#[derive(Debug)]
pub enum EntryOutcome {
    Delivered(Box<Verdict>),
    SkippedDuplicate,
    Failed,
}

/// The decision pipeline with its injected collaborators.
pub struct Pipeline {
    config: PipelineConfig,
    classifier: DynClassifier,
    extractor: Arc<dyn ArticleExtractor>,
    sink: Arc<dyn VerdictSink>,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        classifier: DynClassifier,
        extractor: Arc<dyn ArticleExtractor>,
        sink: Arc<dyn VerdictSink>,
    ) -> Self {
        Self {
            config,
            classifier,
            extractor,
            sink,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one full cycle over all providers. One feed, one entry, one pass
    /// at a time; a single entry's failure never stops the rest.
    pub async fn run_cycle(&self, feed_providers: &[Box<dyn FeedProvider>]) -> CycleSummary {
        ensure_metrics_described();
        let mut summary = CycleSummary::default();

        for provider in feed_providers {
            let entries = match provider.fetch_latest().await {
                Ok(v) => v,
                Err(e) => {
                    warn!(target: "ingest", provider = provider.name(), error = ?e, "provider error");
                    counter!("triage_provider_errors_total").increment(1);
                    continue;
                }
            };

            for entry in entries {
                summary.processed += 1;
                counter!("triage_entries_total").increment(1);
                let t0 = std::time::Instant::now();

                match self.process_entry(&entry).await {
                    EntryOutcome::Delivered(verdict) => {
                        match verdict.filter.status {
                            FilterStatus::Filtered => {
                                summary.filtered += 1;
                                counter!("triage_filtered_total").increment(1);
                            }
                            FilterStatus::Snippet => {
                                summary.snippet += 1;
                                counter!("triage_snippet_total").increment(1);
                            }
                            FilterStatus::Clean => {}
                        }
                        if verdict.admitted {
                            summary.admitted += 1;
                            counter!("triage_admitted_total").increment(1);
                        }
                        if !verdict.degraded.is_empty() {
                            counter!("triage_degraded_total").increment(1);
                        }
                    }
                    EntryOutcome::SkippedDuplicate => {
                        summary.skipped_duplicate += 1;
                        counter!("triage_skipped_duplicate_total").increment(1);
                    }
                    EntryOutcome::Failed => {
                        summary.failed += 1;
                        counter!("triage_failed_total").increment(1);
                    }
                }

                metrics::histogram!("triage_entry_ms")
                    .record(t0.elapsed().as_secs_f64() * 1_000.0);
            }
        }

        let now = chrono::Utc::now().timestamp().max(0) as u64;
        gauge!("triage_last_run_ts").set(now as f64);

        info!(
            target: "ingest",
            processed = summary.processed,
            admitted = summary.admitted,
            filtered = summary.filtered,
            snippet = summary.snippet,
            skipped_duplicate = summary.skipped_duplicate,
            failed = summary.failed,
            "cycle complete"
        );
        summary
    }

    /// Drive one entry through the full state progression. Returns the
    /// terminal outcome; every failure path logs the offending URL.
    pub async fn process_entry(&self, entry: &RawEntry) -> EntryOutcome {
        if entry.link.trim().is_empty() {
            warn!(target: "ingest", title = %entry.title, "entry without link");
            return EntryOutcome::Failed;
        }

        // Advisory dedup. Best-effort: the sink's uniqueness constraint is
        // the authoritative mechanism, so an error here just means we carry on.
        match self.sink.exists(&entry.link).await {
            Ok(true) => {
                debug!(target: "ingest", url = %entry.link, "skipping existing");
                return EntryOutcome::SkippedDuplicate;
            }
            Ok(false) => {}
            Err(e) => {
                debug!(target: "ingest", url = %entry.link, error = ?e, "existence check failed");
            }
        }

        debug!(target: "ingest", url = %entry.link, stage = "extracting");
        let extraction = self.extractor.extract(&entry.link).await;
        let body = if extraction.status == ExtractStatus::Success && !extraction.text.is_empty() {
            extraction.text.as_str()
        } else {
            entry.summary.as_str()
        };

        debug!(target: "ingest", url = %entry.link, stage = "filtering");
        let filter = filters::evaluate(&self.config.filters, &entry.title, body);

        let mut categories = Vec::new();
        let mut axes = Vec::new();
        let mut degraded = Vec::new();

        // Filter-short-circuit: a rejected entry skips classification unless
        // telemetry classification is on. Skipped fields stay absent.
        let classify =
            filter.status != FilterStatus::Filtered || self.config.classifier.classify_filtered;
        if classify {
            let input = classify::combined_input(&self.config.classifier, &entry.title, body);

            debug!(target: "ingest", url = %entry.link, stage = "categorizing");
            for axis in &self.config.category_axes {
                let (label, note) = classify::category::resolve(
                    self.classifier.as_ref(),
                    axis,
                    &input,
                    &entry.link,
                    &entry.tags,
                )
                .await;
                categories.push(label);
                degraded.extend(note);
            }

            debug!(target: "ingest", url = %entry.link, stage = "scoring");
            for axis in &self.config.score_axes {
                let (score, note) =
                    classify::axes::score(self.classifier.as_ref(), axis, &input).await;
                axes.push(score);
                degraded.extend(note);
            }
        }

        debug!(target: "ingest", url = %entry.link, stage = "assembling");
        let verdict = assemble::assemble(
            entry,
            &extraction,
            filter,
            categories,
            axes,
            degraded,
            &self.config.admission,
            &self.config.score_axes,
        );

        match self.sink.deliver(&verdict).await {
            Ok(Delivery::Stored) => {
                debug!(target: "ingest", url = %verdict.url, admitted = verdict.admitted, "delivered");
                EntryOutcome::Delivered(Box::new(verdict))
            }
            Ok(Delivery::Ignored) => EntryOutcome::SkippedDuplicate,
            Err(e) => {
                warn!(target: "ingest", url = %verdict.url, error = ?e, "sink delivery failed");
                EntryOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_decodes_strips_and_collapses() {
        let s = "  <p>Hello,&nbsp;&nbsp; <b>world</b></p>  ";
        assert_eq!(normalize_text(s), "Hello, world");
    }

    #[test]
    fn normalize_text_preserves_case_and_punctuation() {
        // The filter chain depends on CAPS and trailing "!!" surviving.
        let s = "SHOCKING news!!";
        assert_eq!(normalize_text(s), "SHOCKING news!!");
    }

    #[test]
    fn normalize_text_unifies_smart_quotes() {
        let s = "\u{201C}quote\u{201D} and \u{2018}tick\u{2019}";
        assert_eq!(normalize_text(s), "\"quote\" and 'tick'");
    }
}
