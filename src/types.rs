// src/types.rs
//! Data model for the triage pipeline: raw feed entries, extraction results,
//! filter verdicts, category labels, axis probability vectors, and the final
//! immutable `Verdict` aggregate.

use serde::{Deserialize, Serialize};

/// One entry as yielded by a feed source. Immutable once read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawEntry {
    pub title: String,
    /// Unique key across the whole system.
    pub link: String,
    pub summary: String,
    /// Unix seconds; `None` when the feed omits or mangles `pubDate`.
    pub published_at: Option<u64>,
    pub source: String,
    /// Feed-provided tags (RSS `<category>` elements), declaration order kept.
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractStatus {
    Success,
    Failed,
}

/// Result of fetching full article text. `text=""` with `status=Failed` is a
/// valid, non-fatal outcome; the pipeline falls back to the feed summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractedContent {
    pub text: String,
    pub status: ExtractStatus,
    /// Extractor name, or "none" when nothing was recovered.
    pub method: String,
}

impl ExtractedContent {
    pub fn failed() -> Self {
        Self {
            text: String::new(),
            status: ExtractStatus::Failed,
            method: "none".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FilterStatus {
    /// Full accept.
    Clean,
    /// Accepted but flagged thin; shown demoted.
    Snippet,
    /// Terminal reject. Always carries a reason.
    Filtered,
}

/// Outcome of the heuristic filter chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterVerdict {
    pub status: FilterStatus,
    pub reason: Option<String>,
    /// Always computed, regardless of which rule fired.
    pub word_count: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LabelSource {
    Tag,
    Url,
    Model,
}

/// Resolved label for one categorical axis (topic, region).
///
/// `source` distinguishes deterministic matches from model inference:
/// tag matches carry confidence 1.0, URL matches 0.9, and model picks a
/// confidence derived from normalized similarity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryLabel {
    pub axis: String,
    pub value: String,
    pub confidence: f32,
    pub source: LabelSource,
}

/// Probability vector for one ordinal axis.
///
/// Index-aligned to the axis's declared label order (index 0 = lowest quality),
/// never to whatever order the classifier reported. Sums to 1.0 within 1e-3.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AxisScore {
    pub axis: String,
    pub probabilities: Vec<f32>,
}

/// The final decision record for one article. Created once by the assembler
/// and never mutated; re-ingesting the same link produces a fresh `Verdict`
/// that the sink deduplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Verdict {
    pub title: String,
    /// Unique key at the sink.
    pub url: String,
    pub source: String,
    pub published_at: Option<u64>,
    pub filter: FilterVerdict,
    /// Absent (empty) when classification was short-circuited, not defaulted.
    #[serde(default)]
    pub categories: Vec<CategoryLabel>,
    #[serde(default)]
    pub axes: Vec<AxisScore>,
    pub admitted: bool,
    /// Every failed admission threshold, collected together.
    #[serde(default)]
    pub admission_failures: Vec<String>,
    /// Classifier degradations that happened while building this record.
    #[serde(default)]
    pub degraded: Vec<String>,
    pub extract_status: ExtractStatus,
    pub extract_method: String,
}
