// src/assemble.rs
//! Verdict assembler: folds the filter outcome, resolved categories, and axis
//! probability vectors into one immutable record, then applies the opt-in
//! admission gate.
//!
//! Pure and deterministic: identical inputs produce bit-identical output, and
//! `admitted` is computable without re-invoking the classifier.

use crate::config::{AdmissionConfig, ScoreAxis};
use crate::types::{AxisScore, CategoryLabel, ExtractedContent, FilterStatus, FilterVerdict, RawEntry, Verdict};

/// Build the final record for one entry.
///
/// A `filtered` status forces `admitted = false` unconditionally; categories
/// and axes may still be present for audit when telemetry classification ran.
/// With thresholds enabled, every configured axis must meet its minimum at
/// the best ordinal index; all failures are collected, never short-circuited.
pub fn assemble(
    entry: &RawEntry,
    extraction: &ExtractedContent,
    filter: FilterVerdict,
    categories: Vec<CategoryLabel>,
    axes: Vec<AxisScore>,
    degraded: Vec<String>,
    admission: &AdmissionConfig,
    score_axes: &[ScoreAxis],
) -> Verdict {
    let mut admission_failures = Vec::new();

    let admitted = if filter.status == FilterStatus::Filtered {
        false
    } else if admission.enabled {
        for th in &admission.thresholds {
            let Some(axis_cfg) = score_axes.iter().find(|a| a.name == th.axis) else {
                continue; // validation guarantees this at startup
            };
            let best_index = axis_cfg.labels.len().saturating_sub(1);
            let best = axes
                .iter()
                .find(|s| s.axis == th.axis)
                .and_then(|s| s.probabilities.get(best_index).copied())
                .unwrap_or(0.0);
            if best < th.min_best {
                admission_failures.push(format!(
                    "{} score {:.2} < {}",
                    axis_cfg.best_label(),
                    best,
                    th.min_best
                ));
            }
        }
        admission_failures.is_empty()
    } else {
        true
    };

    Verdict {
        title: entry.title.clone(),
        url: entry.link.clone(),
        source: entry.source.clone(),
        published_at: entry.published_at,
        filter,
        categories,
        axes,
        admitted,
        admission_failures,
        degraded,
        extract_status: extraction.status,
        extract_method: extraction.method.clone(),
    }
}
