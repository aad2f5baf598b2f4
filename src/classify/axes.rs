// src/classify/axes.rs
//! Multi-axis probability scorer.
//!
//! One zero-shot call per ordinal axis. The classifier reports labels in its
//! own order (usually sorted by descending confidence); the vector handed
//! downstream is re-projected onto the axis's declared label order, because
//! index position carries the ordinal meaning (0 = lowest quality).

use tracing::warn;

use crate::config::ScoreAxis;
use crate::types::AxisScore;

use super::SemanticClassifier;

const SUM_TOLERANCE: f32 = 1e-3;

/// Score one axis for the prepared input text.
///
/// Errors and malformed output never propagate: the score degrades to a
/// uniform distribution over the axis's labels and the degradation note is
/// returned for the verdict.
pub async fn score(
    classifier: &dyn SemanticClassifier,
    axis: &ScoreAxis,
    input: &str,
) -> (AxisScore, Option<String>) {
    let degraded = |err: &str| {
        warn!(target: "classify", axis = %axis.name, error = err, "axis degraded to uniform");
        (
            uniform(axis),
            Some(format!("axis {} degraded to uniform", axis.name)),
        )
    };

    let raw = match classifier
        .zero_shot(input, &axis.labels, &axis.hypothesis)
        .await
    {
        Ok(r) => r,
        Err(e) => return degraded(&e.to_string()),
    };

    // Re-project onto declared order; every declared label must be present.
    let mut probabilities = Vec::with_capacity(axis.labels.len());
    for label in &axis.labels {
        match raw.iter().find(|(name, _)| name == label) {
            Some((_, p)) if p.is_finite() && *p >= 0.0 => probabilities.push(*p),
            Some(_) => return degraded(&format!("non-finite probability for `{label}`")),
            None => return degraded(&format!("label `{label}` missing from output")),
        }
    }

    let sum: f32 = probabilities.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
        return degraded("probabilities sum to zero");
    }
    if (sum - 1.0).abs() > SUM_TOLERANCE {
        for p in &mut probabilities {
            *p /= sum;
        }
    }

    (
        AxisScore {
            axis: axis.name.clone(),
            probabilities,
        },
        None,
    )
}

fn uniform(axis: &ScoreAxis) -> AxisScore {
    let n = axis.labels.len().max(1);
    AxisScore {
        axis: axis.name.clone(),
        probabilities: vec![1.0 / n as f32; n],
    }
}
