// tests/axis_scores.rs
//! Axis invariants with the full reference config: declared-order projection
//! regardless of classifier order, length/sum guarantees, and uniform
//! degradation on outage.

use news_triage::classify::axes::score;
use news_triage::classify::{DisabledClassifier, ScriptedClassifier};
use news_triage::config::PipelineConfig;

#[tokio::test]
async fn probabilities_align_to_declared_order_for_every_axis() {
    let cfg = PipelineConfig::reference();
    for axis in &cfg.score_axes {
        // Report labels in reverse declaration order with descending scores,
        // the way a confidence-sorted classifier would.
        let reported: Vec<(String, f32)> = axis
            .labels
            .iter()
            .rev()
            .zip([0.6f32, 0.3, 0.1])
            .map(|(l, p)| (l.clone(), p))
            .collect();
        let c = ScriptedClassifier {
            probabilities: reported,
            ..ScriptedClassifier::default()
        };

        let (s, note) = score(&c, axis, "input text").await;
        assert!(note.is_none(), "axis {}", axis.name);
        assert_eq!(s.axis, axis.name);
        assert_eq!(s.probabilities.len(), axis.labels.len());
        // Declared order: last label got 0.6, first got 0.1.
        assert!((s.probabilities[0] - 0.1).abs() < 1e-6);
        assert!((s.probabilities[axis.labels.len() - 1] - 0.6).abs() < 1e-6);
        let sum: f32 = s.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-3, "axis {} sums to {sum}", axis.name);
    }
}

#[tokio::test]
async fn classifier_outage_degrades_every_axis_to_uniform() {
    let cfg = PipelineConfig::reference();
    for axis in &cfg.score_axes {
        let (s, note) = score(&DisabledClassifier, axis, "input text").await;
        assert_eq!(s.probabilities.len(), axis.labels.len());
        let expected = 1.0 / axis.labels.len() as f32;
        for p in &s.probabilities {
            assert!((p - expected).abs() < 1e-6);
        }
        let sum: f32 = s.probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-3);
        assert!(note.expect("degradation note").contains(&axis.name));
    }
}

#[tokio::test]
async fn drifted_distribution_is_renormalized() {
    let cfg = PipelineConfig::reference();
    let axis = &cfg.score_axes[0];
    let c = ScriptedClassifier {
        probabilities: axis
            .labels
            .iter()
            .map(|l| (l.clone(), 0.25f32))
            .collect(),
        ..ScriptedClassifier::default()
    };
    let (s, note) = score(&c, axis, "input text").await;
    assert!(note.is_none());
    let sum: f32 = s.probabilities.iter().sum();
    assert!((sum - 1.0).abs() < 1e-6);
}
