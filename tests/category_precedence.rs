// tests/category_precedence.rs
//! The hybrid cascade in one scenario: feed tags say politics, the URL says
//! business, the text is semantically about sport. Disabling each tier in
//! turn walks the precedence chain down.

use news_triage::classify::category::resolve;
use news_triage::classify::ScriptedClassifier;
use news_triage::config::PipelineConfig;
use news_triage::types::LabelSource;

fn topic_axis() -> news_triage::config::CategoryAxis {
    PipelineConfig::reference()
        .category_axes
        .into_iter()
        .find(|a| a.name == "topic")
        .expect("topic axis")
}

fn sporty_classifier() -> ScriptedClassifier {
    ScriptedClassifier {
        similarities: vec![
            ("sport".into(), 0.62),
            ("politics".into(), 0.11),
            ("business".into(), 0.08),
        ],
        ..ScriptedClassifier::default()
    }
}

const URL: &str = "https://example.com/business/quarterly-results";
const INPUT: &str = "Final over thriller. The home side chased down the target with two balls to spare.";

#[tokio::test]
async fn tags_beat_url_and_model() {
    let axis = topic_axis();
    let c = sporty_classifier();
    let (label, note) = resolve(&c, &axis, INPUT, URL, &["politics".to_string()]).await;
    assert_eq!(label.value, "politics");
    assert_eq!(label.source, LabelSource::Tag);
    assert!((label.confidence - 1.0).abs() < f32::EPSILON);
    assert!(note.is_none());
}

#[tokio::test]
async fn url_beats_model_when_tags_are_absent() {
    let axis = topic_axis();
    let c = sporty_classifier();
    let (label, _) = resolve(&c, &axis, INPUT, URL, &[]).await;
    assert_eq!(label.value, "business");
    assert_eq!(label.source, LabelSource::Url);
    assert!((label.confidence - 0.9).abs() < f32::EPSILON);
}

#[tokio::test]
async fn model_decides_when_tags_and_url_are_silent() {
    let axis = topic_axis();
    let c = sporty_classifier();
    let (label, note) = resolve(&c, &axis, INPUT, "https://example.com/a1b2c3", &[]).await;
    assert_eq!(label.value, "sport");
    assert_eq!(label.source, LabelSource::Model);
    // confidence = (similarity + 1) / 2
    assert!((label.confidence - 0.81).abs() < 1e-6);
    assert!(note.is_none());
}

#[tokio::test]
async fn unmatched_tags_fall_through_to_url() {
    let axis = topic_axis();
    let c = sporty_classifier();
    let (label, _) = resolve(&c, &axis, INPUT, URL, &["weekend reads".to_string()]).await;
    assert_eq!(label.source, LabelSource::Url);
    assert_eq!(label.value, "business");
}
