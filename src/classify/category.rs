// src/classify/category.rs
//! Hybrid category resolver: tag match -> URL keyword match -> model fallback.
//!
//! Deterministic editorial signals (feed tags, URL taxonomy segments) are
//! strictly more reliable than inferred similarity and essentially free, so
//! the cascade only reaches the model when both cheaper tiers miss.

use regex::Regex;
use tracing::warn;

use crate::config::CategoryAxis;
use crate::types::{CategoryLabel, LabelSource};

use super::SemanticClassifier;

/// Sentinel confidences for the deterministic tiers.
const TAG_CONFIDENCE: f32 = 1.0;
const URL_CONFIDENCE: f32 = 0.9;

/// Resolve one categorical axis for an article. `input` is the prepared
/// (truncated) title+body text shared with the axis scorer.
///
/// Returns the label plus an optional degradation note when the model tier
/// was needed but failed; the note ends up on the verdict.
pub async fn resolve(
    classifier: &dyn SemanticClassifier,
    axis: &CategoryAxis,
    input: &str,
    url: &str,
    tags: &[String],
) -> (CategoryLabel, Option<String>) {
    if let Some(label) = match_tags(axis, tags) {
        return (
            CategoryLabel {
                axis: axis.name.clone(),
                value: label.to_string(),
                confidence: TAG_CONFIDENCE,
                source: LabelSource::Tag,
            },
            None,
        );
    }

    if let Some(label) = match_url(axis, url) {
        return (
            CategoryLabel {
                axis: axis.name.clone(),
                value: label.to_string(),
                confidence: URL_CONFIDENCE,
                source: LabelSource::Url,
            },
            None,
        );
    }

    model_fallback(classifier, axis, input).await
}

/// Tag tier: lowercase each tag, match it against the keyword map by exact
/// equality or substring containment. Keyword declaration order wins when
/// several keys could match.
fn match_tags<'a>(axis: &'a CategoryAxis, tags: &[String]) -> Option<&'a str> {
    if tags.is_empty() {
        return None;
    }
    let norm: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
    for rule in &axis.keywords {
        if norm.iter().any(|t| t == &rule.key || t.contains(&rule.key)) {
            return Some(&rule.label);
        }
    }
    None
}

/// URL tier: match a keyword bounded by path separators or hyphens, or as a
/// whole word. First key in declaration order wins.
fn match_url<'a>(axis: &'a CategoryAxis, url: &str) -> Option<&'a str> {
    if url.is_empty() {
        return None;
    }
    let url = url.to_lowercase();
    for rule in &axis.keywords {
        let key = regex::escape(&rule.key);
        let bounded = Regex::new(&format!(r"[/_\-.]{key}[/_\-.]")).ok()?;
        let word = Regex::new(&format!(r"\b{key}\b")).ok()?;
        if bounded.is_match(&url)
            || url.starts_with(&format!("{}-", rule.key))
            || url.ends_with(&format!("-{}", rule.key))
            || word.is_match(&url)
        {
            return Some(&rule.label);
        }
    }
    None
}

/// Model tier: similarity of the combined text against each label description,
/// argmax wins, confidence maps [-1, 1] to [0, 1]. Exact score ties break by
/// label declaration order. Errors degrade to the first-declared label with
/// confidence 0.0 and a recorded note.
async fn model_fallback(
    classifier: &dyn SemanticClassifier,
    axis: &CategoryAxis,
    input: &str,
) -> (CategoryLabel, Option<String>) {
    let degraded = |err: &str| {
        // Validation guarantees a non-empty label set; stay panic-free anyway.
        let fallback = axis
            .labels
            .first()
            .map(|l| l.name.clone())
            .unwrap_or_default();
        warn!(target: "classify", axis = %axis.name, error = err, "category fallback degraded");
        (
            CategoryLabel {
                axis: axis.name.clone(),
                value: fallback.clone(),
                confidence: 0.0,
                source: LabelSource::Model,
            },
            Some(format!("category {} degraded to {}", axis.name, fallback)),
        )
    };

    let scores = match classifier.similarity(input, &axis.labels).await {
        Ok(s) => s,
        Err(e) => return degraded(&e.to_string()),
    };

    // Re-project onto declaration order; strict `>` keeps the first-declared
    // label on exact ties.
    let mut best: Option<(&str, f32)> = None;
    for lab in &axis.labels {
        if let Some((_, s)) = scores.iter().find(|(name, _)| name == &lab.name) {
            if best.map_or(true, |(_, b)| *s > b) {
                best = Some((lab.name.as_str(), *s));
            }
        }
    }

    match best {
        Some((label, score)) => (
            CategoryLabel {
                axis: axis.name.clone(),
                value: label.to_string(),
                confidence: ((score + 1.0) / 2.0).clamp(0.0, 1.0),
                source: LabelSource::Model,
            },
            None,
        ),
        None => degraded("no declared label in classifier output"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{DisabledClassifier, ScriptedClassifier};
    use crate::config::PipelineConfig;

    fn topic_axis() -> CategoryAxis {
        PipelineConfig::reference()
            .category_axes
            .into_iter()
            .find(|a| a.name == "topic")
            .expect("topic axis")
    }

    #[tokio::test]
    async fn tag_match_is_exact_or_substring() {
        let axis = topic_axis();
        let c = DisabledClassifier;
        let (label, note) = resolve(&c, &axis, "", "", &["Politics".into()]).await;
        assert_eq!(label.value, "politics");
        assert_eq!(label.source, LabelSource::Tag);
        assert!((label.confidence - 1.0).abs() < f32::EPSILON);
        assert!(note.is_none());

        // substring containment: "indian politics" contains "politics"
        let (label, _) = resolve(&c, &axis, "", "", &["indian politics".into()]).await;
        assert_eq!(label.value, "politics");
    }

    #[tokio::test]
    async fn url_segment_and_word_boundary_match() {
        let axis = topic_axis();
        let c = DisabledClassifier;
        let (label, _) = resolve(
            &c,
            &axis,
            "",
            "https://example.com/news/business/markets-rally",
            &[],
        )
        .await;
        assert_eq!(label.value, "business");
        assert_eq!(label.source, LabelSource::Url);
        assert!((label.confidence - 0.9).abs() < f32::EPSILON);

        // hyphen-bounded key at the end of the slug
        let (label, _) = resolve(&c, &axis, "", "https://example.com/read/weekend-cricket", &[]).await;
        assert_eq!(label.value, "sport");
    }

    #[tokio::test]
    async fn url_keyword_inside_a_word_does_not_match() {
        let axis = topic_axis();
        let c = ScriptedClassifier {
            similarities: vec![("science".into(), 0.8)],
            ..ScriptedClassifier::default()
        };
        // "arts" appears only inside "startswith"; no boundary match.
        let (label, _) = resolve(&c, &axis, "", "https://example.com/startswith", &[]).await;
        assert_eq!(label.source, LabelSource::Model);
        assert_eq!(label.value, "science");
    }

    #[tokio::test]
    async fn model_confidence_maps_similarity_to_unit_interval() {
        let axis = topic_axis();
        let c = ScriptedClassifier {
            similarities: vec![("sport".into(), 0.5), ("tech".into(), -0.2)],
            ..ScriptedClassifier::default()
        };
        let (label, note) = resolve(&c, &axis, "match report", "", &[]).await;
        assert_eq!(label.value, "sport");
        assert!((label.confidence - 0.75).abs() < 1e-6);
        assert!(note.is_none());
    }

    #[tokio::test]
    async fn model_tie_breaks_by_declaration_order() {
        let axis = topic_axis();
        // "politics" is declared before "tech"; equal scores must pick it.
        let c = ScriptedClassifier {
            similarities: vec![("tech".into(), 0.4), ("politics".into(), 0.4)],
            ..ScriptedClassifier::default()
        };
        let (label, _) = resolve(&c, &axis, "", "", &[]).await;
        assert_eq!(label.value, "politics");
    }

    #[tokio::test]
    async fn classifier_error_degrades_to_first_label_with_note() {
        let axis = topic_axis();
        let (label, note) = resolve(&DisabledClassifier, &axis, "", "", &[]).await;
        assert_eq!(label.value, "politics"); // first-declared
        assert_eq!(label.confidence, 0.0);
        assert_eq!(label.source, LabelSource::Model);
        assert!(note.expect("degradation note").contains("topic"));
    }
}
