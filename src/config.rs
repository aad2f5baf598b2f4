// src/config.rs
//! Pipeline configuration: TOML schema, env-override loading, compiled-in
//! reference defaults, and startup validation.
//!
//! Validation is deliberately fatal. A malformed threshold or label set would
//! invalidate every verdict produced afterwards, so we refuse to start instead
//! of degrading.

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";
pub const ENV_CONFIG_PATH: &str = "TRIAGE_CONFIG_PATH";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub filters: FilterConfig,
    pub classifier: ClassifierConfig,
    pub extractor: ExtractorConfig,
    pub admission: AdmissionConfig,
    pub category_axes: Vec<CategoryAxis>,
    pub score_axes: Vec<ScoreAxis>,
    pub feeds: FeedsConfig,
    pub sink: SinkConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Manipulation-signal phrases, matched case-insensitively against titles.
    /// List order is match order.
    pub trigger_words: Vec<String>,
    /// Uppercase-to-letters ratio above which a title is rejected.
    pub scream_ratio: f32,
    /// Literal substrings that mark punctuation spam.
    pub spam_tokens: Vec<String>,
    /// Bodies with fewer word tokens than this are flagged as snippets.
    pub snippet_min_words: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            trigger_words: [
                "Destroyed",
                "Humiliated",
                "Shocking",
                "Panic",
                "You Won't Believe",
            ]
            .map(String::from)
            .to_vec(),
            scream_ratio: 0.3,
            spam_tokens: ["!!", "??", "?!"].map(String::from).to_vec(),
            snippet_min_words: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputStrategy {
    /// First N characters of "{title}. {text}".
    Chars,
    /// Title plus the first N sentences of the body.
    Sentences,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Inference endpoint base URL; absent means the classifier is disabled
    /// and every model call degrades.
    pub endpoint: Option<String>,
    pub strategy: InputStrategy,
    pub truncate_chars: usize,
    pub lead_sentences: usize,
    /// Still classify entries the filter chain rejected (telemetry only).
    pub classify_filtered: bool,
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            strategy: InputStrategy::Chars,
            truncate_chars: 1000,
            lead_sentences: 4,
            classify_filtered: false,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub timeout_secs: u64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Admission gating is opt-in; disabled means `admitted` follows the
    /// filter status alone.
    pub enabled: bool,
    pub thresholds: Vec<AxisThreshold>,
}

/// Minimum probability required at the best (last) ordinal index of an axis.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisThreshold {
    pub axis: String,
    pub min_best: f32,
}

/// One categorical axis: a keyword->label mapping for the deterministic tiers
/// plus labeled descriptions for the model fallback.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryAxis {
    pub name: String,
    /// Declaration order is precedence order for tag and URL matching.
    pub keywords: Vec<KeywordRule>,
    /// Declaration order breaks exact model-score ties.
    pub labels: Vec<CategoryDescription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordRule {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDescription {
    pub name: String,
    pub description: String,
}

/// One ordinal axis: labels ordered low -> high quality, plus the
/// natural-language hypothesis template handed to the classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreAxis {
    pub name: String,
    pub labels: Vec<String>,
    pub hypothesis: String,
}

impl ScoreAxis {
    /// The highest-quality label sits at the last ordinal index.
    pub fn best_label(&self) -> &str {
        self.labels.last().map(String::as_str).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub sources: Vec<FeedSpec>,
    pub interval_secs: u64,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            interval_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSpec {
    pub url: String,
    pub source: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Ingestion API endpoint; absent means an in-memory sink (dry runs).
    pub ingest_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl PipelineConfig {
    /// Load using $TRIAGE_CONFIG_PATH, then `config/pipeline.toml`, then the
    /// compiled-in reference defaults. Validation errors are fatal.
    pub fn load() -> Result<Self> {
        let cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(&p);
            let content = fs::read_to_string(&pb)
                .with_context(|| format!("reading pipeline config at {}", pb.display()))?;
            Self::from_toml_str(&content)?
        } else {
            let pb = PathBuf::from(DEFAULT_CONFIG_PATH);
            if pb.exists() {
                let content = fs::read_to_string(&pb)
                    .with_context(|| format!("reading pipeline config at {}", pb.display()))?;
                Self::from_toml_str(&content)?
            } else {
                Self::reference()
            }
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let cfg: PipelineConfig = toml::from_str(toml_str).context("parsing pipeline config")?;
        Ok(cfg)
    }

    /// Compiled-in reference configuration: three ordinal axes and the
    /// topic/region category axes with their keyword maps.
    pub fn reference() -> Self {
        Self {
            filters: FilterConfig::default(),
            classifier: ClassifierConfig::default(),
            extractor: ExtractorConfig::default(),
            admission: AdmissionConfig {
                enabled: false,
                thresholds: vec![
                    AxisThreshold {
                        axis: "epistemic".into(),
                        min_best: 0.5,
                    },
                    AxisThreshold {
                        axis: "emotive".into(),
                        min_best: 0.4,
                    },
                    AxisThreshold {
                        axis: "density".into(),
                        min_best: 0.3,
                    },
                ],
            },
            category_axes: vec![reference_topic_axis(), reference_region_axis()],
            score_axes: vec![
                ScoreAxis {
                    name: "epistemic".into(),
                    labels: ["Opinion", "Opinion and Facts", "Facts"]
                        .map(String::from)
                        .to_vec(),
                    hypothesis: "This article is based on {}.".into(),
                },
                ScoreAxis {
                    name: "emotive".into(),
                    labels: ["Triggering", "Calm and Triggering", "Calm"]
                        .map(String::from)
                        .to_vec(),
                    hypothesis: "The tone of this article is {}.".into(),
                },
                ScoreAxis {
                    name: "density".into(),
                    labels: ["Fluff", "Standard", "Deep Dive"].map(String::from).to_vec(),
                    hypothesis: "This article is best described as {}.".into(),
                },
            ],
            feeds: FeedsConfig::default(),
            sink: SinkConfig::default(),
        }
    }

    /// Startup validation. Any error here is fatal.
    pub fn validate(&self) -> Result<()> {
        if !self.filters.scream_ratio.is_finite()
            || self.filters.scream_ratio <= 0.0
            || self.filters.scream_ratio > 1.0
        {
            bail!(
                "filters.scream_ratio must be in (0, 1], got {}",
                self.filters.scream_ratio
            );
        }
        if self.filters.spam_tokens.iter().any(|t| t.is_empty()) {
            bail!("filters.spam_tokens must not contain empty strings");
        }
        if self.filters.trigger_words.iter().any(|t| t.trim().is_empty()) {
            bail!("filters.trigger_words must not contain empty phrases");
        }

        if self.classifier.truncate_chars == 0 {
            bail!("classifier.truncate_chars must be positive");
        }
        if self.classifier.lead_sentences == 0 {
            bail!("classifier.lead_sentences must be positive");
        }

        let mut seen = std::collections::HashSet::new();
        for axis in &self.score_axes {
            if axis.name.trim().is_empty() {
                bail!("score axis with empty name");
            }
            if !seen.insert(axis.name.as_str()) {
                bail!("duplicate score axis `{}`", axis.name);
            }
            if axis.labels.len() < 2 {
                bail!(
                    "score axis `{}` needs at least 2 ordered labels, got {}",
                    axis.name,
                    axis.labels.len()
                );
            }
            if !axis.hypothesis.contains("{}") {
                bail!(
                    "score axis `{}` hypothesis template must contain `{{}}`",
                    axis.name
                );
            }
        }

        let mut seen_cat = std::collections::HashSet::new();
        for axis in &self.category_axes {
            if axis.name.trim().is_empty() {
                bail!("category axis with empty name");
            }
            if !seen_cat.insert(axis.name.as_str()) {
                bail!("duplicate category axis `{}`", axis.name);
            }
            if axis.labels.is_empty() {
                bail!("category axis `{}` has no labels", axis.name);
            }
            for lab in &axis.labels {
                if lab.name.trim().is_empty() || lab.description.trim().is_empty() {
                    bail!(
                        "category axis `{}` has a label without name or description",
                        axis.name
                    );
                }
            }
            for rule in &axis.keywords {
                if rule.key.trim().is_empty() {
                    bail!("category axis `{}` has an empty keyword", axis.name);
                }
                if !axis.labels.iter().any(|l| l.name == rule.label) {
                    bail!(
                        "category axis `{}` keyword `{}` maps to undeclared label `{}`",
                        axis.name,
                        rule.key,
                        rule.label
                    );
                }
            }
        }

        for th in &self.admission.thresholds {
            if !self.score_axes.iter().any(|a| a.name == th.axis) {
                return Err(anyhow!(
                    "admission threshold references unknown axis `{}`",
                    th.axis
                ));
            }
            if !th.min_best.is_finite() || !(0.0..=1.0).contains(&th.min_best) {
                bail!(
                    "admission threshold for `{}` must be in [0, 1], got {}",
                    th.axis,
                    th.min_best
                );
            }
        }
        if self.admission.enabled && self.admission.thresholds.is_empty() {
            bail!("admission filtering enabled but no thresholds configured");
        }

        if self.feeds.interval_secs == 0 {
            bail!("feeds.interval_secs must be positive");
        }
        for feed in &self.feeds.sources {
            if feed.url.trim().is_empty() || feed.source.trim().is_empty() {
                bail!("feed entries need both url and source");
            }
        }

        Ok(())
    }
}

fn reference_topic_axis() -> CategoryAxis {
    let keywords = [
        ("politics", "politics"),
        ("election", "politics"),
        ("government", "politics"),
        ("parliament", "politics"),
        ("business", "business"),
        ("finance", "business"),
        ("economy", "business"),
        ("market", "business"),
        ("tech", "tech"),
        ("technology", "tech"),
        ("science", "science"),
        ("health", "health"),
        ("sport", "sport"),
        ("cricket", "sport"),
        ("football", "sport"),
        ("tennis", "sport"),
        ("rugby", "sport"),
        ("afl", "sport"),
        ("nrl", "sport"),
        ("olympics", "sport"),
        ("entertainment", "entertainment"),
        ("movie", "entertainment"),
        ("music", "entertainment"),
        ("film", "entertainment"),
        ("tv", "entertainment"),
        ("television", "entertainment"),
        ("celebrity", "entertainment"),
        ("arts", "entertainment"),
        ("culture", "entertainment"),
        ("lifestyle", "entertainment"),
    ];
    let labels = [
        ("politics", "Government, elections, policy, laws, diplomacy, international relations, political parties, politicians, parliament, democracy."),
        ("tech", "Technology, software, hardware, AI, artificial intelligence, internet, startups, gadgets, cybersecurity, coding, silicon valley, digital."),
        ("business", "Economy, finance, markets, stock market, inflation, corporate news, companies, trade, jobs, unemployment, banking, investment."),
        ("science", "Scientific discovery, research, space, astronomy, biology, physics, chemistry, environment, climate change, nature, medical research."),
        ("health", "Medicine, wellness, fitness, nutrition, diseases, public health, hospitals, doctors, mental health, psychology, diet."),
        ("sport", "Sports, cricket, football, soccer, tennis, athletics, rugby, afl, nrl, olympics, games, matches, scores."),
        ("entertainment", "Movies, film, cinema, television, tv shows, music, celebrities, hollywood, bollywood, actors, art, culture."),
    ];
    CategoryAxis {
        name: "topic".into(),
        keywords: keywords
            .iter()
            .map(|(k, l)| KeywordRule {
                key: (*k).into(),
                label: (*l).into(),
            })
            .collect(),
        labels: labels
            .iter()
            .map(|(n, d)| CategoryDescription {
                name: (*n).into(),
                description: (*d).into(),
            })
            .collect(),
    }
}

fn reference_region_axis() -> CategoryAxis {
    let keywords = [
        ("australia", "australia"),
        ("sydney", "australia"),
        ("melbourne", "australia"),
        ("brisbane", "australia"),
        ("nsw", "australia"),
        ("victoria", "australia"),
        ("queensland", "australia"),
        ("india", "india"),
        ("delhi", "india"),
        ("mumbai", "india"),
        ("bangalore", "india"),
        ("chennai", "india"),
        ("kolkata", "india"),
        ("world", "world"),
        ("international", "world"),
        ("global", "world"),
        ("us", "world"),
        ("uk", "world"),
        ("europe", "world"),
        ("asia", "world"),
    ];
    let labels = [
        ("world", "Global news, international events, foreign affairs, United Nations, global conflict, cross-border issues."),
        ("india", "India, Indian government, Delhi, Mumbai, Bangalore, Chennai, Kolkata, Indian politics, Bollywood, cricket, Indian economy."),
        ("australia", "Australia, Australian government, Sydney, Melbourne, Brisbane, Australian politics, AFL, rugby, Australian economy."),
    ];
    CategoryAxis {
        name: "region".into(),
        keywords: keywords
            .iter()
            .map(|(k, l)| KeywordRule {
                key: (*k).into(),
                label: (*l).into(),
            })
            .collect(),
        labels: labels
            .iter()
            .map(|(n, d)| CategoryDescription {
                name: (*n).into(),
                description: (*d).into(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_config_is_valid() {
        PipelineConfig::reference().validate().expect("reference config");
    }

    #[test]
    fn threshold_for_unknown_axis_is_fatal() {
        let mut cfg = PipelineConfig::reference();
        cfg.admission.thresholds.push(AxisThreshold {
            axis: "no-such-axis".into(),
            min_best: 0.5,
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn out_of_range_threshold_is_fatal() {
        let mut cfg = PipelineConfig::reference();
        cfg.admission.thresholds[0].min_best = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn keyword_to_undeclared_label_is_fatal() {
        let mut cfg = PipelineConfig::reference();
        cfg.category_axes[0].keywords.push(KeywordRule {
            key: "chess".into(),
            label: "boardgames".into(),
        });
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn hypothesis_without_placeholder_is_fatal() {
        let mut cfg = PipelineConfig::reference();
        cfg.score_axes[0].hypothesis = "This article is factual".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_minimal_toml_with_defaults() {
        let cfg = PipelineConfig::from_toml_str(
            r#"
[filters]
snippet_min_words = 30

[classifier]
strategy = "sentences"
"#,
        )
        .expect("parse");
        assert_eq!(cfg.filters.snippet_min_words, 30);
        assert_eq!(cfg.classifier.strategy, InputStrategy::Sentences);
        // untouched sections fall back to defaults
        assert!((cfg.filters.scream_ratio - 0.3).abs() < 1e-6);
        assert_eq!(cfg.classifier.truncate_chars, 1000);
    }
}
