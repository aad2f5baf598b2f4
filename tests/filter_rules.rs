// tests/filter_rules.rs
//! Observable properties of the heuristic filter chain: rule ordering,
//! exemptions, and the snippet boundary.

use news_triage::config::FilterConfig;
use news_triage::filters::evaluate;
use news_triage::types::FilterStatus;

const LONG_BODY: &str = "The report runs to several hundred pages and was compiled \
    over two years of hearings, drawing on testimony from dozens of witnesses and \
    thousands of submitted documents across every state and territory.";

#[test]
fn zero_alpha_titles_never_trip_the_scream_check() {
    let cfg = FilterConfig::default();
    for title in ["", "2024", "$$$ 100% !", "12345 — 67890"] {
        let v = evaluate(&cfg, title, LONG_BODY);
        assert_ne!(
            v.status,
            FilterStatus::Filtered,
            "title {title:?} has no letters and must pass the scream check"
        );
    }
}

#[test]
fn punctuation_spam_substrings_are_exhaustive() {
    let cfg = FilterConfig::default();
    for title in ["Wait!! more", "Why?? now", "Seriously?! again"] {
        let v = evaluate(&cfg, title, LONG_BODY);
        assert_eq!(v.status, FilterStatus::Filtered, "title: {title}");
        assert!(v.reason.unwrap().starts_with("Punctuation Spam"));
    }
    for title in ["One question?", "One exclamation!", "Plain title"] {
        let v = evaluate(&cfg, title, LONG_BODY);
        assert_ne!(v.status, FilterStatus::Filtered, "title: {title}");
    }
}

#[test]
fn reference_ragebait_title_is_filtered_by_the_first_matching_rule() {
    let cfg = FilterConfig::default();
    let v = evaluate(
        &cfg,
        "SHOCKING: Politicians DESTROYED by This One Simple Trick!",
        "You won't believe what happened next. This will make you furious!",
    );
    assert_eq!(v.status, FilterStatus::Filtered);
    // Several rules match this title (caps ratio, trigger words). The chain
    // is ordered and the scream check runs first, so its reason must win.
    assert_eq!(v.reason.as_deref(), Some("Scream Check (>30% CAPS)"));
}

#[test]
fn trigger_word_fires_when_earlier_rules_pass() {
    let cfg = FilterConfig::default();
    // Lowercase title: no scream, no spam punctuation; trigger rule decides.
    let v = evaluate(&cfg, "Report quietly destroyed by committee", LONG_BODY);
    assert_eq!(v.status, FilterStatus::Filtered);
    assert_eq!(v.reason.as_deref(), Some("Trigger Word: Destroyed"));
}

#[test]
fn snippet_boundary_is_exclusive_at_the_threshold() {
    let cfg = FilterConfig::default();
    let words19 = vec!["token"; 19].join(" ");
    let words20 = vec!["token"; 20].join(" ");

    let v = evaluate(&cfg, "Plain headline", &words19);
    assert_eq!(v.status, FilterStatus::Snippet);
    assert_eq!(v.word_count, 19);

    let v = evaluate(&cfg, "Plain headline", &words20);
    assert_eq!(v.status, FilterStatus::Clean);
    assert_eq!(v.word_count, 20);
}

#[test]
fn custom_trigger_list_and_threshold_are_honored() {
    let cfg = FilterConfig {
        trigger_words: vec!["Slams".into()],
        snippet_min_words: 5,
        ..FilterConfig::default()
    };
    let v = evaluate(&cfg, "Senator slams new proposal", LONG_BODY);
    assert_eq!(v.reason.as_deref(), Some("Trigger Word: Slams"));

    let v = evaluate(&cfg, "Plain headline", "just four words here");
    assert_eq!(v.status, FilterStatus::Snippet);
    let v = evaluate(&cfg, "Plain headline", "now we have five words");
    assert_eq!(v.status, FilterStatus::Clean);
}
