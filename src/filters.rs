// src/filters.rs
//! Heuristic filter chain: fast, deterministic title/body checks that reject
//! manipulative content before any classifier cycles are spent.
//!
//! Checks run in a fixed order and the first match wins:
//! scream ratio -> punctuation spam -> trigger words -> body length.

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::config::FilterConfig;
use crate::types::{FilterStatus, FilterVerdict};

/// Ratio of uppercase to (uppercase + lowercase) letters in the title.
/// Titles with zero alphabetic characters are exempt (ratio undefined).
fn scream_check(title: &str, max_ratio: f32) -> bool {
    let uppers = title.chars().filter(|c| c.is_uppercase()).count();
    let lowers = title.chars().filter(|c| c.is_lowercase()).count();
    let total = uppers + lowers;
    if total == 0 {
        return false;
    }
    (uppers as f32 / total as f32) > max_ratio
}

fn punctuation_spam(title: &str, tokens: &[String]) -> bool {
    tokens.iter().any(|t| title.contains(t.as_str()))
}

/// First matching phrase in list order, matched case-insensitively.
fn trigger_word<'a>(title: &str, words: &'a [String]) -> Option<&'a str> {
    let lowered = title.to_lowercase();
    words
        .iter()
        .find(|w| lowered.contains(&w.to_lowercase()))
        .map(String::as_str)
}

/// Word tokens in the body, `\w+` over Unicode.
pub fn word_count(body: &str) -> usize {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?u)\w+").expect("word regex"));
    re.find_iter(body).count()
}

/// Evaluate the full chain. Pure function, no I/O, no model calls.
/// `word_count` is attached to the verdict regardless of which rule fired.
pub fn evaluate(cfg: &FilterConfig, title: &str, body: &str) -> FilterVerdict {
    let count = word_count(body);

    if scream_check(title, cfg.scream_ratio) {
        return FilterVerdict {
            status: FilterStatus::Filtered,
            reason: Some(format!(
                "Scream Check (>{:.0}% CAPS)",
                cfg.scream_ratio * 100.0
            )),
            word_count: count,
        };
    }

    if punctuation_spam(title, &cfg.spam_tokens) {
        return FilterVerdict {
            status: FilterStatus::Filtered,
            reason: Some(format!(
                "Punctuation Spam ({})",
                cfg.spam_tokens.join(", ")
            )),
            word_count: count,
        };
    }

    if let Some(word) = trigger_word(title, &cfg.trigger_words) {
        return FilterVerdict {
            status: FilterStatus::Filtered,
            reason: Some(format!("Trigger Word: {word}")),
            word_count: count,
        };
    }

    // Empty body is always a snippet, whatever the configured minimum.
    if body.trim().is_empty() || count < cfg.snippet_min_words {
        return FilterVerdict {
            status: FilterStatus::Snippet,
            reason: Some(format!(
                "Snippet/Low Depth (< {} words)",
                cfg.snippet_min_words
            )),
            word_count: count,
        };
    }

    FilterVerdict {
        status: FilterStatus::Clean,
        reason: None,
        word_count: count,
    }
}
