//! Lexical valence scoring for chunk text.

use super::chunk::Sentiment;
use regex::Regex;
use std::sync::OnceLock;

// Word boundaries are ASCII-only: a letter like "é" does not extend a word.
const POSITIVE: &str = r"(?i)(?-u:\b)(love|happy|great|thanks|thank you|wonderful|amazing|awesome|excellent|good|nice|appreciate)(?-u:\b)";
const NEGATIVE: &str = r"(?i)(?-u:\b)(hate|sad|angry|frustrated|terrible|awful|bad|wrong|sorry|unfortunately|problem|issue)(?-u:\b)";

fn positive() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(POSITIVE).expect("positive lexicon is a valid pattern"))
}

fn negative() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NEGATIVE).expect("negative lexicon is a valid pattern"))
}

/// Scores text as positive, negative or neutral.
///
/// Only presence counts: a text containing words from both lexicons is
/// neutral, however many of each it holds.
pub fn score(text: &str) -> Sentiment {
    match (positive().is_match(text), negative().is_match(text)) {
        (true, false) => Sentiment::Positive,
        (false, true) => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}
