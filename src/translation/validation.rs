/*!
 * Acceptance checks for candidate translations.
 *
 * A candidate is rejected when it shows one of the usual failure modes of
 * translation models: empty or echoed output, refusals, text still in the
 * source language, runaway repetition, leaked prompt placeholders, a wildly
 * different length, invented URLs, or markup/variables that don't match the
 * source. Checks run in a fixed order and the first failure is reported.
 */

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;

use super::extraction::strip_thinking;
use crate::language_utils::{LanguageDetector, is_english};

/// Phrases models use when declining to translate
const REFUSAL_PHRASES: [&str; 4] = ["i'm sorry", "i cannot", "i am unable", "as an ai"];

/// Kana, CJK ideographs and halfwidth katakana
static CJK_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\u{3040}-\u{30ff}\u{3400}-\u{4dbf}\u{4e00}-\u{9fff}\u{f900}-\u{faff}\u{ff66}-\u{ff9f}]")
        .expect("Invalid CJK regex")
});

/// Prompt scaffolding that leaked into the output
static PLACEHOLDER_LEAK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\[\s*translation\s+here\s*\]",
        r"(?i)\[\s*insert\s+translation\s*\]",
        r"(?i)placeholder",
        r"(?i)\[\s*\.\.\.\s*\]",
        r"(?i)\(\s*translation\s*\)",
        r"(?i)your translation here",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("Invalid placeholder leak regex"))
    .collect()
});

static URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"https?://[^\s<>"']+|www\.[^\s<>"']+"#).expect("Invalid URL regex")
});

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("Invalid tag regex"));

static VARIABLE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"%\w+").expect("Invalid variable regex"));

/// Why a candidate translation was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    /// Nothing left after trimming
    Empty,
    /// Same as the source, ignoring case
    Unchanged,
    /// Contains a refusal phrase
    Refusal(&'static str),
    /// Detected as another language
    NotEnglish(String),
    /// Still contains Japanese or Chinese characters
    CjkCharacters,
    /// More than one line in line-by-line mode
    MultipleLines,
    /// One word dominates a long output
    Repetitive { word: String, share: f64 },
    /// Repeats a long source text verbatim
    ContainsOriginal,
    /// Prompt placeholder text leaked through
    PlaceholderLeak(String),
    /// Length far from the source length
    LengthRatio(f64),
    /// Introduces a URL the source doesn't have
    NewUrl(String),
    /// Markup tags differ from the source
    TagMismatch,
    /// `%variable` tokens differ from the source
    VariableMismatch,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "translation is empty"),
            Self::Unchanged => write!(f, "translation is identical to original"),
            Self::Refusal(phrase) => write!(f, "translation contains refusal phrase '{}'", phrase),
            Self::NotEnglish(code) => write!(f, "translation is not in English (detected '{}')", code),
            Self::CjkCharacters => write!(f, "translation contains Japanese characters"),
            Self::MultipleLines => write!(f, "translation contains multiple lines in line-by-line mode"),
            Self::Repetitive { word, share } => {
                write!(f, "translation is repetitive ('{}' is {:.0}% of words)", word, share * 100.0)
            }
            Self::ContainsOriginal => write!(f, "translation contains the original text"),
            Self::PlaceholderLeak(found) => write!(f, "translation contains placeholder text '{}'", found),
            Self::LengthRatio(ratio) => write!(f, "length ratio {:.2} is outside the 0.3-3.5 range", ratio),
            Self::NewUrl(url) => write!(f, "translation introduces URL '{}'", url),
            Self::TagMismatch => write!(f, "markup tags differ from original"),
            Self::VariableMismatch => write!(f, "%variables differ from original"),
        }
    }
}

/// Heuristic validator for candidate translations
pub struct TranslationValidator<'a> {
    detector: &'a dyn LanguageDetector,
}

impl<'a> TranslationValidator<'a> {
    /// Create a validator using `detector` for the language check
    pub fn new(detector: &'a dyn LanguageDetector) -> Self {
        Self { detector }
    }

    /// Whether `candidate` is an acceptable translation of `original`
    pub fn is_valid(&self, original: &str, candidate: &str, line_by_line: bool) -> bool {
        match self.check(original, candidate, line_by_line) {
            Ok(()) => true,
            Err(rejection) => {
                debug!("Validation failed: {}", rejection);
                false
            }
        }
    }

    /// Run every check in order, reporting the first failure
    pub fn check(&self, original: &str, candidate: &str, line_by_line: bool) -> Result<(), Rejection> {
        let candidate = strip_thinking(candidate);
        let original = strip_thinking(original);
        let candidate_lower = candidate.to_lowercase();
        let original_lower = original.to_lowercase();

        if candidate.is_empty() {
            return Err(Rejection::Empty);
        }
        if candidate_lower == original_lower {
            return Err(Rejection::Unchanged);
        }

        if let Some(phrase) = REFUSAL_PHRASES.iter().find(|phrase| candidate_lower.contains(*phrase)) {
            return Err(Rejection::Refusal(*phrase));
        }

        match self.detector.detect(&candidate) {
            Ok(code) if !is_english(&code) => return Err(Rejection::NotEnglish(code)),
            Ok(_) => {}
            Err(e) => debug!("{}, assuming valid", e),
        }

        if CJK_REGEX.is_match(&candidate) {
            return Err(Rejection::CjkCharacters);
        }

        if line_by_line && candidate.lines().count() > 1 {
            return Err(Rejection::MultipleLines);
        }

        check_repetition(&candidate_lower)?;

        if original.chars().count() > 20 && candidate_lower.contains(&original_lower) {
            return Err(Rejection::ContainsOriginal);
        }

        if let Some(found) = PLACEHOLDER_LEAK_PATTERNS
            .iter()
            .find_map(|pattern| pattern.find(&candidate))
        {
            return Err(Rejection::PlaceholderLeak(found.as_str().to_string()));
        }

        let original_len = original.chars().count();
        if original_len >= 15 {
            let ratio = candidate.chars().count() as f64 / original_len as f64;
            if !(ratio > 0.3 && ratio < 3.5) {
                return Err(Rejection::LengthRatio(ratio));
            }
        }

        let original_urls = token_set(&URL_REGEX, &original);
        if let Some(url) = URL_REGEX
            .find_iter(&candidate)
            .map(|m| m.as_str())
            .find(|url| !original_urls.contains(url))
        {
            return Err(Rejection::NewUrl(url.to_string()));
        }

        if token_set(&TAG_REGEX, &candidate) != token_set(&TAG_REGEX, &original) {
            return Err(Rejection::TagMismatch);
        }

        if token_set(&VARIABLE_REGEX, &candidate) != token_set(&VARIABLE_REGEX, &original) {
            return Err(Rejection::VariableMismatch);
        }

        Ok(())
    }
}

/// Reject long outputs where one word makes up more than 40% of all words
fn check_repetition(lowercase: &str) -> Result<(), Rejection> {
    let words: Vec<&str> = lowercase.split_whitespace().collect();
    if words.len() <= 10 {
        return Ok(());
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in &words {
        *counts.entry(word).or_insert(0) += 1;
    }

    if let Some((word, count)) = counts.into_iter().max_by_key(|(_, count)| *count) {
        let share = count as f64 / words.len() as f64;
        if share > 0.4 {
            return Err(Rejection::Repetitive { word: word.to_string(), share });
        }
    }
    Ok(())
}

fn token_set<'t>(regex: &Regex, text: &'t str) -> HashSet<&'t str> {
    regex.find_iter(text).map(|m| m.as_str()).collect()
}
