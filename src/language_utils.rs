use anyhow::{Result, anyhow};
use isolang::Language;

use crate::errors::DetectionError;

/// Language utilities: detection and ISO code handling
///
/// Detection is behind the `LanguageDetector` trait so the collector and the
/// validator can be driven by a deterministic detector in tests. Codes coming
/// out of a detector are normalised to ISO 639-1 where one exists.
pub trait LanguageDetector: Send + Sync {
    /// Detect the language of `text`, returning an ISO 639-1 code when possible
    fn detect(&self, text: &str) -> Result<String, DetectionError>;
}

impl<F> LanguageDetector for F
where
    F: Fn(&str) -> Result<String, DetectionError> + Send + Sync,
{
    fn detect(&self, text: &str) -> Result<String, DetectionError> {
        self(text)
    }
}

/// Trigram/script based detector backed by `whatlang`
#[derive(Debug, Default, Clone, Copy)]
pub struct WhatlangDetector;

impl LanguageDetector for WhatlangDetector {
    fn detect(&self, text: &str) -> Result<String, DetectionError> {
        let info = whatlang::detect(text)
            .ok_or_else(|| DetectionError(format!("no features in {:?}", truncate(text, 30))))?;
        if !info.is_reliable() {
            return Err(DetectionError(format!(
                "unreliable guess '{}' ({:.2}) for {:?}",
                info.lang().code(),
                info.confidence(),
                truncate(text, 30)
            )));
        }
        let code = info.lang().code();
        normalize_to_part1_or_part2t(code).map_err(|e| DetectionError(e.to_string()))
    }
}

/// Detector that always gives the same answer
#[derive(Debug, Clone)]
pub struct FixedDetector {
    result: Option<String>,
}

impl FixedDetector {
    /// Always detect `code`
    pub fn always(code: &str) -> Self {
        Self { result: Some(code.to_string()) }
    }

    /// Always fail
    pub fn failing() -> Self {
        Self { result: None }
    }
}

impl LanguageDetector for FixedDetector {
    fn detect(&self, _text: &str) -> Result<String, DetectionError> {
        self.result
            .clone()
            .ok_or_else(|| DetectionError("detection disabled".to_string()))
    }
}

/// Map an ISO 639-2/B code to its 639-2/T form
fn bibliographic_to_terminology(code: &str) -> &str {
    match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "per" => "fas",
        "rum" => "ron",
        "slo" => "slk",
        _ => code,
    }
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String> {
    let normalized_code = code.trim().to_lowercase();

    if normalized_code.len() == 2 {
        if Language::from_639_1(&normalized_code).is_some() {
            return Ok(normalized_code);
        }
    } else if normalized_code.len() == 3 {
        let part2t = bibliographic_to_terminology(&normalized_code);
        if let Some(lang) = Language::from_639_3(part2t) {
            if let Some(code_639_1) = lang.to_639_1() {
                return Ok(code_639_1.to_string());
            }
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part1_or_part2t(code1), normalize_to_part1_or_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// True if `code` names English
pub fn is_english(code: &str) -> bool {
    language_codes_match(code, "en")
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_shouldPreferPart1() {
        assert_eq!(normalize_to_part1_or_part2t("eng").unwrap(), "en");
        assert_eq!(normalize_to_part1_or_part2t("JPN").unwrap(), "ja");
        assert_eq!(normalize_to_part1_or_part2t("ger").unwrap(), "de");
        assert!(normalize_to_part1_or_part2t("zz").is_err());
    }

    #[test]
    fn test_isEnglish_shouldAcceptBothCodeForms() {
        assert!(is_english("en"));
        assert!(is_english("eng"));
        assert!(!is_english("ja"));
        assert!(!is_english("not-a-code"));
    }

    #[test]
    fn test_closureDetector_shouldBeUsable() {
        let detector = |text: &str| -> Result<String, DetectionError> {
            if text.is_empty() { Err(DetectionError("empty".into())) } else { Ok("en".into()) }
        };
        assert_eq!(detector.detect("hi").unwrap(), "en");
        assert!(detector.detect("").is_err());
    }

    #[test]
    fn test_whatlangDetector_shouldRecognizeJapanese() {
        let detected = WhatlangDetector.detect("これは日本語の文章です。今日はいい天気ですね。").unwrap();
        assert_eq!(detected, "ja");
    }

    #[test]
    fn test_whatlangDetector_shortText_shouldFailRatherThanGuess() {
        assert!(WhatlangDetector.detect("Hello").is_err());
    }

    #[test]
    fn test_whatlangDetector_noLetters_shouldFail() {
        assert!(WhatlangDetector.detect("1234 !!").is_err());
    }
}
