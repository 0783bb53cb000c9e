//! Raw tag cleaning and stemming
//!
//! A raw tag is free text ("Machine Learning Tutorial") and yields zero or
//! more tokens. The steps always run in the same order:
//!
//! 1. split on whitespace
//! 2. optionally keep only `[A-Za-z0-9]` characters
//! 3. drop stopwords
//! 4. strip punctuation and digits
//! 5. lowercase
//! 6. drop empty tokens
//! 7. drop excluded tokens
//! 8. Porter-stem

pub mod porter;
pub mod stopwords;

use std::collections::HashSet;

use crate::config::NormalizerConfig;

pub use stopwords::ENGLISH_STOPWORDS;

/// A cleaned token and its stem
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedToken {
    pub processed: String,
    pub stemmed: String,
}

/// Deterministic tag normalizer
#[derive(Debug, Clone)]
pub struct TagNormalizer {
    ascii_filter: bool,
    stopwords: HashSet<String>,
    excluded: HashSet<String>,
}

impl TagNormalizer {
    /// Normalizer with the ASCII filter on, English stopwords, no exclusions
    pub fn new() -> Self {
        Self {
            ascii_filter: true,
            stopwords: ENGLISH_STOPWORDS.iter().map(|w| w.to_string()).collect(),
            excluded: HashSet::new(),
        }
    }

    pub fn from_config(config: &NormalizerConfig) -> Self {
        let mut normalizer = Self::new()
            .with_ascii_filter(config.ascii_filter)
            .with_excluded(config.excluded_tags.iter().map(String::as_str));
        normalizer
            .stopwords
            .extend(config.extra_stopwords.iter().map(|w| w.to_lowercase()));
        normalizer
    }

    pub fn with_ascii_filter(mut self, enabled: bool) -> Self {
        self.ascii_filter = enabled;
        self
    }

    /// Tokens to drop after cleaning, e.g. a platform name present on most videos
    pub fn with_excluded<'a>(mut self, tokens: impl IntoIterator<Item = &'a str>) -> Self {
        self.excluded
            .extend(tokens.into_iter().map(|t| t.to_lowercase()));
        self
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(&token.to_lowercase())
    }

    /// Normalize one raw tag into its stemmed tokens
    pub fn normalize(&self, raw_tag: &str) -> Vec<NormalizedToken> {
        raw_tag
            .split_whitespace()
            .map(|word| {
                if self.ascii_filter {
                    word.chars().filter(char::is_ascii_alphanumeric).collect()
                } else {
                    word.to_string()
                }
            })
            .filter(|word: &String| !self.is_stopword(word))
            .map(|word| {
                word.chars()
                    .filter(|c| !c.is_ascii_punctuation() && !c.is_numeric())
                    .collect::<String>()
            })
            .map(|word| word.to_lowercase())
            .filter(|word| !word.is_empty())
            .filter(|word| !self.excluded.contains(word))
            .filter_map(|processed| {
                let stemmed = porter::stem(&processed);
                if stemmed.is_empty() {
                    None
                } else {
                    Some(NormalizedToken { processed, stemmed })
                }
            })
            .collect()
    }
}

impl Default for TagNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stems(normalizer: &TagNormalizer, raw: &str) -> Vec<String> {
        normalizer
            .normalize(raw)
            .into_iter()
            .map(|t| t.stemmed)
            .collect()
    }

    #[test]
    fn test_punctuation_digits_and_case() {
        let normalizer = TagNormalizer::new();
        let tokens = normalizer.normalize("Machine-Learning 101");

        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].processed, "machinelearning");
        assert_eq!(tokens[0].stemmed, "machinelearn");
    }

    #[test]
    fn test_multi_word_tag() {
        let normalizer = TagNormalizer::new();
        assert_eq!(
            stems(&normalizer, "Python Programming Tutorials"),
            vec!["python", "program", "tutori"]
        );
    }

    #[test]
    fn test_stopwords_removed_case_insensitively() {
        let normalizer = TagNormalizer::new();
        assert_eq!(stems(&normalizer, "The art of coding"), vec!["art", "code"]);
        assert!(normalizer.is_stopword("THE"));
    }

    #[test]
    fn test_excluded_tokens() {
        let normalizer = TagNormalizer::new().with_excluded(["Python"]);
        assert_eq!(stems(&normalizer, "python tutorial"), vec!["tutori"]);
        assert!(normalizer.normalize("PYTHON").is_empty());
    }

    #[test]
    fn test_never_yields_empty_tokens() {
        let normalizer = TagNormalizer::new();
        for raw in ["", "   ", "2024", "!!! ???", "a the of", "--- 42 ..."] {
            assert!(normalizer.normalize(raw).is_empty(), "{raw:?}");
        }
        for token in normalizer.normalize("C++ 2024 Tips & Tricks") {
            assert!(!token.processed.is_empty());
            assert!(!token.stemmed.is_empty());
        }
    }

    #[test]
    fn test_ascii_filter_toggle() {
        let filtered = TagNormalizer::new();
        let unfiltered = TagNormalizer::new().with_ascii_filter(false);

        assert_eq!(stems(&filtered, "café"), vec!["caf"]);
        assert_eq!(stems(&unfiltered, "café"), vec!["café"]);
        // Punctuation is stripped either way
        assert_eq!(stems(&unfiltered, "data-science"), vec!["datasci"]);
    }

    #[test]
    fn test_deterministic() {
        let normalizer = TagNormalizer::new();
        let raw = "Deep Learning, Neural-Networks and AI 2023";
        assert_eq!(normalizer.normalize(raw), normalizer.normalize(raw));
    }

    #[test]
    fn test_from_config() {
        let config = NormalizerConfig {
            ascii_filter: true,
            excluded_tags: vec!["youtube".to_string()],
            extra_stopwords: vec!["Tutorial".to_string()],
        };
        let normalizer = TagNormalizer::from_config(&config);
        assert_eq!(stems(&normalizer, "YouTube tutorial editing"), vec!["edit"]);
    }
}
