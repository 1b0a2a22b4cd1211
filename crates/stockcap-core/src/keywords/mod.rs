//! Keyword extraction from captions.
//!
//! A caption is lowercased, tagged with parts of speech, and filtered down to
//! nouns and adjectives plus adjacent noun/adjective pairs.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockcap_core::keywords::{KeywordExtractor, OnnxPosTagger};
//!
//! let tagger = OnnxPosTagger::load(&config.keywords, &config.tagger_model_dir())?;
//! let extractor = KeywordExtractor::new(Arc::new(tagger), &config.keywords);
//! let keywords = extractor.extract("a red apple on a wooden table", &path)?;
//! ```

pub mod pos;
pub mod stopwords;
pub mod tagger;

pub use pos::{PosTag, PosTagger, TaggedToken};
pub use stopwords::StopWords;
pub use tagger::OnnxPosTagger;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use crate::config::KeywordsConfig;
use crate::error::{PipelineError, PipelineResult};

/// Keyword rule over tagged tokens.
///
/// Unigrams first (non-stop nouns/adjectives of at least `min_length`
/// characters), then adjacent noun/adjective pairs with no stop word and a
/// joined length of at least `min_length * 2 + 1`. Duplicates keep their first
/// position; the list is cut at `max_keywords`.
pub fn extract_keywords(
    tokens: &[TaggedToken],
    max_keywords: usize,
    min_length: usize,
) -> Vec<String> {
    let unigrams = tokens
        .iter()
        .filter(|t| t.pos.is_keyword_candidate() && !t.is_stop)
        .filter(|t| t.text.chars().count() >= min_length)
        .map(|t| t.text.clone());

    let bigrams = tokens.windows(2).filter_map(|pair| {
        let (first, second) = (&pair[0], &pair[1]);
        if !first.pos.is_keyword_candidate() || !second.pos.is_keyword_candidate() {
            return None;
        }
        if first.is_stop || second.is_stop {
            return None;
        }
        let joined = format!("{} {}", first.text, second.text);
        (joined.chars().count() > min_length * 2).then_some(joined)
    });

    let mut seen = HashSet::new();
    unigrams
        .chain(bigrams)
        .filter(|k| seen.insert(k.clone()))
        .take(max_keywords)
        .collect()
}

/// Tags a caption and applies [`extract_keywords`].
pub struct KeywordExtractor {
    tagger: Arc<dyn PosTagger>,
    max_keywords: usize,
    min_length: usize,
}

impl KeywordExtractor {
    pub fn new(tagger: Arc<dyn PosTagger>, config: &KeywordsConfig) -> Self {
        Self {
            tagger,
            max_keywords: config.max_keywords,
            min_length: config.min_length,
        }
    }

    /// Keywords for one caption. `path` is only used for error context.
    pub fn extract(&self, caption: &str, path: &Path) -> PipelineResult<Vec<String>> {
        let lowered = caption.to_lowercase();
        let tokens = self
            .tagger
            .tag(&lowered)
            .map_err(|e| PipelineError::Keywords {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        let keywords = extract_keywords(&tokens, self.max_keywords, self.min_length);
        tracing::trace!("{} keyword(s) from {} token(s)", keywords.len(), tokens.len());
        Ok(keywords)
    }

    pub fn max_keywords(&self) -> usize {
        self.max_keywords
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Tags by dictionary lookup; anything unknown is a noun.
    pub(crate) struct LookupTagger;

    impl PosTagger for LookupTagger {
        fn tag(&self, text: &str) -> PipelineResult<Vec<TaggedToken>> {
            let stop = StopWords::english();
            Ok(text
                .split_whitespace()
                .map(|word| {
                    let pos = match word {
                        "a" | "an" | "the" => PosTag::Det,
                        "on" | "in" | "of" | "with" => PosTag::Adp,
                        "red" | "wooden" | "old" | "big" => PosTag::Adj,
                        "sitting" | "running" | "standing" => PosTag::Verb,
                        "," | "." => PosTag::Punct,
                        _ => PosTag::Noun,
                    };
                    TaggedToken::new(word, pos, stop)
                })
                .collect())
        }
    }

    fn tagged(words: &[(&str, PosTag)]) -> Vec<TaggedToken> {
        let stop = StopWords::english();
        words
            .iter()
            .map(|(w, p)| TaggedToken::new(*w, *p, stop))
            .collect()
    }

    #[test]
    fn test_unigrams_then_bigrams() {
        let tokens = tagged(&[
            ("a", PosTag::Det),
            ("red", PosTag::Adj),
            ("apple", PosTag::Noun),
            ("on", PosTag::Adp),
            ("a", PosTag::Det),
            ("wooden", PosTag::Adj),
            ("table", PosTag::Noun),
        ]);
        let keywords = extract_keywords(&tokens, 20, 2);
        assert_eq!(
            keywords,
            vec!["red", "apple", "wooden", "table", "red apple", "wooden table"]
        );
    }

    #[test]
    fn test_stop_words_excluded_from_unigrams_and_bigrams() {
        // "front" is a stop word even when tagged as a noun.
        let tokens = tagged(&[
            ("front", PosTag::Noun),
            ("door", PosTag::Noun),
            ("house", PosTag::Noun),
        ]);
        let keywords = extract_keywords(&tokens, 20, 2);
        assert_eq!(keywords, vec!["door", "house", "door house"]);
    }

    #[test]
    fn test_min_length_filters_short_words() {
        let tokens = tagged(&[("ox", PosTag::Noun), ("cart", PosTag::Noun)]);
        let keywords = extract_keywords(&tokens, 20, 3);
        // "ox cart" has 7 chars, the threshold is 3 * 2 + 1.
        assert_eq!(keywords, vec!["cart", "ox cart"]);

        let keywords = extract_keywords(&tokens, 20, 4);
        assert_eq!(keywords, vec!["cart"]);
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let tokens = tagged(&[
            ("dog", PosTag::Noun),
            ("and", PosTag::Cconj),
            ("dog", PosTag::Noun),
        ]);
        assert_eq!(extract_keywords(&tokens, 20, 2), vec!["dog"]);
    }

    #[test]
    fn test_truncated_to_max_keywords() {
        let tokens = tagged(&[
            ("sunny", PosTag::Adj),
            ("sandy", PosTag::Adj),
            ("beach", PosTag::Noun),
            ("palm", PosTag::Noun),
        ]);
        let keywords = extract_keywords(&tokens, 3, 2);
        assert_eq!(keywords, vec!["sunny", "sandy", "beach"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_keywords(&[], 20, 2).is_empty());
    }

    #[test]
    fn test_extractor_lowercases_caption() {
        let extractor =
            KeywordExtractor::new(Arc::new(LookupTagger), &KeywordsConfig::default());
        let keywords = extractor
            .extract("A Red Apple", Path::new("apple.jpg"))
            .unwrap();
        assert_eq!(keywords, vec!["red", "apple", "red apple"]);
    }

    #[test]
    fn test_extractor_wraps_tagger_errors() {
        struct Failing;
        impl PosTagger for Failing {
            fn tag(&self, _text: &str) -> PipelineResult<Vec<TaggedToken>> {
                Err(PipelineError::Model {
                    message: "no session".to_string(),
                })
            }
        }

        let extractor = KeywordExtractor::new(Arc::new(Failing), &KeywordsConfig::default());
        let err = extractor.extract("a cat", Path::new("cat.png")).unwrap_err();
        assert!(matches!(err, PipelineError::Keywords { .. }));
        assert!(err.to_string().contains("cat.png"));
    }
}
