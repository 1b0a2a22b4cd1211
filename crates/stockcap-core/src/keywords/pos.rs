//! Part-of-speech tags and the tagger seam.

use serde::{Deserialize, Serialize};

use crate::error::PipelineResult;

use super::stopwords::StopWords;

/// Universal POS tag set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PosTag {
    Adj,
    Adp,
    Adv,
    Aux,
    Cconj,
    Det,
    Intj,
    Noun,
    Num,
    Part,
    Pron,
    Propn,
    Punct,
    Sconj,
    Sym,
    Verb,
    X,
}

impl PosTag {
    /// Parse a model label.
    ///
    /// Accepts Universal tags and Penn Treebank tags, with or without a
    /// `B-`/`I-` prefix, in any case. Unknown labels map to [`PosTag::X`].
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        let bare = trimmed
            .strip_prefix("B-")
            .or_else(|| trimmed.strip_prefix("I-"))
            .or_else(|| trimmed.strip_prefix("b-"))
            .or_else(|| trimmed.strip_prefix("i-"))
            .unwrap_or(trimmed);

        match bare.to_uppercase().as_str() {
            "ADJ" | "JJ" | "JJR" | "JJS" => Self::Adj,
            "ADP" | "IN" => Self::Adp,
            "ADV" | "RB" | "RBR" | "RBS" | "WRB" => Self::Adv,
            "AUX" | "MD" => Self::Aux,
            "CCONJ" | "CONJ" | "CC" => Self::Cconj,
            "DET" | "DT" | "PDT" | "WDT" => Self::Det,
            "INTJ" | "UH" => Self::Intj,
            "NOUN" | "NN" | "NNS" => Self::Noun,
            "NUM" | "CD" => Self::Num,
            "PART" | "RP" | "TO" | "POS" => Self::Part,
            "PRON" | "PRP" | "PRP$" | "WP" | "WP$" | "EX" => Self::Pron,
            "PROPN" | "NNP" | "NNPS" => Self::Propn,
            "PUNCT" | "." | "," | ":" | "``" | "''" | "-LRB-" | "-RRB-" | "HYPH" => Self::Punct,
            "SCONJ" => Self::Sconj,
            "SYM" | "$" | "#" => Self::Sym,
            "VERB" | "VB" | "VBD" | "VBG" | "VBN" | "VBP" | "VBZ" => Self::Verb,
            _ => Self::X,
        }
    }

    /// Nouns and adjectives are the only tags that become keywords.
    pub fn is_keyword_candidate(self) -> bool {
        matches!(self, Self::Noun | Self::Adj)
    }
}

/// A word with its tag and stop-word flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub text: String,
    pub pos: PosTag,
    pub is_stop: bool,
}

impl TaggedToken {
    pub fn new(text: impl Into<String>, pos: PosTag, stop_words: &StopWords) -> Self {
        let text = text.into();
        let is_stop = stop_words.contains(&text);
        Self { text, pos, is_stop }
    }
}

/// Anything that can tag the words of a sentence.
///
/// Called from blocking worker threads, so implementations must be shareable.
pub trait PosTagger: Send + Sync {
    fn tag(&self, text: &str) -> PipelineResult<Vec<TaggedToken>>;
}
