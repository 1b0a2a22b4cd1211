//! Embedded English stop-word list.

use std::collections::HashSet;
use std::sync::OnceLock;

const ENGLISH: &str = include_str!("../../data/stopwords.txt");

/// Case-insensitive stop-word lookup.
#[derive(Debug, Clone)]
pub struct StopWords {
    words: HashSet<&'static str>,
}

impl StopWords {
    /// The built-in English list, parsed once per process.
    pub fn english() -> &'static StopWords {
        static LIST: OnceLock<StopWords> = OnceLock::new();
        LIST.get_or_init(|| Self::from_list(ENGLISH))
    }

    /// Build a list from newline-separated words. Blank lines and `#` comments
    /// are ignored.
    pub fn from_list(list: &'static str) -> Self {
        let words = list
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        Self { words }
    }

    pub fn contains(&self, word: &str) -> bool {
        if self.words.contains(word) {
            return true;
        }
        let lower = word.to_lowercase();
        self.words.contains(lower.as_str())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}
