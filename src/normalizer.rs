use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;

lazy_static::lazy_static! {
    static ref ENGLISH: Vec<&'static str> = vec![
        "a", "about", "above", "after", "again", "against", "all", "am", "an", "and",
        "any", "are", "aren't", "as", "at", "be", "because", "been", "before", "being",
        "below", "between", "both", "but", "by", "can't", "cannot", "could", "couldn't",
        "did", "didn't", "do", "does", "doesn't", "doing", "don't", "down", "during",
        "each", "few", "for", "from", "further", "had", "hadn't", "has", "hasn't",
        "have", "haven't", "having", "he", "he'd", "he'll", "he's", "her", "here",
        "here's", "hers", "herself", "him", "himself", "his", "how", "how's", "i",
        "i'd", "i'll", "i'm", "i've", "if", "in", "into", "is", "isn't", "it", "it's",
        "its", "itself", "let's", "me", "more", "most", "mustn't", "my", "myself",
        "no", "nor", "not", "of", "off", "on", "once", "only", "or", "other", "ought",
        "our", "ours", "ourselves", "out", "over", "own", "same", "shan't", "she",
        "she'd", "she'll", "she's", "should", "shouldn't", "so", "some", "such",
        "than", "that", "that's", "the", "their", "theirs", "them", "themselves",
        "then", "there", "there's", "these", "they", "they'd", "they'll", "they're",
        "they've", "this", "those", "through", "to", "too", "under", "until", "up",
        "very", "was", "wasn't", "we", "we'd", "we'll", "we're", "we've", "were",
        "weren't", "what", "what's", "when", "when's", "where", "where's", "which",
        "while", "who", "who's", "whom", "why", "why's", "with", "won't", "would",
        "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your", "yours",
        "yourself", "yourselves",
    ];

    // Filler that dominates every address and drowns out word clouds
    static ref ADDRESS_FILLER: Vec<&'static str> = vec![
        "will", "can", "must", "us", "also", "upon", "shall", "may", "one", "every",
        "now", "year", "years", "new", "make", "made", "many", "much", "well", "just",
        "let", "time", "today", "tonight", "know", "need", "want", "get", "like",
        "people", "nation", "nations", "country", "america", "american", "americans",
        "government", "congress", "states", "united", "world", "great", "work",
        "applause", "mr", "speaker", "president", "ask", "come", "even", "first",
        "last", "way", "help", "good", "together", "across",
    ];
}

/// A set of words dropped during normalization.
///
/// Entries pass through the same punctuation stripping as document text, so
/// "don't" in the list matches the normalized token "dont".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopWords {
    words: HashSet<String>,
}

impl StopWords {
    pub fn none() -> Self {
        Self::default()
    }

    /// Standard English list, used when vectorizing
    pub fn english() -> Self {
        Self::from_words(ENGLISH.iter().copied())
    }

    /// English list plus address filler, used for word-frequency tables
    pub fn extended() -> Self {
        Self::english().with_words(ADDRESS_FILLER.iter().copied())
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::none().with_words(words)
    }

    pub fn with_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = remove_digits(&remove_punctuation(&word.as_ref().to_lowercase()));
            let word = word.trim();
            if !word.is_empty() {
                self.words.insert(word.to_string());
            }
        }
        self
    }

    pub fn contains(&self, token: &str) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub stop_words: StopWords,
    pub stem: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            stop_words: StopWords::english(),
            stem: false,
        }
    }
}

pub struct Normalizer {
    stop_words: StopWords,
    stemmer: Option<Stemmer>,
}

/// Punctuation and symbols are deleted, not replaced by a space
pub fn remove_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

pub fn remove_digits(text: &str) -> String {
    text.chars().filter(|c| !c.is_numeric()).collect()
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            stop_words: config.stop_words,
            stemmer: config.stem.then(|| Stemmer::create(Algorithm::English)),
        }
    }

    pub fn with_stop_words(stop_words: StopWords) -> Self {
        Self::new(NormalizerConfig {
            stop_words,
            stem: false,
        })
    }

    pub fn stop_words(&self) -> &StopWords {
        &self.stop_words
    }

    /// Split on whitespace, collapsing runs
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    /// Remove stopwords
    fn stopword_filter(&self, tokens: Vec<String>) -> Vec<String> {
        tokens
            .into_iter()
            .filter(|t| !self.stop_words.contains(t))
            .collect()
    }

    /// Apply stemming when enabled
    fn stemmer_filter(&self, tokens: Vec<String>) -> Vec<String> {
        match &self.stemmer {
            Some(stemmer) => tokens
                .into_iter()
                .map(|t| stemmer.stem(&t).to_string())
                .collect(),
            None => tokens,
        }
    }

    /// Full normalization pipeline
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let text = text.to_lowercase();
        let text = remove_punctuation(&text);
        let text = remove_digits(&text);
        let tokens = self.tokenize(&text);
        let tokens = self.stopword_filter(tokens);
        self.stemmer_filter(tokens)
    }

    /// Normalized text with single spaces between tokens
    pub fn normalize_to_string(&self, text: &str) -> String {
        self.normalize(text).join(" ")
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}
