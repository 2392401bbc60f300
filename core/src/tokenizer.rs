use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}+").expect("valid regex");
}

/// Per-operand hook applied by the evaluator before index lookup. Must match
/// whatever normalization produced the indexed stems.
pub trait Normalizer: Send + Sync {
    fn normalize(&self, raw: &str) -> String;
}

/// Text in, ordered stems out.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<String>;
}

/// Leaves operands untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct Identity;

impl Normalizer for Identity {
    fn normalize(&self, raw: &str) -> String {
        raw.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Russian,
    English,
}

impl Language {
    fn algorithm(self) -> Algorithm {
        match self {
            Language::Russian => Algorithm::Russian,
            Language::English => Algorithm::English,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    pub language: Language,
    /// Tokens shorter than this (in chars) are dropped.
    pub min_token_len: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { language: Language::Russian, min_token_len: 1 }
    }
}

/// NFKC + lowercase + alphabetic runs + Snowball stemming.
pub struct SnowballAnalyzer {
    config: AnalyzerConfig,
    stemmer: Stemmer,
}

impl SnowballAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        let stemmer = Stemmer::create(config.language.algorithm());
        Self { config, stemmer }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn fold(text: &str) -> String {
        text.nfkc().collect::<String>().to_lowercase()
    }
}

impl Default for SnowballAnalyzer {
    fn default() -> Self {
        Self::new(AnalyzerConfig::default())
    }
}

impl Analyzer for SnowballAnalyzer {
    fn analyze(&self, text: &str) -> Vec<String> {
        let folded = Self::fold(text);
        RE.find_iter(&folded)
            .map(|m| m.as_str())
            .filter(|t| t.chars().count() >= self.config.min_token_len)
            .map(|t| self.stemmer.stem(t).into_owned())
            .collect()
    }
}

/// Runs the operand through the indexing path and keeps the first stem.
/// Operands that index to nothing (punctuation, digits, short tokens) come
/// back empty.
impl Normalizer for SnowballAnalyzer {
    fn normalize(&self, raw: &str) -> String {
        self.analyze(raw).into_iter().next().unwrap_or_default()
    }
}
