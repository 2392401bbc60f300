pub mod boundary;
pub mod error;
pub mod eval;
pub mod frequency;
pub mod index;
pub mod persist;
pub mod postings;
pub mod query;
pub mod tokenizer;

pub use boundary::{
    CoreService, FreqArray, FreqMapHandle, FreqPair, IdArray, IndexHandle, OwnedArray, RecordArray, ScopedFreqMap, ScopedIndex,
};
pub use error::{Result, SearchError};
pub use eval::Evaluator;
pub use frequency::{FrequencyMap, FrequencyRecord, ZipfFit};
pub use index::{IndexBuilder, InvertedIndex};
pub use query::{to_postfix, Token};
pub use tokenizer::{Analyzer, AnalyzerConfig, Identity, Language, Normalizer, SnowballAnalyzer};

/// Document id assigned by the external corpus store. Always positive.
pub type DocId = u32;

/// One document as delivered by the tokenizing collaborator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenizedDoc {
    pub doc_id: DocId,
    pub stems: Vec<String>,
}

impl TokenizedDoc {
    pub fn new<S: Into<String>>(doc_id: DocId, stems: impl IntoIterator<Item = S>) -> Self {
        Self { doc_id, stems: stems.into_iter().map(Into::into).collect() }
    }
}

/// Compile and evaluate `query` against `index` in one step.
pub fn search(index: &InvertedIndex, query: &str, normalizer: &dyn Normalizer) -> Result<Vec<DocId>> {
    let postfix = to_postfix(query)?;
    Evaluator::new(index, normalizer).evaluate(&postfix)
}
