use crate::postings::PostingList;
use crate::{DocId, TokenizedDoc};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

static EMPTY_POSTINGS: PostingList = PostingList::EMPTY;

/// Term → posting list, plus the universe of every document id that
/// contributed at least one term. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvertedIndex {
    postings: HashMap<String, PostingList>,
    universe: PostingList,
}

impl InvertedIndex {
    /// Sequential build over any document order.
    pub fn build<'a, I>(documents: I) -> Self
    where
        I: IntoIterator<Item = &'a TokenizedDoc>,
    {
        let mut builder = IndexBuilder::new();
        for doc in documents {
            builder.add_document(doc.doc_id, &doc.stems);
        }
        builder.finish()
    }

    /// Assembles an index from already-validated posting lists; the universe is
    /// derived as their union.
    pub(crate) fn from_postings(postings: HashMap<String, PostingList>) -> Self {
        let mut all: Vec<DocId> = postings.values().flat_map(|p| p.iter().copied()).collect();
        all.sort_unstable();
        all.dedup();
        let universe = PostingList::from_unsorted(all);
        Self { postings, universe }
    }

    /// Posting list for `term`; unknown terms yield the empty list.
    pub fn lookup(&self, term: &str) -> &PostingList {
        self.postings.get(term).unwrap_or(&EMPTY_POSTINGS)
    }

    pub fn universe(&self) -> &PostingList {
        &self.universe
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.postings.contains_key(term)
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn num_docs(&self) -> usize {
        self.universe.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Terms in lexicographic order.
    pub fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<&str> = self.postings.keys().map(String::as_str).collect();
        terms.sort_unstable();
        terms
    }

    pub(crate) fn postings(&self) -> &HashMap<String, PostingList> {
        &self.postings
    }
}

/// Accumulates posting lists for one build pass.
#[derive(Debug, Default)]
pub struct IndexBuilder {
    postings: HashMap<String, PostingList>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one document. Repeated stems count once; empty stems are skipped.
    /// The caller's slice is only read during the call.
    pub fn add_document<S: AsRef<str>>(&mut self, doc_id: DocId, stems: &[S]) {
        let mut seen: HashSet<&str> = HashSet::with_capacity(stems.len());
        for stem in stems {
            let stem = stem.as_ref();
            if stem.is_empty() || !seen.insert(stem) {
                continue;
            }
            match self.postings.get_mut(stem) {
                Some(list) => list.insert(doc_id),
                None => {
                    let mut list = PostingList::new();
                    list.insert(doc_id);
                    self.postings.insert(stem.to_string(), list);
                }
            }
        }
    }

    /// Folds another shard into this one, term by term.
    pub fn merge(mut self, other: IndexBuilder) -> IndexBuilder {
        let (mut big, small) = if self.postings.len() >= other.postings.len() {
            (std::mem::take(&mut self.postings), other.postings)
        } else {
            (other.postings, std::mem::take(&mut self.postings))
        };
        for (term, list) in small {
            match big.get_mut(&term) {
                Some(existing) => *existing = existing.union(&list),
                None => {
                    big.insert(term, list);
                }
            }
        }
        IndexBuilder { postings: big }
    }

    /// Builds across rayon workers: each worker fills its own shard, shards
    /// are merged per term. Produces the same index as [`InvertedIndex::build`].
    pub fn build_parallel(documents: &[TokenizedDoc]) -> InvertedIndex {
        let chunk = (documents.len() / rayon::current_num_threads().max(1)).max(64);
        let builder = documents
            .par_chunks(chunk)
            .map(|docs| {
                let mut shard = IndexBuilder::new();
                for doc in docs {
                    shard.add_document(doc.doc_id, &doc.stems);
                }
                shard
            })
            .reduce(IndexBuilder::new, IndexBuilder::merge);
        builder.finish()
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn finish(self) -> InvertedIndex {
        let index = InvertedIndex::from_postings(self.postings);
        tracing::info!(num_docs = index.num_docs(), num_terms = index.num_terms(), "inverted index built");
        index
    }
}
