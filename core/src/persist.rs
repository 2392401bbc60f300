use crate::error::{Result, SearchError};
use crate::postings::PostingList;
use crate::{DocId, InvertedIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;

const MAGIC: [u8; 4] = *b"BSIX";
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub created_at: String,
    pub num_docs: u32,
    pub num_terms: u32,
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    header: IndexHeader,
    /// Sorted by term so identical indexes serialize identically.
    postings: Vec<(String, Vec<DocId>)>,
}

pub fn save_index<P: AsRef<Path>>(index: &InvertedIndex, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }

    let mut postings: Vec<(String, Vec<DocId>)> =
        index.postings().iter().map(|(t, p)| (t.clone(), p.as_slice().to_vec())).collect();
    postings.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let header = IndexHeader {
        magic: MAGIC,
        version: FORMAT_VERSION,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        num_docs: index.num_docs() as u32,
        num_terms: postings.len() as u32,
    };
    let file = IndexFile { header, postings };

    let mut w = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut w, &file)?;
    w.flush()?;
    tracing::info!(path = %path.display(), num_terms = file.header.num_terms, num_docs = file.header.num_docs, "index saved");
    Ok(())
}

pub fn load_index<P: AsRef<Path>>(path: P) -> Result<InvertedIndex> {
    let path = path.as_ref();
    let shown = path.display();
    let mut f = File::open(path).map_err(|e| SearchError::index_load(&shown, e))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf).map_err(|e| SearchError::index_load(&shown, e))?;

    let file: IndexFile = bincode::deserialize(&buf).map_err(|e| SearchError::index_load(&shown, e))?;
    let header = &file.header;
    if header.magic != MAGIC {
        return Err(SearchError::index_load(&shown, "not an index file"));
    }
    if header.version != FORMAT_VERSION {
        return Err(SearchError::index_load(&shown, format!("unsupported format version {}", header.version)));
    }
    if header.num_terms as usize != file.postings.len() {
        return Err(SearchError::index_load(&shown, "term count does not match header"));
    }

    let mut postings = HashMap::with_capacity(file.postings.len());
    for (term, ids) in file.postings {
        if term.is_empty() || ids.is_empty() {
            return Err(SearchError::index_load(&shown, "empty term or posting list"));
        }
        let list = PostingList::from_sorted(ids)
            .ok_or_else(|| SearchError::index_load(&shown, format!("posting list for {term:?} is not strictly ascending")))?;
        if postings.insert(term, list).is_some() {
            return Err(SearchError::index_load(&shown, "duplicate term"));
        }
    }

    let index = InvertedIndex::from_postings(postings);
    if index.num_docs() != file.header.num_docs as usize {
        return Err(SearchError::index_load(&shown, "document count does not match header"));
    }
    tracing::info!(path = %shown, num_terms = index.num_terms(), num_docs = index.num_docs(), created_at = %file.header.created_at, "index loaded");
    Ok(index)
}

/// Reads only the header, e.g. for `indexer` status output.
pub fn read_header<P: AsRef<Path>>(path: P) -> Result<IndexHeader> {
    let path = path.as_ref();
    let buf = fs::read(path).map_err(|e| SearchError::index_load(path.display(), e))?;
    // The header is the leading field of the file, trailing bytes are ignored.
    let header: IndexHeader = bincode::deserialize(&buf).map_err(|e| SearchError::index_load(path.display(), e))?;
    if header.magic != MAGIC {
        return Err(SearchError::index_load(path.display(), "not an index file"));
    }
    Ok(header)
}
