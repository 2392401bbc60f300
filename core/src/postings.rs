//! Sorted, deduplicated document-id sets and the merge-based set algebra the
//! evaluator runs on.

use crate::DocId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ascending, duplicate-free list of document ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostingList(Vec<DocId>);

impl PostingList {
    pub const EMPTY: PostingList = PostingList(Vec::new());

    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Sorts and deduplicates arbitrary input.
    pub fn from_unsorted(mut ids: Vec<DocId>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self(ids)
    }

    /// Wraps ids that are already strictly ascending; `None` otherwise.
    pub fn from_sorted(ids: Vec<DocId>) -> Option<Self> {
        if ids.windows(2).all(|w| w[0] < w[1]) {
            Some(Self(ids))
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: DocId) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    pub fn as_slice(&self) -> &[DocId] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DocId> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<DocId> {
        self.0
    }

    /// Inserts keeping order. Appending a new maximum is O(1).
    pub fn insert(&mut self, id: DocId) {
        match self.0.last() {
            Some(&last) if last < id => self.0.push(id),
            None => self.0.push(id),
            _ => {
                if let Err(pos) = self.0.binary_search(&id) {
                    self.0.insert(pos, id);
                }
            }
        }
    }

    pub fn intersect(&self, other: &PostingList) -> PostingList {
        let (a, b) = (&self.0, &other.0);
        let mut out = Vec::with_capacity(a.len().min(b.len()));
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        PostingList(out)
    }

    pub fn union(&self, other: &PostingList) -> PostingList {
        let (a, b) = (&self.0, &other.0);
        let mut out = Vec::with_capacity(a.len() + b.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    out.push(b[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    out.push(a[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        out.extend_from_slice(&a[i..]);
        out.extend_from_slice(&b[j..]);
        PostingList(out)
    }

    /// `self \ other`.
    pub fn difference(&self, other: &PostingList) -> PostingList {
        let (a, b) = (&self.0, &other.0);
        let mut out = Vec::with_capacity(a.len());
        let (mut i, mut j) = (0, 0);
        while i < a.len() {
            if j >= b.len() {
                out.extend_from_slice(&a[i..]);
                break;
            }
            match a[i].cmp(&b[j]) {
                Ordering::Less => {
                    out.push(a[i]);
                    i += 1;
                }
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        PostingList(out)
    }
}

impl<'a> IntoIterator for &'a PostingList {
    type Item = &'a DocId;
    type IntoIter = std::slice::Iter<'a, DocId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<DocId> for PostingList {
    fn from_iter<I: IntoIterator<Item = DocId>>(iter: I) -> Self {
        Self::from_unsorted(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pl(ids: &[DocId]) -> PostingList {
        PostingList::from_unsorted(ids.to_vec())
    }

    #[test]
    fn from_unsorted_dedups() {
        assert_eq!(pl(&[5, 1, 3, 1, 5]).as_slice(), &[1, 3, 5]);
        assert!(PostingList::from_sorted(vec![1, 1, 2]).is_none());
        assert!(PostingList::from_sorted(vec![3, 2]).is_none());
        assert!(PostingList::from_sorted(vec![1, 2, 9]).is_some());
    }

    #[test]
    fn insert_keeps_order() {
        let mut p = PostingList::new();
        for id in [4, 2, 9, 2, 7] {
            p.insert(id);
        }
        assert_eq!(p.as_slice(), &[2, 4, 7, 9]);
    }

    #[test]
    fn set_algebra() {
        let a = pl(&[1, 2, 4, 8]);
        let b = pl(&[2, 3, 4, 5]);
        assert_eq!(a.intersect(&b).as_slice(), &[2, 4]);
        assert_eq!(a.union(&b).as_slice(), &[1, 2, 3, 4, 5, 8]);
        assert_eq!(a.difference(&b).as_slice(), &[1, 8]);
        assert_eq!(b.difference(&a).as_slice(), &[3, 5]);
        assert!(a.intersect(&PostingList::new()).is_empty());
        assert_eq!(a.difference(&PostingList::new()), a);
    }
}
