//! Corpus-wide term frequencies and Zipf rank statistics.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Multiset of term occurrences. Every occurrence counts, not just document
/// membership.
#[derive(Debug, Default, Clone)]
pub struct FrequencyMap {
    counts: HashMap<String, u64>,
    total: u64,
}

/// One ranked row of Zipf output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyRecord {
    pub term: String,
    pub frequency: u64,
    /// 1-based, frequency descending.
    pub rank: u64,
    pub frequency_rank_product: u64,
}

impl FrequencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts each stem in the caller's slice, repeats included.
    pub fn add<S: AsRef<str>>(&mut self, stems: &[S]) {
        for stem in stems {
            let stem = stem.as_ref();
            if stem.is_empty() {
                continue;
            }
            match self.counts.get_mut(stem) {
                Some(c) => *c += 1,
                None => {
                    self.counts.insert(stem.to_string(), 1);
                }
            }
            self.total += 1;
        }
    }

    /// Adds another map's counts into this one.
    pub fn merge(&mut self, other: FrequencyMap) {
        for (term, n) in other.counts {
            *self.counts.entry(term).or_insert(0) += n;
        }
        self.total += other.total;
    }

    pub fn frequency(&self, term: &str) -> u64 {
        self.counts.get(term).copied().unwrap_or(0)
    }

    /// Total occurrences across the corpus.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn distinct_terms(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// (term, frequency) pairs in rank order.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        let mut pairs: Vec<(String, u64)> = self.counts.iter().map(|(t, n)| (t.clone(), *n)).collect();
        pairs.sort_unstable_by(|a, b| rank_order(&a.0, a.1, &b.0, b.1));
        pairs
    }

    pub fn ranked(&self) -> Vec<FrequencyRecord> {
        rank(self.snapshot())
    }
}

/// Frequency descending, then term ascending.
fn rank_order(ta: &str, fa: u64, tb: &str, fb: u64) -> Ordering {
    fb.cmp(&fa).then_with(|| ta.cmp(tb))
}

/// Sorts pairs into rank order and assigns ranks 1..=N. Ties on frequency
/// are broken lexicographically on the term, so ranks are stable across runs.
pub fn rank(mut records: Vec<(String, u64)>) -> Vec<FrequencyRecord> {
    records.sort_unstable_by(|a, b| rank_order(&a.0, a.1, &b.0, b.1));
    records
        .into_iter()
        .enumerate()
        .map(|(i, (term, frequency))| {
            let rank = i as u64 + 1;
            FrequencyRecord { term, frequency, rank, frequency_rank_product: frequency * rank }
        })
        .collect()
}

/// Least-squares fit of `ln(freq) = c - alpha * ln(rank)` over the top ranks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZipfFit {
    pub alpha: f64,
    /// Frequency of rank 1, the scale of the fitted curve.
    pub scale: f64,
    pub points: usize,
}

impl ZipfFit {
    pub fn estimate(records: &[FrequencyRecord], top_k: usize) -> Self {
        let n = records.len().min(top_k);
        let scale = records.first().map(|r| r.frequency as f64).unwrap_or(0.0);
        if n < 2 {
            return Self { alpha: 0.0, scale, points: n };
        }
        let (mut sx, mut sy, mut sxx, mut sxy) = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
        for r in &records[..n] {
            let x = (r.rank as f64).ln();
            let y = (r.frequency as f64).ln();
            sx += x;
            sy += y;
            sxx += x * x;
            sxy += x * y;
        }
        let nf = n as f64;
        let denom = nf * sxx - sx * sx;
        let alpha = if denom == 0.0 { 0.0 } else { -(nf * sxy - sx * sy) / denom };
        Self { alpha, scale, points: n }
    }

    /// Frequency the fitted law predicts at `rank`.
    pub fn expected(&self, rank: u64) -> f64 {
        self.scale * (rank.max(1) as f64).powf(-self.alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_occurrence() {
        let mut m = FrequencyMap::new();
        m.add(&["a", "b", "a", "c", "a"]);
        assert_eq!(m.frequency("a"), 3);
        assert_eq!(m.total(), 5);
        assert_eq!(m.distinct_terms(), 3);
    }

    #[test]
    fn ties_break_on_term() {
        let records = rank(vec![("z".into(), 2), ("y".into(), 2), ("x".into(), 5)]);
        let order: Vec<&str> = records.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(order, vec!["x", "y", "z"]);
        assert_eq!(records[2].frequency_rank_product, 6);
    }

    #[test]
    fn perfect_zipf_has_unit_alpha() {
        let records = rank((1..=50u64).map(|r| (format!("t{r:02}"), 1000 / r)).collect());
        let fit = ZipfFit::estimate(&records, 50);
        assert!((fit.alpha - 1.0).abs() < 0.05, "alpha = {}", fit.alpha);
        assert!((fit.expected(1) - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn fit_needs_two_points() {
        let records = rank(vec![("a".into(), 3)]);
        assert_eq!(ZipfFit::estimate(&records, 10).alpha, 0.0);
        assert_eq!(ZipfFit::estimate(&[], 10).scale, 0.0);
    }
}
