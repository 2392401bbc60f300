use boolsearch_core::frequency::rank;
use boolsearch_core::{FrequencyMap, ZipfFit};

fn corpus() -> Vec<Vec<&'static str>> {
    vec![vec!["a", "b", "c", "a", "a", "b"], vec!["d", "e", "c", "a"], vec!["b", "c", "f"]]
}

fn ranked_from(docs: &[Vec<&str>]) -> Vec<(String, u64, u64)> {
    let mut map = FrequencyMap::new();
    for doc in docs {
        map.add(doc);
    }
    map.ranked().into_iter().map(|r| (r.term, r.frequency, r.rank)).collect()
}

#[test]
fn reference_corpus() {
    let mut map = FrequencyMap::new();
    for doc in corpus() {
        map.add(&doc);
    }
    let records = map.ranked();

    let total: u64 = records.iter().map(|r| r.frequency).sum();
    assert_eq!(total, 13);
    assert_eq!(map.total(), 13);
    assert!(records.windows(2).all(|w| w[0].frequency >= w[1].frequency));

    assert_eq!(records[0].term, "a");
    assert_eq!(records[0].frequency, 4);
    assert_eq!(records[0].rank, 1);

    let order: Vec<&str> = records.iter().map(|r| r.term.as_str()).collect();
    assert_eq!(order, vec!["a", "b", "c", "d", "e", "f"]);
    assert_eq!(records[2].frequency_rank_product, 9);
    assert_eq!(records[5].rank, 6);
}

#[test]
fn recomputation_is_order_independent() {
    let docs = corpus();
    let mut reversed = docs.clone();
    reversed.reverse();
    let first = ranked_from(&docs);
    for _ in 0..5 {
        assert_eq!(ranked_from(&docs), first);
    }
    assert_eq!(ranked_from(&reversed), first);
}

#[test]
fn merged_shards_match_single_pass() {
    let docs = corpus();
    let mut whole = FrequencyMap::new();
    let mut left = FrequencyMap::new();
    let mut right = FrequencyMap::new();
    for (i, doc) in docs.iter().enumerate() {
        whole.add(doc);
        if i % 2 == 0 { left.add(doc) } else { right.add(doc) }
    }
    left.merge(right);
    assert_eq!(left.ranked(), whole.ranked());
}

#[test]
fn snapshot_and_rank_agree() {
    let mut map = FrequencyMap::new();
    map.add(&["x", "y", "x"]);
    let shuffled = vec![("y".to_string(), 1), ("x".to_string(), 2)];
    assert_eq!(rank(shuffled), map.ranked());
    assert_eq!(map.snapshot(), vec![("x".to_string(), 2), ("y".to_string(), 1)]);
}

#[test]
fn fit_on_reference_corpus_is_positive() {
    let mut map = FrequencyMap::new();
    for doc in corpus() {
        map.add(&doc);
    }
    let fit = ZipfFit::estimate(&map.ranked(), 10_000);
    assert_eq!(fit.points, 6);
    assert!(fit.alpha > 0.0);
    assert_eq!(fit.scale, 4.0);
}
