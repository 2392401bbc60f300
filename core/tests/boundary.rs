use boolsearch_core::{CoreService, SearchError, SnowballAnalyzer};
use tempfile::tempdir;

#[test]
fn end_to_end_through_handles() {
    let mut svc = CoreService::new();
    let h = svc.create_index();
    svc.add_document(&h, 1, &["наук", "исследован"]).unwrap();
    svc.add_document(&h, 2, &["компьютер", "наук"]).unwrap();
    svc.add_document(&h, 3, &["исследован", "данн"]).unwrap();

    assert_eq!(&*svc.search_index(&h, "наук AND исследован").unwrap(), &[1]);
    assert_eq!(&*svc.search_index(&h, "компьютер OR данн").unwrap(), &[2, 3]);
    assert_eq!(&*svc.search_index(&h, "наук NOT компьютер").unwrap(), &[1]);

    svc.destroy_index(h).unwrap();
    assert_eq!(svc.live_indexes(), 0);
}

#[test]
fn caller_buffer_is_reusable_after_call() {
    let mut svc = CoreService::new();
    let mut idx = svc.scoped_index();
    let mut buf: Vec<String> = vec!["alpha".into(), "beta".into()];
    idx.add_document(1, &buf).unwrap();
    buf.clear();
    buf.push("gamma".into());
    idx.add_document(2, &buf).unwrap();
    drop(buf);
    assert_eq!(idx.search("alpha OR gamma").unwrap().into_vec(), vec![1, 2]);
}

#[test]
fn sealed_index_rejects_new_documents() {
    let mut svc = CoreService::new();
    let h = svc.create_index();
    svc.add_document(&h, 1, &["a"]).unwrap();
    svc.search_index(&h, "a").unwrap();
    let err = svc.add_document(&h, 2, &["b"]).unwrap_err();
    assert!(matches!(err, SearchError::ResourceLifecycle(_)));
    svc.destroy_index(h).unwrap();
}

#[test]
fn foreign_handles_are_rejected() {
    let mut a = CoreService::new();
    let mut b = CoreService::new();
    let h = a.create_index();
    assert!(matches!(b.search_index(&h, "x"), Err(SearchError::ResourceLifecycle(_))));
    assert!(matches!(b.destroy_index(h), Err(SearchError::ResourceLifecycle(_))));
    assert_eq!(a.live_indexes(), 1);

    let f = a.create_freq_map();
    assert!(matches!(b.add_stems(&f, &["x"]), Err(SearchError::ResourceLifecycle(_))));
    a.destroy_freq_map(f).unwrap();
}

#[test]
fn handle_outliving_service_is_rejected() {
    let h = {
        let mut gone = CoreService::new();
        gone.create_index()
    };
    let mut svc = CoreService::new();
    assert!(matches!(svc.seal_index(&h), Err(SearchError::ResourceLifecycle(_))));
}

#[test]
fn scoped_guards_release_on_every_path() {
    let mut svc = CoreService::new();
    {
        let mut idx = svc.scoped_index();
        idx.add_document(1, &["a"]).unwrap();
        assert!(idx.search("a AND").is_err());
    }
    {
        let mut freq = svc.scoped_freq_map();
        freq.add_stems(&["a", "a", "b"]).unwrap();
        let arr = freq.as_array().unwrap();
        assert_eq!(arr[0].stem, "a");
        assert_eq!(arr[0].frequency, 2);
    }
    assert_eq!(svc.live_indexes(), 0);
    assert_eq!(svc.live_freq_maps(), 0);
}

#[test]
fn failed_load_leaves_no_handle() {
    let dir = tempdir().unwrap();
    let mut svc = CoreService::new();
    let err = svc.scoped_loaded_index(dir.path().join("missing.bin")).err().unwrap();
    assert!(matches!(err, SearchError::IndexLoad { .. }));
    assert_eq!(svc.live_indexes(), 0);
}

#[test]
fn save_then_load_through_service() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("index.bin");
    let mut svc = CoreService::new();
    {
        let mut idx = svc.scoped_index();
        idx.add_document(5, &["x", "y"]).unwrap();
        idx.add_document(6, &["y"]).unwrap();
        idx.save(&path).unwrap();
    }
    let mut loaded = svc.scoped_loaded_index(&path).unwrap();
    assert_eq!(loaded.search("y NOT x").unwrap().into_vec(), vec![6]);
    assert!(matches!(loaded.add_document(7, &["z"]), Err(SearchError::ResourceLifecycle(_))));
}

#[test]
fn invalid_utf8_query_is_an_encoding_error() {
    let mut svc = CoreService::new();
    let mut idx = svc.scoped_index();
    idx.add_document(1, &["a"]).unwrap();
    assert!(matches!(idx.search_bytes(b"a OR \xc3\x28"), Err(SearchError::InputEncoding(_))));
    assert_eq!(idx.search_bytes(b"a").unwrap().len(), 1);
}

#[test]
fn normalizer_stems_query_operands() {
    let analyzer = SnowballAnalyzer::default();
    let mut svc = CoreService::with_normalizer(Box::new(SnowballAnalyzer::default()));
    let mut idx = svc.scoped_index();
    use boolsearch_core::Analyzer;
    idx.add_document(1, &analyzer.analyze("Научные исследования")).unwrap();
    idx.add_document(2, &analyzer.analyze("Компьютерные науки")).unwrap();
    assert_eq!(idx.search("исследования").unwrap().into_vec(), vec![1]);
    assert_eq!(idx.search("NOT исследования").unwrap().into_vec(), vec![2]);
}

#[test]
fn operands_follow_index_tokenization() {
    use boolsearch_core::Analyzer;
    let analyzer = SnowballAnalyzer::default();
    let mut svc = CoreService::with_normalizer(Box::new(SnowballAnalyzer::default()));
    let mut idx = svc.scoped_index();
    idx.add_document(1, &analyzer.analyze("Научные исследования")).unwrap();
    idx.add_document(2, &analyzer.analyze("Компьютерные науки")).unwrap();

    assert_eq!(idx.search("исследования,").unwrap().into_vec(), vec![1]);
    assert_eq!(idx.search("(научные) OR науки!").unwrap().into_vec(), vec![1, 2]);
    assert!(matches!(idx.search("!!!"), Err(SearchError::InputEncoding(_))));
    assert!(matches!(idx.search("науки AND 123"), Err(SearchError::InputEncoding(_))));
}

#[test]
fn ranked_records_through_handles() {
    let mut svc = CoreService::new();
    let f = svc.create_freq_map();
    svc.add_stems(&f, &["a", "b", "c", "a", "a", "b"]).unwrap();
    svc.add_stems(&f, &["d", "e", "c", "a"]).unwrap();
    svc.add_stems(&f, &["b", "c", "f"]).unwrap();
    let records = svc.ranked_records(&f).unwrap();
    assert_eq!(records.len(), 6);
    assert_eq!((records[0].term.as_str(), records[0].frequency), ("a", 4));
    assert_eq!((records[1].term.as_str(), records[2].term.as_str()), ("b", "c"));
    svc.destroy_freq_map(f).unwrap();
    assert_eq!(svc.live_freq_maps(), 0);
}
