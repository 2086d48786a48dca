//! Integration tests for the TF-IDF index, its snapshot cache and implicit links.

use omni_vault::semantic::{corpus_fingerprint, load_or_build_index, tokenize};
use omni_vault::{
    CacheLookupOutcome, Document, IndexCacheStatus, IndexCacheStore, SemanticIndex, VaultFile,
    build_adjacency_map, build_graph, parse_batch,
};
use tempfile::TempDir;

fn corpus() -> Vec<Document> {
    let files = vec![
        VaultFile::new(
            "combat.md",
            "---\nspeaker: plan_director\ntags: [combat]\n---\n## Boss\nThe boss fight has three phases.\n## Parry\nParry timing windows for the boss.",
        )
        .with_mtime(1),
        VaultFile::new(
            "arena.md",
            "## Layout\nArena layout supports the boss fight. See [[combat]].",
        )
        .with_mtime(2),
        VaultFile::new(
            "palette.md",
            "## Colors\nWarm palette for menus and the title screen.",
        )
        .with_mtime(3),
        VaultFile::new(
            "menus.md",
            "## Screens\nTitle screen menus use the warm palette colors.",
        )
        .with_mtime(4),
    ];
    parse_batch(&files)
}

fn ids(hits: &[omni_vault::SemanticHit]) -> Vec<&str> {
    hits.iter().map(|hit| hit.doc_id.as_str()).collect()
}

#[test]
fn test_query_ranks_by_similarity() {
    let docs = corpus();
    let index = SemanticIndex::build(&docs);

    assert_eq!(index.document_count(), 4);
    let hits = index.query("boss parry timing", 10, 0.0);
    assert_eq!(hits.first().map(|hit| hit.doc_id.as_str()), Some("combat"));
    assert!(ids(&hits).contains(&"arena"));
    assert!(!ids(&hits).contains(&"palette"));
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert!(hits.iter().all(|hit| hit.score > 0.0 && hit.score <= 1.0 + 1e-9));
}

#[test]
fn test_query_respects_limit_and_min_score() {
    let docs = corpus();
    let index = SemanticIndex::build(&docs);

    assert_eq!(index.query("boss", 1, 0.0).len(), 1);
    assert!(index.query("boss", 0, 0.0).is_empty());
    assert!(index.query("boss", 10, 0.999).is_empty());
    assert!(index.query("zzz unknown words", 10, 0.0).is_empty());
    assert!(index.query("", 10, 0.0).is_empty());
}

#[test]
fn test_korean_inflections_share_a_term() {
    let files = vec![
        VaultFile::new("plan.md", "## 개요\n레벨 디자인은 기획자들이 담당합니다."),
        VaultFile::new("art.md", "## 색감\n배경 색감을 정리했습니다."),
    ];
    let docs = parse_batch(&files);
    let index = SemanticIndex::build(&docs);

    assert_eq!(tokenize("기획자들이"), vec!["기획자".to_string()]);
    let hits = index.query("기획자를 위한 레벨", 5, 0.0);
    assert_eq!(ids(&hits), vec!["plan"]);
}

#[test]
fn test_snapshot_round_trip_preserves_queries() -> Result<(), Box<dyn std::error::Error>> {
    let docs = corpus();
    let index = SemanticIndex::build(&docs);
    let blob = index.serialize()?;

    let CacheLookupOutcome::Hit(restored) = SemanticIndex::restore(&blob, index.fingerprint())
    else {
        return Err("expected cache hit".into());
    };
    assert_eq!(restored.fingerprint(), index.fingerprint());
    assert_eq!(restored.term_count(), index.term_count());
    for query in ["boss fight", "warm palette", "title screen menus"] {
        let original = index.query(query, 4, 0.0);
        let decoded = restored.query(query, 4, 0.0);
        assert_eq!(ids(&original), ids(&decoded), "query {query}");
        for (left, right) in original.iter().zip(&decoded) {
            assert!((left.score - right.score).abs() < 1e-9);
        }
    }
    Ok(())
}

#[test]
fn test_restore_rejects_stale_or_corrupt_blobs() -> Result<(), Box<dyn std::error::Error>> {
    let docs = corpus();
    let index = SemanticIndex::build(&docs);
    let blob = index.serialize()?;

    assert!(matches!(
        SemanticIndex::restore(&blob, "0000000000000000"),
        CacheLookupOutcome::Miss("content_fingerprint_mismatch")
    ));
    assert!(matches!(
        SemanticIndex::restore(b"{not json", index.fingerprint()),
        CacheLookupOutcome::Miss("payload_parse_error")
    ));
    let mut value: serde_json::Value = serde_json::from_slice(&blob)?;
    value["schema_version"] = serde_json::Value::from("omni_vault.semantic_index.v0");
    assert!(matches!(
        SemanticIndex::restore(&serde_json::to_vec(&value)?, index.fingerprint()),
        CacheLookupOutcome::Miss("schema_version_mismatch")
    ));
    Ok(())
}

#[test]
fn test_fingerprint_tracks_content_and_mtime_not_order() {
    let docs = corpus();
    let base = corpus_fingerprint(&docs);

    let mut reversed = docs.clone();
    reversed.reverse();
    assert_eq!(corpus_fingerprint(&reversed), base);

    let mut touched = docs.clone();
    touched[0].modified_ts = Some(99);
    assert_ne!(corpus_fingerprint(&touched), base);

    let mut edited = docs;
    edited[1].raw_content.push_str("\nextra");
    assert_ne!(corpus_fingerprint(&edited), base);
}

#[test]
fn test_load_or_build_index_uses_file_cache() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let store = IndexCacheStore::new(tmp.path().join("cache"));
    let root = tmp.path().join("vault");
    let docs = corpus();

    let (first, first_meta) = load_or_build_index(&docs, Some(&store), &root);
    assert_eq!(first_meta.status, IndexCacheStatus::Miss);
    assert_eq!(first_meta.miss_reason.as_deref(), Some("key_not_found"));
    assert_eq!(first_meta.backend, "file");
    assert!(store.slot_path(&root).is_file());

    let (second, second_meta) = load_or_build_index(&docs, Some(&store), &root);
    assert_eq!(second_meta.status, IndexCacheStatus::Hit);
    assert_eq!(second.fingerprint(), first.fingerprint());

    let mut changed = docs;
    changed[2].modified_ts = Some(1234);
    let (_, changed_meta) = load_or_build_index(&changed, Some(&store), &root);
    assert_eq!(changed_meta.status, IndexCacheStatus::Miss);
    assert_eq!(
        changed_meta.miss_reason.as_deref(),
        Some("content_fingerprint_mismatch")
    );

    std::fs::write(store.slot_path(&root), b"garbage")?;
    let (_, corrupt_meta) = load_or_build_index(&changed, Some(&store), &root);
    assert_eq!(corrupt_meta.miss_reason.as_deref(), Some("payload_parse_error"));

    assert!(store.clear(&root)?);
    assert!(!store.clear(&root)?);
    Ok(())
}

#[test]
fn test_load_or_build_index_without_store() {
    let docs = corpus();
    let (index, meta) = load_or_build_index(&docs, None, std::path::Path::new("vault"));
    assert_eq!(meta.status, IndexCacheStatus::Disabled);
    assert_eq!(meta.backend, "none");
    assert_eq!(index.document_count(), docs.len());
}

#[test]
fn test_implicit_links_skip_adjacent_documents() {
    let docs = corpus();
    let graph = build_graph(&docs);
    let adjacency = build_adjacency_map(&graph.edges);
    let index = SemanticIndex::build(&docs);
    let links = index.find_implicit_links(&adjacency, 3, 0.05);

    // combat and arena are linked, so neither lists the other.
    assert!(links.for_doc("combat").iter().all(|hit| hit.doc_id != "arena"));
    assert!(links.for_doc("arena").iter().all(|hit| hit.doc_id != "combat"));
    assert!(ids(links.for_doc("palette")).contains(&"menus"));
    assert!(links.for_doc("unknown").is_empty());
    for (doc_id, hits) in ["combat", "arena", "palette", "menus"]
        .iter()
        .map(|id| (*id, links.for_doc(id)))
    {
        assert!(hits.iter().all(|hit| hit.doc_id != doc_id));
        assert!(hits.len() <= 3);
    }
}
