//! Integration tests for graph construction, adjacency, clusters and PageRank.

use omni_vault::graph::{PAGERANK_ITERATIONS, build_graph_nodes, is_phantom_id};
use omni_vault::{
    Document, VaultFile, build_adjacency_map, build_graph, compute_pagerank, find_clusters,
    parse_batch,
};
use std::collections::HashSet;

fn docs(files: &[(&str, &str)]) -> Vec<Document> {
    let files: Vec<VaultFile> = files
        .iter()
        .map(|(path, content)| VaultFile::new(*path, *content))
        .collect();
    parse_batch(&files)
}

fn edge_pairs(docs: &[Document]) -> Vec<(String, String)> {
    build_graph(docs)
        .edges
        .into_iter()
        .map(|edge| (edge.source, edge.target))
        .collect()
}

#[test]
fn test_section_link_resolves_to_owning_document() {
    let docs = docs(&[
        ("doc_a.md", "## Intro\nsee [[doc_b_s1]]"),
        ("doc_b.md", "## s1\ntarget section"),
    ]);
    let graph = build_graph(&docs);

    assert_eq!(edge_pairs(&docs), vec![("doc_a".to_string(), "doc_b".to_string())]);
    assert!(graph.phantom_nodes.is_empty());
}

#[test]
fn test_unresolved_link_creates_phantom_node() {
    let docs = docs(&[("solo.md", "## Notes\nrefers to [[nonexistent_doc]]")]);
    let graph = build_graph(&docs);

    assert_eq!(graph.phantom_nodes.len(), 1);
    assert_eq!(graph.phantom_nodes[0].id, "_phantom_nonexistent_doc");
    assert_eq!(
        edge_pairs(&docs),
        vec![("solo".to_string(), "_phantom_nonexistent_doc".to_string())]
    );
    assert!(is_phantom_id(&graph.phantom_nodes[0].id));
}

#[test]
fn test_wikilink_in_inline_code_is_not_an_edge() {
    let docs = docs(&[(
        "syntax.md",
        "## Usage\nuse `[[not_a_link]]` syntax to link notes",
    )]);
    let graph = build_graph(&docs);

    assert!(docs[0].sections[0].wiki_links.is_empty());
    assert!(graph.phantom_nodes.is_empty());
    assert!(graph.edges.is_empty());
}

#[test]
fn test_empty_document_list_yields_empty_graph() {
    let graph = build_graph(&[]);
    assert!(graph.nodes.is_empty());
    assert!(graph.edges.is_empty());
    assert!(graph.phantom_nodes.is_empty());
    assert!(compute_pagerank(&graph.nodes, &graph.edges).is_empty());
    assert!(find_clusters(&graph.nodes, &graph.edges).is_empty());
}

#[test]
fn test_node_count_ignores_section_count() {
    let docs = docs(&[
        ("many.md", "## A\na\n## B\nb\n## C\nc"),
        ("one.md", "body"),
    ]);
    assert_eq!(build_graph_nodes(&docs).len(), docs.len());
}

#[test]
fn test_edges_are_deduplicated_across_sections_and_directions() {
    let docs = docs(&[
        ("a.md", "## One\n[[b]]\n## Two\n[[b]] and [[b.md]]"),
        ("b.md", "## Back\n[[a]]"),
    ]);
    assert_eq!(edge_pairs(&docs), vec![("a".to_string(), "b".to_string())]);
}

#[test]
fn test_every_edge_endpoint_exists() {
    let docs = docs(&[
        ("hub.md", "## Links\n[[Combat Design]] [[missing one]] [[lore|Lore]]"),
        ("Combat Design.md", "## Rules\n[[hub]] [[missing one]]"),
        ("lore.md", "## World\n[[Nowhere#Part]]"),
    ]);
    let graph = build_graph(&docs);
    let known: HashSet<&str> = graph
        .nodes
        .iter()
        .map(|node| node.id.as_str())
        .chain(graph.phantom_nodes.iter().map(|node| node.id.as_str()))
        .collect();
    for edge in &graph.edges {
        assert!(known.contains(edge.source.as_str()), "dangling {}", edge.source);
        assert!(known.contains(edge.target.as_str()), "dangling {}", edge.target);
    }
    assert_eq!(graph.phantom_nodes.len(), 2);
    assert!(graph.contains_node("combat_design"));
}

#[test]
fn test_self_links_produce_no_edge() {
    let docs = docs(&[("self.md", "## A\n[[self]] [[self_a]]")]);
    assert!(build_graph(&docs).edges.is_empty());
}

#[test]
fn test_section_id_wins_over_filename() {
    // `plan_intro` is both a section of `plan.md` and the stem of `plan_intro.md`.
    let docs = docs(&[
        ("plan.md", "overview text"),
        ("plan_intro.md", "## Other\nx"),
        ("reader.md", "## Ref\n[[plan_intro]]"),
    ]);
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["plan", "plan_intro", "reader"]);
    assert!(edge_pairs(&docs).contains(&("reader".to_string(), "plan".to_string())));
}

#[test]
fn test_normalized_label_resolves_spaced_links() {
    let docs = docs(&[
        ("Design/Art Bible.md", "## Palette\nwarm"),
        ("index.md", "## See\n[[Design/Art Bible]] [[ART BIBLE]]"),
    ]);
    let graph = build_graph(&docs);
    let pairs = edge_pairs(&docs);
    assert!(pairs.contains(&("index".to_string(), "design_art_bible".to_string())));
    assert_eq!(graph.phantom_nodes.len(), 1);
    assert_eq!(graph.phantom_nodes[0].slug, "ART BIBLE");
}

#[test]
fn test_adjacency_is_symmetric_and_skips_phantoms() {
    let docs = docs(&[
        ("a.md", "## x\n[[b]] [[ghost]]"),
        ("b.md", "## y\n[[c]]"),
        ("c.md", "## z\nleaf"),
    ]);
    let graph = build_graph(&docs);
    let adjacency = build_adjacency_map(&graph.edges);

    assert!(adjacency.is_adjacent("a", "b"));
    assert!(adjacency.is_adjacent("b", "a"));
    assert!(adjacency.is_adjacent("c", "b"));
    assert!(!adjacency.is_adjacent("a", "c"));
    assert_eq!(adjacency.neighbors("b").collect::<Vec<_>>(), vec!["a", "c"]);
    assert_eq!(adjacency.degree("a"), 1);
    assert_eq!(adjacency.neighbors("_phantom_ghost").count(), 0);
}

#[test]
fn test_clusters_group_connected_documents_largest_first() {
    let docs = docs(&[
        ("a.md", "## x\n[[b]]"),
        ("b.md", "## y\n[[c]]"),
        ("c.md", "## z\nleaf"),
        ("d.md", "## w\n[[e]] [[ghost]]"),
        ("e.md", "## v\nleaf"),
        ("f.md", "## u\n[[ghost]]"),
    ]);
    let graph = build_graph(&docs);
    let clusters = find_clusters(&graph.nodes, &graph.edges);

    let members: Vec<Vec<&str>> = clusters
        .iter()
        .map(|cluster| cluster.members.iter().map(String::as_str).collect())
        .collect();
    // Sharing a phantom target does not connect d and f.
    assert_eq!(members, vec![vec!["a", "b", "c"], vec!["d", "e"], vec!["f"]]);
    let ids: Vec<usize> = clusters.iter().map(|cluster| cluster.cluster_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
}

#[test]
fn test_pagerank_scores_sum_to_one_and_favor_linked_targets() {
    let docs = docs(&[
        ("hub.md", "## h\nhub"),
        ("a.md", "## a\n[[hub]]"),
        ("b.md", "## b\n[[hub]]"),
        ("c.md", "## c\n[[hub]] [[a]]"),
        ("island.md", "## i\nalone"),
    ]);
    let graph = build_graph(&docs);
    let hubs = compute_pagerank(&graph.nodes, &graph.edges);

    assert_eq!(PAGERANK_ITERATIONS, 25);
    assert_eq!(hubs.len(), docs.len());
    let total: f64 = hubs.iter().map(|hub| hub.score).sum();
    assert!((total - 1.0).abs() < 1e-9, "sum was {total}");
    assert_eq!(hubs[0].doc_id, "hub");
    for pair in hubs.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}
