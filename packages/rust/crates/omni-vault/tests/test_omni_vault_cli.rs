//! Integration tests for the `omni-vault` CLI binary.

use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn write_file(path: &Path, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn seed_vault(root: &Path) -> Result<(), Box<dyn std::error::Error>> {
    write_file(
        &root.join("design/combat.md"),
        "---\nspeaker: plan_director\ntags: [combat]\n---\n## Boss\nThe boss fight links to [[arena]] and [[missing]].\n",
    )?;
    write_file(
        &root.join("arena.md"),
        "## Layout\nArena layout for the boss fight.\n",
    )?;
    write_file(&root.join("palette.md"), "## Colors\nWarm palette.\n")?;
    write_file(&root.join(".obsidian/cache.md"), "## Hidden\nignored\n")?;
    Ok(())
}

fn omni_vault(root: &Path, cache_dir: &Path, args: &[&str]) -> std::io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_omni-vault"))
        .env("OMNI_VAULT_CACHE_DIR", cache_dir)
        .env_remove("OMNI_VAULT_CACHE_DISABLED")
        .arg("--root")
        .arg(root)
        .args(args)
        .output()
}

fn json_output(output: &Output) -> Result<Value, Box<dyn std::error::Error>> {
    assert!(
        output.status.success(),
        "omni-vault failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    Ok(serde_json::from_slice(&output.stdout)?)
}

#[test]
fn test_omni_vault_graph_lists_nodes_and_phantoms() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("vault");
    seed_vault(&root)?;

    let payload = json_output(&omni_vault(&root, &tmp.path().join("cache"), &["graph"])?)?;
    let nodes = payload
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or("missing nodes")?;
    assert_eq!(nodes.len(), 3);
    let phantoms = payload
        .get("phantom_nodes")
        .and_then(Value::as_array)
        .ok_or("missing phantom_nodes")?;
    assert_eq!(phantoms.len(), 1);
    assert_eq!(
        phantoms[0].get("id").and_then(Value::as_str),
        Some("_phantom_missing")
    );
    let edges = payload
        .get("edges")
        .and_then(Value::as_array)
        .ok_or("missing edges")?;
    assert_eq!(edges.len(), 2);
    Ok(())
}

#[test]
fn test_omni_vault_stats_reports_cache_status() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("vault");
    let cache = tmp.path().join("cache");
    seed_vault(&root)?;

    let first = json_output(&omni_vault(&root, &cache, &["stats"])?)?;
    assert_eq!(first.get("document_count").and_then(Value::as_u64), Some(3));
    assert_eq!(first.get("index_status").and_then(Value::as_str), Some("miss"));
    assert_eq!(first.get("index_ready").and_then(Value::as_bool), Some(true));

    let second = json_output(&omni_vault(&root, &cache, &["stats"])?)?;
    assert_eq!(second.get("index_status").and_then(Value::as_str), Some("hit"));

    let disabled = json_output(&omni_vault(&root, &cache, &["--no-cache", "stats"])?)?;
    assert_eq!(
        disabled.get("index_status").and_then(Value::as_str),
        Some("disabled")
    );

    let cleared = json_output(&omni_vault(&root, &cache, &["clear-cache"])?)?;
    assert_eq!(cleared.get("cleared").and_then(Value::as_bool), Some(true));
    let again = json_output(&omni_vault(&root, &cache, &["clear-cache"])?)?;
    assert_eq!(again.get("cleared").and_then(Value::as_bool), Some(false));
    Ok(())
}

#[test]
fn test_omni_vault_relative_root_shares_cache_slot() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("vault");
    let cache = tmp.path().join("cache");
    seed_vault(&root)?;

    let absolute = json_output(&omni_vault(&root, &cache, &["stats"])?)?;
    assert_eq!(absolute.get("index_status").and_then(Value::as_str), Some("miss"));

    let relative = Command::new(env!("CARGO_BIN_EXE_omni-vault"))
        .current_dir(&root)
        .env("OMNI_VAULT_CACHE_DIR", &cache)
        .env_remove("OMNI_VAULT_CACHE_DISABLED")
        .args(["--root", ".", "stats"])
        .output()?;
    let relative = json_output(&relative)?;
    assert_eq!(relative.get("index_status").and_then(Value::as_str), Some("hit"));
    Ok(())
}

#[test]
fn test_omni_vault_search_returns_ranked_hits() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("vault");
    seed_vault(&root)?;

    let payload = json_output(&omni_vault(
        &root,
        &tmp.path().join("cache"),
        &["search", "boss fight", "--limit", "5"],
    )?)?;
    assert_eq!(payload.get("query").and_then(Value::as_str), Some("boss fight"));
    let hits = payload
        .get("hits")
        .and_then(Value::as_array)
        .ok_or("missing hits")?;
    let ids: Vec<&str> = hits
        .iter()
        .filter_map(|hit| hit.get("doc_id").and_then(Value::as_str))
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"design_combat"));
    assert!(ids.contains(&"arena"));
    let combat = hits
        .iter()
        .find(|hit| hit.get("doc_id").and_then(Value::as_str) == Some("design_combat"))
        .ok_or("combat hit missing")?;
    assert_eq!(
        combat.get("speaker").and_then(Value::as_str),
        Some("plan_director")
    );
    assert_eq!(
        combat.get("section_id").and_then(Value::as_str),
        Some("design_combat_boss")
    );
    assert_eq!(combat.get("heading").and_then(Value::as_str), Some("Boss"));
    assert!(
        combat
            .get("content")
            .and_then(Value::as_str)
            .is_some_and(|content| content.contains("boss fight"))
    );
    let arena = hits
        .iter()
        .find(|hit| hit.get("doc_id").and_then(Value::as_str) == Some("arena"))
        .ok_or("arena hit missing")?;
    assert_eq!(
        arena.get("section_id").and_then(Value::as_str),
        Some("arena_layout")
    );
    Ok(())
}

#[test]
fn test_omni_vault_context_renders_markdown_and_json() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("vault");
    let cache = tmp.path().join("cache");
    seed_vault(&root)?;

    let output = omni_vault(&root, &cache, &["context", "boss fight"])?;
    assert!(output.status.success());
    let markdown = String::from_utf8(output.stdout)?;
    assert!(markdown.contains("## Retrieved documents"));
    assert!(markdown.contains("_source: combat.md | speaker: plan_director"));

    let structured = json_output(&omni_vault(
        &root,
        &cache,
        &["context", "boss fight", "--json"],
    )?)?;
    assert_eq!(structured.get("mode").and_then(Value::as_str), Some("focused"));
    let entries = structured
        .get("entries")
        .and_then(Value::as_array)
        .ok_or("missing entries")?;
    assert!(!entries.is_empty());
    assert_eq!(
        entries[0]
            .get("reason")
            .and_then(|reason| reason.get("kind"))
            .and_then(Value::as_str),
        Some("seed")
    );
    Ok(())
}

#[test]
fn test_omni_vault_related_hubs_and_clusters() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("vault");
    let cache = tmp.path().join("cache");
    seed_vault(&root)?;

    let related = json_output(&omni_vault(&root, &cache, &["related", "arena"])?)?;
    let linked: Vec<&str> = related
        .get("linked")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    assert_eq!(linked, vec!["design_combat"]);

    let hubs = json_output(&omni_vault(&root, &cache, &["hubs", "--limit", "2"])?)?;
    let hubs = hubs.as_array().ok_or("hubs not an array")?;
    assert_eq!(hubs.len(), 2);

    let clusters = json_output(&omni_vault(&root, &cache, &["clusters"])?)?;
    let clusters = clusters.as_array().ok_or("clusters not an array")?;
    assert_eq!(clusters.len(), 2);
    assert_eq!(
        clusters[0]
            .get("members")
            .and_then(Value::as_array)
            .map(Vec::len),
        Some(2)
    );

    let unknown = omni_vault(&root, &cache, &["related", "nope"])?;
    assert!(!unknown.status.success());
    Ok(())
}

#[test]
fn test_omni_vault_conf_overrides_retrieval() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let root = tmp.path().join("vault");
    seed_vault(&root)?;
    let conf = tmp.path().join("omni-vault.yaml");
    write_file(
        &conf,
        "retrieval:\n  max_hops: 0\n  hub_fallback_count: 0\n  include_structural_headers: false\n",
    )?;

    let conf_arg = conf.to_string_lossy().into_owned();
    let payload = json_output(&omni_vault(
        &root,
        &tmp.path().join("cache"),
        &["--conf", &conf_arg, "context", "parry layout arena", "--json"],
    )?)?;
    let entries = payload
        .get("entries")
        .and_then(Value::as_array)
        .ok_or("missing entries")?;
    assert!(!entries.is_empty());
    assert!(
        entries
            .iter()
            .all(|entry| entry.get("hop").and_then(Value::as_u64) == Some(0))
    );
    assert_eq!(
        payload.get("hubs").and_then(Value::as_array).map(Vec::len),
        Some(0)
    );
    Ok(())
}
