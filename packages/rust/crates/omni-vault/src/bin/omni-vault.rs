#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use omni_vault::{
    IndexCacheStore, RetrievalEngine, VaultConfig, VaultRuntime, VaultSnapshot, scan_vault,
};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "omni-vault",
    about = "Link graph, semantic search and retrieval context for a markdown vault",
    arg_required_else_help = true
)]
struct Cli {
    /// Vault root directory.
    #[arg(
        long,
        short = 'r',
        value_name = "DIR",
        default_value = ".",
        global = true
    )]
    root: PathBuf,

    /// Explicit config file; defaults to `.omni-vault.yaml` under the root.
    #[arg(long = "conf", short = 'c', value_name = "FILE", global = true)]
    config_file: Option<PathBuf>,

    /// Output format.
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Json, global = true)]
    output: OutputFormat,

    /// Skip the on-disk index cache for this run.
    #[arg(long, default_value_t = false, global = true)]
    no_cache: bool,

    /// Debug logging on stderr.
    #[arg(long, short = 'v', default_value_t = false, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dump nodes, edges and phantom nodes.
    Graph,
    /// Corpus and index counters.
    Stats,
    /// Semantic search over documents.
    Search {
        query: String,
        #[arg(short, long, default_value_t = 3)]
        limit: usize,
        #[arg(long = "min-score", default_value_t = 0.0)]
        min_score: f64,
    },
    /// Assemble the retrieval context for a query.
    Context {
        query: String,
        /// Emit the structured context instead of Markdown.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Linked and implicitly related documents for one document.
    Related {
        doc_id: String,
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// Top documents by PageRank.
    Hubs {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Connected components, largest first.
    Clusters,
    /// Remove the cached index for this vault.
    ClearCache,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "omni_vault=debug"
        } else {
            "omni_vault=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn emit<T: Serialize>(value: &T, output: OutputFormat) -> Result<()> {
    let rendered = match output {
        OutputFormat::Json => serde_json::to_string(value),
        OutputFormat::Pretty => serde_json::to_string_pretty(value),
    }
    .context("failed to serialize CLI output as JSON")?;
    println!("{rendered}");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<VaultConfig> {
    let mut config = VaultConfig::resolve(&cli.root, cli.config_file.as_deref())
        .context("failed to load vault config")?;
    if cli.no_cache {
        config.cache.enabled = false;
    }
    Ok(config)
}

fn load_snapshot(root: &Path, config: VaultConfig) -> Result<Arc<VaultSnapshot>> {
    let files = scan_vault(root, &config.parser.excluded_dirs)
        .with_context(|| format!("failed to scan vault at '{}'", root.display()))?;
    let runtime = VaultRuntime::new(config);
    Ok(runtime.reload(root, &files))
}

fn execute(cli: &Cli, config: VaultConfig) -> Result<()> {
    let retrieval = config.retrieval.clone();
    let cache_config = config.cache.clone();
    match &cli.command {
        Command::ClearCache => {
            let Some(store) = IndexCacheStore::from_config(&cache_config) else {
                let payload = json!({ "cleared": false, "reason": "cache_disabled" });
                return emit(&payload, cli.output);
            };
            let cleared = store
                .clear(&cli.root)
                .context("failed to clear index cache")?;
            emit(
                &json!({
                    "cleared": cleared,
                    "path": store.slot_path(&cli.root),
                }),
                cli.output,
            )
        }
        Command::Graph => {
            let snapshot = load_snapshot(&cli.root, config)?;
            emit(snapshot.corpus().graph(), cli.output)
        }
        Command::Stats => {
            let snapshot = load_snapshot(&cli.root, config)?;
            emit(&snapshot.stats(), cli.output)
        }
        Command::Search {
            query,
            limit,
            min_score,
        } => {
            let snapshot = load_snapshot(&cli.root, config)?;
            anyhow::ensure!(
                snapshot.is_index_ready(),
                "semantic index is required for search"
            );
            let hits = RetrievalEngine::new(&snapshot, &retrieval).search(
                query,
                (*limit).max(1),
                *min_score,
            );
            emit(&json!({ "query": query, "hits": hits }), cli.output)
        }
        Command::Context { query, json } => {
            let snapshot = load_snapshot(&cli.root, config)?;
            let engine = RetrievalEngine::new(&snapshot, &retrieval);
            let context = engine.retrieve(query);
            if *json {
                emit(&context, cli.output)
            } else {
                print!("{}", engine.render(&context));
                Ok(())
            }
        }
        Command::Related { doc_id, limit } => {
            let snapshot = load_snapshot(&cli.root, config)?;
            let corpus = snapshot.corpus();
            if corpus.document(doc_id).is_none() {
                anyhow::bail!("unknown document id '{doc_id}'");
            }
            let linked: Vec<&str> = corpus.adjacency().neighbors(doc_id).collect();
            let similar = snapshot
                .semantic()
                .map(|layer| {
                    layer
                        .index()
                        .similar_to(doc_id, (*limit).max(1), 0.0, |candidate| {
                            corpus.adjacency().is_adjacent(doc_id, candidate)
                        })
                })
                .unwrap_or_default();
            emit(
                &json!({
                    "doc_id": doc_id,
                    "linked": linked,
                    "similar": similar,
                }),
                cli.output,
            )
        }
        Command::Hubs { limit } => {
            let snapshot = load_snapshot(&cli.root, config)?;
            let hubs: Vec<_> = snapshot.corpus().hubs().iter().take(*limit).collect();
            emit(&hubs, cli.output)
        }
        Command::Clusters => {
            let snapshot = load_snapshot(&cli.root, config)?;
            emit(&snapshot.corpus().clusters(), cli.output)
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(&cli)?;
    execute(&cli, config)
}
