// ABOUTME: `aleutian-cache-dump` — inspects the persisted routing/embedding
// ABOUTME: cache described in spec.md §6, without mutating it

use aleutian_cache::{l2_norm, RoutingCache, RoutingCacheEntry};
use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Parser)]
#[command(
    name = "aleutian-cache-dump",
    version,
    author,
    about = "Inspect the persisted routing/embedding cache"
)]
struct Cli {
    /// Overrides ROUTING_CACHE_DIR, which overrides ~/.aleutian/cache/routing/.
    #[arg(long)]
    path: Option<PathBuf>,
}

fn resolve_cache_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }
    if let Ok(from_env) = std::env::var("ROUTING_CACHE_DIR") {
        return PathBuf::from(from_env);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".aleutian")
        .join("cache")
        .join("routing")
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cli = Cli::parse();
    let cache_dir = resolve_cache_dir(cli.path);
    debug!(path = %cache_dir.display(), "opening routing cache");

    let cache = match RoutingCache::open(&cache_dir) {
        Ok(cache) => cache,
        Err(e) => {
            eprintln!("{} failed to open routing cache at {}: {e}", "error:".red().bold(), cache_dir.display());
            return ExitCode::FAILURE;
        }
    };

    let mut entries: Vec<RoutingCacheEntry> = cache.iter_entries().collect();
    entries.sort_by(|a, b| a.corpus_hash.cmp(&b.corpus_hash));

    if entries.is_empty() {
        println!("{}", "routing cache is empty".dimmed());
        return ExitCode::SUCCESS;
    }

    println!("{} {}", entries.len().to_string().bold(), "entries in routing cache".bold());
    println!();

    for entry in &entries {
        print_entry(entry);
    }

    ExitCode::SUCCESS
}

fn print_entry(entry: &RoutingCacheEntry) {
    let key = aleutian_cache::cache_key(&entry.corpus_hash);
    println!("{} {}", "key:".cyan(), key);
    println!("{} {}", "corpus:".cyan(), entry.corpus_hash);

    match entry.ttl_remaining() {
        Some(secs) => println!("{} {secs}s", "ttl remaining:".cyan()),
        None if entry.expires_at.is_some() => println!("{} {}", "ttl remaining:".cyan(), "expired".red()),
        None => println!("{} {}", "ttl remaining:".cyan(), "never expires".dimmed()),
    }

    let mut tools: Vec<&String> = entry.embeddings.keys().collect();
    tools.sort();
    for tool in tools {
        let vector = &entry.embeddings[tool];
        let norm = l2_norm(vector);
        let sample: Vec<String> = vector.iter().take(4).map(|v| format!("{v:.4}")) .collect();
        println!(
            "  {} {:<24} dim={:<5} l2={:.4} sample=[{}]",
            "tool".dimmed(),
            tool,
            vector.len(),
            norm,
            sample.join(", "),
        );
    }
    println!();
}
