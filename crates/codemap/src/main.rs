//! codemap: Source maps for C and C++ projects
//!
//! Classifies files, extracts top-level definitions and call sites, ranks
//! identifiers across a project, and keeps the index fresh while watching.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use codemap_index::{
    FileEvent, FileScan, FileWatcher, IndexError, IndexStats, Indexer, Language, SymbolCache,
    TokenScorer, classify, top_tokens, watch_and_rebuild,
};
use config::{CODEMAP_DIR, CONFIG_FILE, Config, DEFAULT_CONFIG};

/// Source maps for C and C++ projects
#[derive(Parser)]
#[command(name = "codemap")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to .codemap directory (default: search for .codemap/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new .codemap directory with config file
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Print the detected language of each path
    Classify {
        /// Files to classify
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Extract symbols and calls from files
    Symbols {
        /// Files to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Index a directory tree
    Index {
        /// Directory to index (default: project root from config or current dir)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Watch for changes and update incrementally
        #[arg(long)]
        watch: bool,
    },

    /// Rank identifiers across a directory tree
    Scores {
        /// Directory to score (default: project root from config or current dir)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Maximum number of tokens to print
        #[arg(long, default_value = "50")]
        limit: usize,
    },
}

#[derive(Serialize)]
struct Classification<'a> {
    path: &'a Path,
    language: Language,
}

#[derive(Serialize)]
struct FileReport<'a> {
    path: &'a Path,
    #[serde(flatten)]
    scan: &'a FileScan,
}

fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Initialize logging for interactive commands.
/// Logs to stderr so stdout stays clean for JSON output.
fn init_logging(verbose: bool) {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter(verbose))
        .init();
}

/// Initialize logging for watch mode.
/// Logs to rotating files in .codemap/logs/ with daily rotation.
fn init_file_logging(codemap_dir: &Path, verbose: bool) {
    let logs_dir = codemap_dir.join("logs");

    if let Err(e) = std::fs::create_dir_all(&logs_dir) {
        eprintln!("Warning: Failed to create logs directory: {}", e);
        init_logging(verbose);
        return;
    }

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "codemap.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Dropping the guard would stop logging
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .with(env_filter(verbose))
        .init();
}

/// Load config from an explicit path or auto-discover `.codemap/config.toml`.
///
/// Returns the config and the `.codemap` directory it came from.
fn load_config(override_path: Option<&PathBuf>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = override_path {
        // Explicit path override - either the .codemap directory or the file
        let config_file = if path.is_dir() {
            path.join(CONFIG_FILE)
        } else {
            path.clone()
        };
        let codemap_dir = config_file.parent().unwrap_or(path).to_path_buf();
        let config = Config::from_file(&config_file)?;
        return Ok((config, Some(codemap_dir)));
    }

    match Config::find_and_load()? {
        Some((config, codemap_dir)) => Ok((config, Some(codemap_dir))),
        None => Ok((Config::default(), None)),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init must work even when an existing config is broken
    if let Commands::Init { force } = cli.command {
        init_logging(cli.verbose);
        return run_init(force);
    }

    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let (config, config_dir) = load_config(cli.config.as_ref())?;

    // Watch mode is long-running, so it logs to files
    if matches!(cli.command, Commands::Index { watch: true, .. }) {
        let codemap_dir = config_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(CODEMAP_DIR));
        init_file_logging(&codemap_dir, cli.verbose);
    } else {
        init_logging(cli.verbose);
    }

    match &config_dir {
        Some(dir) => info!("Loaded config from {}", dir.join(CONFIG_FILE).display()),
        None => debug!("No .codemap/config.toml found, using defaults"),
    }

    let errors = config.validate();
    if !errors.is_empty() {
        let details: Vec<_> = errors.iter().map(|e| e.to_string()).collect();
        anyhow::bail!("Invalid configuration:\n  {}", details.join("\n  "));
    }

    let project_root = |path: Option<PathBuf>| -> PathBuf {
        let root = path.unwrap_or_else(|| config.resolve_root(config_dir.as_deref()));
        // Canonicalize to resolve relative paths like "." or ".."
        root.canonicalize().unwrap_or(root)
    };

    match cli.command {
        Commands::Init { force } => run_init(force)?,

        Commands::Classify { paths } => {
            let report: Vec<_> = paths
                .iter()
                .map(|path| Classification {
                    path,
                    language: classify(path),
                })
                .collect();
            print_json(&report)?;
        }

        Commands::Symbols { paths } => {
            let mut indexer = Indexer::with_config(SymbolCache::new(), config.indexer_config());
            let mut scans = Vec::with_capacity(paths.len());
            for path in &paths {
                let scan = indexer
                    .scan_file(path)
                    .with_context(|| format!("Failed to scan {}", path.display()))?;
                scans.push(scan);
            }

            let report: Vec<_> = paths
                .iter()
                .zip(&scans)
                .map(|(path, scan)| FileReport { path, scan })
                .collect();
            print_json(&report)?;
        }

        Commands::Index { path, watch } => {
            let root = project_root(path);
            info!("Indexing {}", root.display());
            log_extensions();

            let mut indexer = Indexer::with_config(SymbolCache::new(), config.indexer_config());
            let stats = indexer.index_directory(&root)?;
            log_stats(&stats);

            if watch {
                run_watch(&mut indexer, &root, &config)?;
            } else {
                print_json(&stats)?;
            }
        }

        Commands::Scores { path, limit } => {
            let root = project_root(path);
            info!("Scoring {}", root.display());
            log_extensions();

            let mut indexer = Indexer::with_config(SymbolCache::new(), config.indexer_config());
            let stats = indexer.index_directory(&root)?;
            log_stats(&stats);

            let scores = TokenScorer::new(config.score_config()).score(&root, indexer.cache().iter());
            print_json(&top_tokens(&scores, limit))?;
        }
    }

    Ok(())
}

fn run_init(force: bool) -> Result<()> {
    let codemap_dir = PathBuf::from(CODEMAP_DIR);
    let config_path = codemap_dir.join(CONFIG_FILE);

    if config_path.exists() && !force {
        anyhow::bail!(".codemap/config.toml already exists. Use --force to overwrite.");
    }

    if !codemap_dir.exists() {
        std::fs::create_dir_all(&codemap_dir)
            .with_context(|| format!("Failed to create {}", codemap_dir.display()))?;
        info!("Created {}/", codemap_dir.display());
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    info!("Created {}", config_path.display());
    info!("Next steps:");
    info!("  1. Edit .codemap/config.toml to configure your project");
    info!("  2. Run 'codemap index' to index the project");
    info!("  3. Run 'codemap scores' to rank its identifiers");
    Ok(())
}

fn log_extensions() {
    debug!(
        "Indexing extensions: {}",
        Language::supported_extensions().join(", ")
    );
}

fn log_stats(stats: &IndexStats) {
    info!(
        "Indexed {} files ({} skipped), {} symbols, {} calls (parse: {}ms, cache hits: {})",
        stats.files_processed,
        stats.files_skipped,
        stats.symbols_found,
        stats.calls_found,
        stats.parse_time_ms,
        stats.cache_hits
    );
}

/// Re-index files as they change until the watcher stops.
fn run_watch(indexer: &mut Indexer, root: &Path, config: &Config) -> Result<()> {
    let watcher = FileWatcher::with_config(root, config.watcher_config())
        .with_context(|| format!("Failed to watch {}", root.display()))?;
    info!("File watcher started for {}", watcher.root().display());

    watch_and_rebuild(
        &watcher,
        |event| -> std::result::Result<(), IndexError> {
            match event {
                FileEvent::Modified(path) => {
                    let stats = indexer.rebuild_file(&path)?;
                    debug!(
                        path = %path.display(),
                        symbols = stats.symbols_found,
                        "Re-indexed file"
                    );
                }
                FileEvent::Deleted(path) => {
                    if !indexer.remove_file(&path) {
                        warn!(path = %path.display(), "Deleted file was not indexed");
                    }
                }
            }
            Ok(())
        },
    );

    info!("File watcher stopped");
    Ok(())
}
