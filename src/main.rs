//! Binary entrypoint for the dbextract CLI.
//!
//! Commands:
//! - `extract <type> <id>...` - crawl the given ids and everything they reference
//! - `sort [--table <name>]` - re-sort and deduplicate table files in place
//! - `init` - write a starter `dbextract.toml` and create missing table files
//!
//! See the library crate docs for module-level details: `dbextract::`.
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{error, info, warn};

use dbextract::config::Config;
use dbextract::crawler::{ConflictPolicy, CrawlContext, Crawler, TerminalConfirm};
use dbextract::entity::EntityType;
use dbextract::errors::ExtractError;
use dbextract::fetch::HttpSource;
use dbextract::store::TableStore;

#[derive(Parser)]
#[command(name = "dbextract")]
#[command(about = "Extract database pages into sorted pfDB table files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "dbextract.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract entities and everything they reference
    Extract {
        /// Entity type of the given ids
        #[arg(value_enum)]
        kind: EntityType,

        /// Ids to extract, in order
        #[arg(required = true, num_args = 1..)]
        ids: Vec<u32>,

        /// What to do with ids already present in both local tables
        #[arg(long, value_enum)]
        conflict: Option<ConflictPolicy>,
    },
    /// Sort every known table file, or only the named one (e.g. "enUS/units")
    Sort {
        #[arg(short, long)]
        table: Option<String>,
    },
    /// Write a default configuration and create missing table files
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_exists = tokio::fs::try_exists(&cli.config).await.unwrap_or(false);
    let config = Config::load_or_default(&cli.config).await?;
    init_logging(&config, cli.verbose);
    if !config_exists && !matches!(cli.command, Commands::Init) {
        warn!("{} not found, using default configuration", cli.config);
    }

    match run(cli, config, config_exists).await {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<ExtractError>() {
            Some(fatal) if fatal.is_fatal() => {
                error!("FATAL: {}", fatal);
                std::process::exit(1);
            }
            _ => Err(e),
        },
    }
}

async fn run(cli: Cli, config: Config, config_exists: bool) -> Result<()> {
    match cli.command {
        Commands::Extract {
            kind,
            ids,
            conflict,
        } => {
            let policy = conflict.unwrap_or(config.crawl.conflict);
            let source = Arc::new(HttpSource::new(config.source.clone())?);
            let store = TableStore::from_config(&config.storage);
            let mut crawler = Crawler::new(source, store, policy, Box::new(TerminalConfirm));

            let mut ctx = CrawlContext::new();
            crawler.crawl(&mut ctx, kind, &ids).await?;
            info!("Done: {}", ctx.summary);
        }
        Commands::Sort { table } => {
            let store = TableStore::from_config(&config.storage);
            let tables = store.known_tables();
            let selected: Vec<_> = match table {
                Some(name) => {
                    let found: Vec<_> = tables.into_iter().filter(|t| t.name == name).collect();
                    if found.is_empty() {
                        warn!("Unknown table \"{}\"", name);
                    }
                    found
                }
                None => tables,
            };
            for table in &selected {
                info!("Sorting {}", store.path(table).display());
                store.sort(table).await?;
            }
        }
        Commands::Init => {
            info!("Initializing new dbextract configuration");
            if config_exists {
                info!("{} already exists, leaving it untouched", cli.config);
            } else {
                Config::create_default(&cli.config).await?;
                info!("Configuration file created at {}", cli.config);
            }

            let store = TableStore::from_config(&config.storage);
            for path in store.ensure_all().await? {
                info!("Created {}", path.display());
            }
        }
    }
    Ok(())
}

fn init_logging(config: &Config, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // Base level from CLI verbosity overrides config
    let base_level = match verbosity {
        0 => config.log_level(),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let log_file = config.logging.file.as_ref().and_then(|file| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(file)
            .ok()
    });

    if let Some(f) = log_file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only when someone is watching
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
