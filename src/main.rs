//! # Docket CLI (`docket`)
//!
//! Terminal front-end for the live document catalog. It authenticates,
//! pulls the catalog, and drives the category index and query engine; the
//! `watch` command additionally follows the live update channel.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docket login` | Exchange credentials for a bearer token |
//! | `docket categories` | Show every category bucket with its count |
//! | `docket search "<query>"` | Ranked fuzzy search over the catalog |
//! | `docket watch` | Follow live catalog updates until interrupted |
//!
//! ## Examples
//!
//! ```bash
//! # Print a token for later use
//! docket login --username alice --password hunter2
//!
//! # Search with a pre-issued token
//! DOCKET_TOKEN=... docket search "resume" --category Career
//!
//! # Watch the catalog live
//! DOCKET_TOKEN=... docket watch
//! ```

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use docket::client::ApiClient;
use docket::config::{load_config, Config};
use docket::index::{bucket_counts, CategoryBucket};
use docket::search;
use docket::store::CatalogStore;
use docket::sync::SyncChannel;

/// Docket, a live catalog browser for a classified document store.
#[derive(Parser)]
#[command(
    name = "docket",
    about = "Live document catalog browser with category-scoped fuzzy search",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/docket.toml")]
    config: PathBuf,

    /// Enable debug logging (RUST_LOG overrides).
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Credentials or a pre-issued token, shared by the catalog commands.
#[derive(Args)]
struct Auth {
    /// Pre-issued bearer token; skips the credential exchange.
    #[arg(long, env = "DOCKET_TOKEN")]
    token: Option<String>,

    #[arg(long, env = "DOCKET_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "DOCKET_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

impl Auth {
    async fn resolve(self, client: &ApiClient) -> Result<String> {
        if let Some(token) = self.token {
            return Ok(token);
        }
        match (self.username, self.password) {
            (Some(username), Some(password)) => client.login(&username, &password).await,
            _ => bail!("provide --token or both --username and --password"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Exchange credentials for a bearer token and print it.
    Login {
        #[arg(long, env = "DOCKET_USERNAME")]
        username: String,

        #[arg(long, env = "DOCKET_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Fetch the catalog and show every category bucket with its count.
    Categories {
        #[command(flatten)]
        auth: Auth,
    },

    /// Fetch the catalog and run a ranked fuzzy search against it.
    Search {
        /// The search query string. An empty query lists the category.
        query: String,

        /// Restrict results to one category id (`all` matches everything).
        #[arg(long, default_value = "all")]
        category: String,

        /// Maximum number of results to display.
        #[arg(long)]
        limit: Option<usize>,

        #[command(flatten)]
        auth: Auth,
    },

    /// Fetch the catalog, then follow the live update channel until
    /// interrupted. The connection is not retried after a drop; rerun to
    /// reconnect.
    Watch {
        #[command(flatten)]
        auth: Auth,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "docket=debug"
    } else {
        "docket=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli.config)?;
    let client = ApiClient::new(&config.api)?;

    match cli.command {
        Commands::Login { username, password } => {
            let token = client.login(&username, &password).await?;
            println!("{token}");
            Ok(())
        }
        Commands::Categories { auth } => {
            let token = auth.resolve(&client).await?;
            let documents = client.fetch_documents(&token).await?;
            print_buckets(&bucket_counts(&documents, &config.categories));
            Ok(())
        }
        Commands::Search {
            query,
            category,
            limit,
            auth,
        } => {
            let token = auth.resolve(&client).await?;
            let documents = client.fetch_documents(&token).await?;
            let results = search::search(&documents, &category, &query, config.retrieval.threshold);
            if results.is_empty() {
                println!("No results.");
                return Ok(());
            }
            let limit = limit.unwrap_or(config.retrieval.limit);
            for (rank, doc) in results.iter().take(limit).enumerate() {
                println!(
                    "{:>3}. {:<40} {:<12} {:>4.0}%  {}",
                    rank + 1,
                    doc.filename,
                    doc.category,
                    doc.confidence_pct(),
                    doc.file_type
                );
            }
            if results.len() > limit {
                println!("... and {} more (raise --limit to see them)", results.len() - limit);
            }
            Ok(())
        }
        Commands::Watch { auth } => run_watch(&config, &client, auth).await,
    }
}

async fn run_watch(config: &Config, client: &ApiClient, auth: Auth) -> Result<()> {
    let token = auth.resolve(client).await?;
    let ws_url = config.api.ws_url()?;

    let store = Arc::new(CatalogStore::new());
    store.replace(client.fetch_documents(&token).await?);
    println!("loaded {} documents", store.len());
    print_buckets(&bucket_counts(&store.current(), &config.categories));

    let channel = SyncChannel::new(Arc::clone(&store));
    let handle = channel.connect(&ws_url, &token).await?;
    let mut updates = handle.updates();
    println!("sync active, watching for updates (Ctrl-C to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("stopping");
                break;
            }
            changed = updates.changed() => {
                if changed.is_err() {
                    // Channel ended. The last snapshot stays queryable.
                    println!("offline, live channel closed ({} documents retained)", store.len());
                    break;
                }
                let applied = *updates.borrow_and_update();
                println!("update {}: {} documents", applied, store.len());
                print_buckets(&bucket_counts(&store.current(), &config.categories));
            }
        }
    }

    handle.close().await;
    Ok(())
}

fn print_buckets(buckets: &[CategoryBucket]) {
    println!("{:<12} {:<16} {:>5}", "ID", "LABEL", "COUNT");
    for bucket in buckets {
        println!("{:<12} {:<16} {:>5}", bucket.id, bucket.label, bucket.count);
    }
}
