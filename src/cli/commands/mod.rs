//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod helpers;
mod proxy;
mod reports;
mod serve;
mod smoke;
mod submit;
mod view;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use forensics_viewer::config::{load_settings_with_options, LoadOptions};

#[derive(Parser)]
#[command(name = "forensics")]
#[command(about = "Dashboard, dev proxy and diagnostics for image-forensics reports")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resolve relative paths from current working directory instead of config file location
    #[arg(long, global = true)]
    cwd: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Analysis backend URL (overrides config and FORENSICS_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Start the report dashboard (with the dev proxy mounted unless disabled)
    Serve {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: 127.0.0.1:3030)
        #[arg(default_value = "127.0.0.1:3030")]
        bind: String,

        /// Do not forward /images and /mmapi to the backend
        #[arg(long)]
        no_proxy: bool,
    },

    /// Run only the development proxy
    Proxy {
        /// Address to bind to: PORT, HOST, or HOST:PORT (default: 127.0.0.1:3000)
        #[arg(default_value = "127.0.0.1:3000")]
        bind: String,
    },

    /// Show the report for an image hash
    View {
        /// Image hash
        hash: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Keep polling until the backend has finished every analysis
        #[arg(short, long)]
        follow: bool,

        /// Polling interval in seconds
        #[arg(long, default_value = "5")]
        interval: u64,
    },

    /// List cached reports, newest first
    Reports,

    /// Submit an image URL to the backend for analysis
    Submit {
        /// Image URL
        url: String,

        /// Also ask the backend to generate the report right away
        #[arg(long)]
        analyze: bool,
    },

    /// Check connectivity to the document database
    SmokeTest {
        /// Connection URI (default: mongodb://localhost:27017, or MONGODB_URI)
        #[arg(long)]
        uri: Option<String>,

        /// Database name
        #[arg(long)]
        database: Option<String>,

        /// Collection name
        #[arg(long)]
        collection: Option<String>,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        api_url: cli.api_url,
    };
    let (settings, _config) = load_settings_with_options(options).await;

    match cli.command {
        Commands::Serve { bind, no_proxy } => serve::cmd_serve(&settings, &bind, no_proxy).await,
        Commands::Proxy { bind } => proxy::cmd_proxy(&settings, &bind).await,
        Commands::View {
            hash,
            json,
            follow,
            interval,
        } => view::cmd_view(&settings, &hash, json, follow, interval).await,
        Commands::Reports => reports::cmd_reports(&settings).await,
        Commands::Submit { url, analyze } => submit::cmd_submit(&settings, &url, analyze).await,
        Commands::SmokeTest {
            uri,
            database,
            collection,
        } => smoke::cmd_smoke_test(&settings, uri, database, collection).await,
    }
}
