//! Plugdock - plugin install service for CMS sites
//!
//! This is the main entry point for the Plugdock CLI.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use plugdock_api::{run_api_server, ApiState};
use plugdock_core::config::{ConfigLoader, LogFormat, LoggingConfig, PlugdockConfig};
use plugdock_plugin::{InstallRequest, InstallService};

/// Plugdock - install plugins from a remote directory into CMS sites
#[derive(Parser)]
#[command(name = "plugdock")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Path to the configuration file
        config: Option<PathBuf>,
    },

    /// Install plugins into a site from the command line
    Install {
        /// Path to the configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Site to install into
        #[arg(short, long)]
        site: String,

        /// Keep going when a plugin fails
        #[arg(long)]
        bulk: bool,

        /// Plugin slugs
        plugins: Vec<String>,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the configuration file
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let path = config.unwrap_or_else(ConfigLoader::default_path);
            let config = load_config(&path, cli.verbose)?;
            tracing::info!("Starting Plugdock with config: {}", path.display());

            let addr: SocketAddr = config
                .api
                .listen
                .parse()
                .with_context(|| format!("invalid api.listen address: {}", config.api.listen))?;
            let state = Arc::new(ApiState::from_config(&config)?);

            tokio::select! {
                result = run_api_server(addr, state) => result?,
                _ = tokio::signal::ctrl_c() => tracing::info!("Shutting down"),
            }
        }

        Commands::Install { config, site, bulk, plugins } => {
            let path = config.unwrap_or_else(ConfigLoader::default_path);
            let config = load_config(&path, cli.verbose)?;
            let site_config = config
                .site(&site)
                .with_context(|| format!("unknown site: {}", site))?;

            let service = InstallService::for_site(&config, site_config)?;
            match service.install_plugins(InstallRequest { plugins, bulk }).await {
                Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                Err(err) => {
                    println!("{}", serde_json::to_string_pretty(&err)?);
                    std::process::exit(1);
                }
            }
        }

        Commands::Validate { config } => {
            init_tracing(&LoggingConfig::default(), cli.verbose);
            let path = config.unwrap_or_else(ConfigLoader::default_path);

            match ConfigLoader::load(&path) {
                Ok(config) => {
                    println!(
                        "✅ Configuration '{}' is valid! ({} site(s))",
                        path.display(),
                        config.sites.len()
                    );
                }
                Err(e) => {
                    eprintln!("❌ Configuration Error: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Version => {
            println!("Plugdock v{}", plugdock_core::VERSION);
        }
    }

    Ok(())
}

fn load_config(path: &Path, verbose: bool) -> anyhow::Result<PlugdockConfig> {
    let config = ConfigLoader::load(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    init_tracing(&config.logging, verbose);
    Ok(config)
}

/// Logs go to stderr so command output stays machine-readable
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    if verbose {
        tracing::info!("Verbose mode enabled");
    }
}
