//! quake CLI
//!
//! Inspects the resources the quake provisioning API reports as available.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use eyre::{WrapErr, eyre};
use quake_client::HttpInventorySource;
use quake_inventory::{FilterSet, ProviderContext, ResourceDescriptor, ResourceKind};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod output;

use config::{Config, LogFormat};

#[derive(Parser)]
#[command(name = "quake")]
#[command(about = "Query resources available on a quake provisioning API", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, short = 'c', global = true, env = "QUAKE_CONFIG")]
    config: Option<PathBuf>,

    /// REST API base URL
    #[arg(long, global = true, env = "QUAKE_REST_URL")]
    rest_url: Option<String>,

    /// Bearer token
    #[arg(long, global = true, env = "QUAKE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Project ID
    #[arg(long, global = true, env = "QUAKE_PROJECT")]
    project: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List resource kinds and their filterable attributes
    Kinds,
    /// Fetch the inventory once and print a summary
    Refresh,
    /// List available images
    Images {
        /// Filter as name=v1,v2 or name~pattern (repeatable)
        #[arg(long = "filter", short = 'f')]
        filters: Vec<String>,
    },
    /// List available resources of any kind
    Query {
        /// Resource kind (image, machine_size, volume_flavor, location, ssh_key)
        kind: String,
        /// Filter as name=v1,v2 or name~pattern (repeatable)
        #[arg(long = "filter", short = 'f')]
        filters: Vec<String>,
    },
    /// Show project limits
    Limits,
    /// Show project usage
    Usage,
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Configure a provider context from the merged settings
async fn connect(config: &Config) -> Result<ProviderContext> {
    let api = &config.api;
    let mut source =
        HttpInventorySource::new(&api.rest_url, Duration::from_secs(api.timeout_secs))?;
    if let Some(token) = &api.token {
        source = source.with_token(token.clone());
    }
    if let Some(project) = &api.project {
        source = source.with_project(project.clone());
    }
    debug!(rest_url = %api.rest_url, "connecting");

    let context = tokio::select! {
        result = ProviderContext::configure(Arc::new(source)) => {
            result.wrap_err("fetching available resources")?
        }
        _ = tokio::signal::ctrl_c() => return Err(eyre!("interrupted")),
    };
    if let Some(portal_url) = &api.portal_url {
        debug!(%portal_url, "connected");
    }
    Ok(context)
}

fn print_descriptors(
    kind: ResourceKind,
    descriptors: &[ResourceDescriptor],
    json: bool,
) -> Result<()> {
    if json {
        let values = descriptors
            .iter()
            .map(output::descriptor_json)
            .collect::<serde_json::Result<Vec<_>>>()?;
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else if descriptors.is_empty() {
        warn!(%kind, "no matching resources");
    } else {
        print!("{}", output::descriptor_table(kind, descriptors));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let mut config = Config::load_default(cli.config.as_deref())?;
    if let Some(url) = cli.rest_url {
        config.api.rest_url = url;
    }
    if cli.token.is_some() {
        config.api.token = cli.token;
    }
    if cli.project.is_some() {
        config.api.project = cli.project;
    }
    if let Some(level) = cli.log_level {
        config.log.level = level;
    }

    init_tracing(&config.log.level, config.log.format);

    match cli.command {
        Commands::Kinds => {
            for kind in ResourceKind::ALL {
                println!("{kind:<14} {}", kind.attributes().join(", "));
            }
        }
        Commands::Refresh => {
            let context = connect(&config).await?;
            let snapshot = context.snapshot()?;
            if cli.json {
                let summary = output::refresh_summary(&snapshot);
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("generation {}", snapshot.generation());
                for (kind, count) in snapshot.counts() {
                    println!("{kind:<14} {count}");
                }
            }
        }
        Commands::Images { filters } => {
            let filters = FilterSet::parse_all(&filters)?;
            filters.validate(ResourceKind::Image)?;
            let context = connect(&config).await?;
            let images = context.images(&filters)?;
            print_descriptors(ResourceKind::Image, &images, cli.json)?;
        }
        Commands::Query { kind, filters } => {
            let kind: ResourceKind = kind.parse()?;
            let filters = FilterSet::parse_all(&filters)?;
            filters.validate(kind)?;
            let context = connect(&config).await?;
            let found = context.query(kind, &filters)?;
            print_descriptors(kind, &found, cli.json)?;
        }
        Commands::Limits => {
            let context = connect(&config).await?;
            let snapshot = context.snapshot()?;
            match snapshot.limits() {
                Some(limits) if cli.json => println!("{}", serde_json::to_string_pretty(limits)?),
                Some(limits) => print!("{}", output::limits_text(limits)),
                None => warn!("remote did not report project limits"),
            }
        }
        Commands::Usage => {
            let context = connect(&config).await?;
            let snapshot = context.snapshot()?;
            match snapshot.usage() {
                Some(usage) if cli.json => println!("{}", serde_json::to_string_pretty(usage)?),
                Some(usage) => print!("{}", output::usage_text(usage)),
                None => warn!("remote did not report project usage"),
            }
        }
    }

    Ok(())
}
