use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use address_sync::config::Config;
use address_sync::countries;
use address_sync::infra::places_http::HttpPlacesLoader;
use address_sync::logging;
use address_sync::parser::parse_formatted_address;
use address_sync::resolver::AddressResolver;
use address_sync::session::{Readiness, WidgetSession};
use address_sync::types::{NormalizedAddress, SelectionEvidence};

#[derive(Parser)]
#[command(name = "address_sync")]
#[command(about = "Resolve free-text addresses into normalized address records")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a formatted address string offline
    Parse {
        /// e.g. "123 Main St, Springfield, IL 62704, USA"
        formatted: String,
    },
    /// Normalize a country name or code to its ISO code
    Country { value: String },
    /// Resolve free text through the configured places service
    Resolve {
        query: String,
        /// Skip the places service and parse the text locally
        #[arg(long)]
        offline: bool,
    },
}

#[derive(Serialize)]
struct ResolveOutput<'a> {
    path: &'a str,
    address: &'a NormalizedAddress,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize output")?
    );
    Ok(())
}

async fn resolver_for(config: &Config) -> Result<AddressResolver> {
    let loader = Arc::new(HttpPlacesLoader::headless(config.places.clone()));
    let session = WidgetSession::from_config(&config.places, loader);

    match session.initialize().await {
        Readiness::Ready => {}
        Readiness::Failed(reason) => bail!("places service unavailable: {}", reason),
        other => bail!("places session did not become ready: {:?}", other),
    }
    let library = session
        .library()
        .context("places session reported ready without a library")?;
    Ok(AddressResolver::new(library.service))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { formatted } => {
            let address = parse_formatted_address(&formatted);
            print_json(&address)?;
        }
        Commands::Country { value } => {
            let code = countries::normalize_country(&value);
            let name = countries::by_code(code).map(|c| c.name).unwrap_or_default();
            println!("{} {}", code, name);
        }
        Commands::Resolve { query, offline } => {
            let resolver = if offline {
                AddressResolver::offline()
            } else {
                let config = Config::load().context("failed to load configuration")?;
                match resolver_for(&config).await {
                    Ok(resolver) => resolver,
                    Err(e) => {
                        warn!(error = %e, "falling back to offline resolution");
                        AddressResolver::offline()
                    }
                }
            };

            let resolution = resolver
                .resolve_traced(&SelectionEvidence::from_input(query))
                .await;
            info!(path = resolution.path.as_str(), "resolution complete");
            print_json(&ResolveOutput {
                path: resolution.path.as_str(),
                address: &resolution.address,
            })?;
        }
    }

    Ok(())
}
