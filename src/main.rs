//! aptscout - Enrich apartment listings with nearby stores and commute times
//!
//! Reads listings from a scraper export, resolves their details and queries the
//! maps API for grocery stores and commute durations, caching everything on disk.

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aptscout::app::App;
use aptscout::cli::{Cli, StartupConfig};
use aptscout::config::{Config, API_KEY_VAR};
use aptscout::data::{FileListingSource, ListingSource, OfflineListingSource};
use aptscout::maps::{DryRunTransport, EnrichConfig, HttpTransport, QueryTransport};

/// Picks the listing source for this run
fn listing_source(startup: &StartupConfig) -> Result<Box<dyn ListingSource>, Box<dyn std::error::Error>> {
    if startup.offline {
        return Ok(Box::new(OfflineListingSource));
    }
    match &startup.listings {
        Some(path) => {
            info!(path = %path.display(), "Reading listing export");
            Ok(Box::new(FileListingSource::from_path(path)?))
        }
        None => {
            warn!("No --listings export given; only cached listings are available");
            Ok(Box::new(OfflineListingSource))
        }
    }
}

/// Picks the maps transport for this run
fn query_transport(
    startup: &StartupConfig,
    config: &Config,
) -> Result<Box<dyn QueryTransport>, Box<dyn std::error::Error>> {
    if startup.offline {
        return Ok(Box::new(DryRunTransport::new()));
    }
    if config.api_key.is_none() {
        warn!("{} is not set; maps queries will not be sent", API_KEY_VAR);
        return Ok(Box::new(DryRunTransport::new()));
    }
    Ok(Box::new(HttpTransport::new(config.http_timeout)?))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse CLI arguments first so --help and --version work without logging
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,aptscout=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let startup = StartupConfig::from_cli(&cli)?;
    let config = Config::from_env()?;
    let cache_dir = config.resolve_cache_dir(startup.cache_dir.as_deref());
    info!(cache_dir = %cache_dir.display(), offline = startup.offline, "Starting aptscout");

    let source = listing_source(&startup)?;
    let transport = query_transport(&startup, &config)?;
    let enrich = EnrichConfig {
        partial_ok: startup.partial_ok,
        ..EnrichConfig::with_api_key(config.api_key.clone().unwrap_or_default())
    };

    let app = App::new(source.as_ref(), transport.as_ref(), &cache_dir, enrich, startup.refresh);
    let listings = app.run(&startup.search).await?;

    let enriched = listings
        .iter()
        .filter(|l| l.cached_stores().is_some() && l.cached_commute().is_some())
        .count();
    info!(listings = listings.len(), enriched, "Done");

    Ok(())
}
