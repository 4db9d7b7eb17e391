//! Command-line interface parsing for aptscout
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the search filters, refresh policy and mode switches the pipeline runs with.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use thiserror::Error;

use crate::app::RefreshPolicy;
use crate::data::SearchParams;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The neighborhood list cannot be placed in a search URL path
    #[error("Invalid neighborhoods: '{0}'. Use a comma-separated list without spaces or '/'")]
    InvalidNeighborhoods(String),

    /// An amenity name cannot be placed in a search URL filter
    #[error("Invalid amenity: '{0}'. Amenities are single words such as laundry, doorman, elevator")]
    InvalidAmenity(String),
}

/// Pipeline stages that `--refresh` can force
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RefreshTarget {
    Catalog,
    Details,
    Stores,
    Commute,
    All,
}

/// aptscout - Enrich apartment listings with nearby stores and commute times
#[derive(Parser, Debug)]
#[command(name = "aptscout")]
#[command(about = "Enrich apartment listings with nearby grocery stores and commute times")]
#[command(version)]
pub struct Cli {
    /// Do not fetch listings or send maps queries; log what would be requested
    #[arg(long)]
    pub offline: bool,

    /// Recompute a stage even when it is cached (repeatable)
    ///
    /// Examples:
    ///   aptscout --refresh commute
    ///   aptscout --refresh details --refresh stores
    #[arg(long, value_enum, value_name = "STAGE")]
    pub refresh: Vec<RefreshTarget>,

    /// Listing export (search pages and detail documents) to read from
    #[arg(long, value_name = "FILE")]
    pub listings: Option<PathBuf>,

    /// Directory for the cache files
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 2)]
    pub bedrooms: u32,

    /// Maximum monthly rent
    #[arg(long, default_value_t = 4950)]
    pub price_cap: u32,

    /// Comma-separated neighborhood slugs
    #[arg(long, default_value = "downtown")]
    pub neighborhoods: String,

    /// Required amenity (repeatable; defaults to laundry, doorman, elevator)
    #[arg(long, value_name = "AMENITY")]
    pub amenity: Vec<String>,

    /// Keep the maps queries that succeeded when others fail
    #[arg(long)]
    pub partial_ok: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub offline: bool,
    pub refresh: RefreshPolicy,
    pub listings: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub search: SearchParams,
    pub partial_ok: bool,
}

/// Folds the repeated `--refresh` values into a policy
pub fn refresh_policy(targets: &[RefreshTarget]) -> RefreshPolicy {
    targets.iter().fold(RefreshPolicy::default(), |policy, target| match target {
        RefreshTarget::Catalog => RefreshPolicy {
            catalog: true,
            ..policy
        },
        RefreshTarget::Details => RefreshPolicy {
            details: true,
            ..policy
        },
        RefreshTarget::Stores => RefreshPolicy {
            stores: true,
            ..policy
        },
        RefreshTarget::Commute => RefreshPolicy {
            commute: true,
            ..policy
        },
        RefreshTarget::All => RefreshPolicy::all(),
    })
}

/// Validates an amenity argument
///
/// # Returns
/// * `Ok(String)` with the trimmed, lowercased amenity
/// * `Err(CliError::InvalidAmenity)` if it is empty or contains separators
pub fn parse_amenity_arg(s: &str) -> Result<String, CliError> {
    let amenity = s.trim().to_lowercase();
    if amenity.is_empty() || amenity.contains([',', '|', '/', ' ']) {
        return Err(CliError::InvalidAmenity(s.to_string()));
    }
    Ok(amenity)
}

fn parse_neighborhoods_arg(s: &str) -> Result<String, CliError> {
    let neighborhoods = s.trim();
    if neighborhoods.is_empty() || neighborhoods.contains(['/', ' ']) {
        return Err(CliError::InvalidNeighborhoods(s.to_string()));
    }
    Ok(neighborhoods.to_string())
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if a search filter cannot be used in a search URL
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let defaults = SearchParams::default();
        let amenities = if cli.amenity.is_empty() {
            defaults.amenities
        } else {
            cli.amenity
                .iter()
                .map(|a| parse_amenity_arg(a))
                .collect::<Result<_, _>>()?
        };

        Ok(StartupConfig {
            offline: cli.offline,
            refresh: refresh_policy(&cli.refresh),
            listings: cli.listings.clone(),
            cache_dir: cli.cache_dir.clone(),
            search: SearchParams {
                base_url: defaults.base_url,
                bedrooms: cli.bedrooms,
                neighborhoods: parse_neighborhoods_arg(&cli.neighborhoods)?,
                price_cap: cli.price_cap,
                amenities,
            },
            partial_ok: cli.partial_ok,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_args() {
        let cli = Cli::parse_from(["aptscout"]);
        assert!(!cli.offline);
        assert!(cli.refresh.is_empty());
        assert!(cli.listings.is_none());
        assert_eq!(cli.bedrooms, 2);
        assert_eq!(cli.price_cap, 4950);
    }

    #[test]
    fn test_startup_config_defaults_match_search_defaults() {
        let cli = Cli::parse_from(["aptscout"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.search, SearchParams::default());
        assert_eq!(config.refresh, RefreshPolicy::default());
        assert!(!config.partial_ok);
    }

    #[test]
    fn test_refresh_is_repeatable() {
        let cli = Cli::parse_from(["aptscout", "--refresh", "details", "--refresh", "commute"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(
            config.refresh,
            RefreshPolicy {
                details: true,
                commute: true,
                ..RefreshPolicy::default()
            }
        );
    }

    #[test]
    fn test_refresh_all() {
        assert_eq!(refresh_policy(&[RefreshTarget::All]), RefreshPolicy::all());
        assert_eq!(
            refresh_policy(&[RefreshTarget::Stores, RefreshTarget::All]),
            RefreshPolicy::all()
        );
    }

    #[test]
    fn test_invalid_refresh_stage_is_rejected() {
        assert!(Cli::try_parse_from(["aptscout", "--refresh", "everything"]).is_err());
    }

    #[test]
    fn test_search_filters_from_cli() {
        let cli = Cli::parse_from([
            "aptscout",
            "--bedrooms",
            "1",
            "--price-cap",
            "3500",
            "--neighborhoods",
            "east-village,soho",
            "--amenity",
            "Laundry",
            "--amenity",
            "gym",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(
            config.search.request_url(),
            "https://streeteasy.com/1-bedroom-apartments-for-rent/east-village,soho/price:-3500%7Camenities:laundry,gym"
        );
    }

    #[test]
    fn test_parse_amenity_arg_invalid() {
        let result = parse_amenity_arg("laundry,gym");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid amenity"));
        assert!(err.to_string().contains("laundry,gym"));
        assert!(parse_amenity_arg("  ").is_err());
    }

    #[test]
    fn test_invalid_neighborhoods_is_rejected() {
        let cli = Cli::parse_from(["aptscout", "--neighborhoods", "upper west"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::InvalidNeighborhoods(_))
        ));
    }

    #[test]
    fn test_mode_flags() {
        let cli = Cli::parse_from([
            "aptscout",
            "--offline",
            "--partial-ok",
            "--listings",
            "export.json",
            "--cache-dir",
            "/tmp/c",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert!(config.offline);
        assert!(config.partial_ok);
        assert_eq!(config.listings, Some(PathBuf::from("export.json")));
        assert_eq!(config.cache_dir, Some(PathBuf::from("/tmp/c")));
    }
}
