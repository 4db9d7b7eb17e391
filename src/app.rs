//! Batch driver
//!
//! Runs the full pipeline for a search: catalog, then for each listing in turn
//! its details, nearby stores and commute. A failure for one listing is logged
//! and the next listing proceeds.

use std::path::Path;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::cache::{EntityStore, CATALOG_FILE_NAME, DETAILS_FILE_NAME};
use crate::data::{
    CatalogEntry, CatalogError, DetailsError, Listing, ListingCatalog, ListingDetailResolver, ListingRecord,
    ListingSource, SearchParams,
};
use crate::maps::{EnrichConfig, EnrichError, EnrichmentCoordinator, QueryTransport};

/// Errors that can stop the pipeline or a single listing
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Details(#[from] DetailsError),

    #[error(transparent)]
    Enrich(#[from] EnrichError),
}

/// Which pipeline stages bypass their cached values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub catalog: bool,
    pub details: bool,
    pub stores: bool,
    pub commute: bool,
}

impl RefreshPolicy {
    /// Refreshes every stage
    pub fn all() -> Self {
        Self {
            catalog: true,
            details: true,
            stores: true,
            commute: true,
        }
    }
}

/// The assembled pipeline
pub struct App<'a> {
    catalog: ListingCatalog<'a>,
    resolver: ListingDetailResolver<'a>,
    coordinator: EnrichmentCoordinator<'a>,
    refresh: RefreshPolicy,
}

impl<'a> App<'a> {
    /// Creates a pipeline whose cache files live in `cache_dir`
    ///
    /// # Arguments
    /// * `source` - Supplies search pages and detail documents
    /// * `transport` - Sends (or dry-runs) maps queries
    /// * `cache_dir` - Directory holding the catalog and details cache files
    /// * `enrich` - Maps query settings
    /// * `refresh` - Stages to recompute even when cached
    pub fn new(
        source: &'a dyn ListingSource,
        transport: &'a dyn QueryTransport,
        cache_dir: &Path,
        enrich: EnrichConfig,
        refresh: RefreshPolicy,
    ) -> Self {
        let details_store = EntityStore::in_dir(cache_dir, DETAILS_FILE_NAME);
        Self {
            catalog: ListingCatalog::new(source, EntityStore::in_dir(cache_dir, CATALOG_FILE_NAME)),
            resolver: ListingDetailResolver::new(source, details_store.clone()),
            coordinator: EnrichmentCoordinator::new(transport, details_store, enrich),
            refresh,
        }
    }

    /// Runs the pipeline for `params`
    ///
    /// # Returns
    /// * `Ok(Vec<Listing>)` for every listing that processed without error,
    ///   in catalog order
    /// * `Err(AppError::Catalog)` if the catalog itself could not be built
    pub async fn run(&self, params: &SearchParams) -> Result<Vec<Listing>, AppError> {
        let catalog = self.catalog.fetch_all(params, self.refresh.catalog).await?;
        info!(count = catalog.len(), "Processing listings");

        let mut listings = Vec::with_capacity(catalog.len());
        let mut failed = 0usize;

        for (name, entry) in &catalog {
            match self.process(name, entry).await {
                Ok(listing) => listings.push(listing),
                Err(e) => {
                    failed += 1;
                    error!(listing = %name, url = %entry.url, error = %e, "Listing failed; continuing");
                }
            }
        }

        info!(processed = listings.len(), failed, "Finished");
        Ok(listings)
    }

    /// Resolves and enriches a single catalog entry
    pub async fn process(&self, name: &str, entry: &CatalogEntry) -> Result<Listing, AppError> {
        let record = self.resolver.resolve(name, &entry.url, self.refresh.details).await?;
        let listing = Listing::new(name, ListingRecord::default()).with_record(ListingRecord {
            url: record.url.or_else(|| Some(entry.url.clone())),
            ..record
        });

        if listing.coordinates().is_none() {
            warn!(listing = %name, "No coordinates resolved; cannot enrich");
            return Err(EnrichError::CachePrimed(name.to_string()).into());
        }

        let stores = self
            .coordinator
            .find_nearby_stores(&listing, self.refresh.stores)
            .await?;
        let listing = listing.with_stores(stores);

        let commute = self
            .coordinator
            .compute_commute(&listing, self.refresh.commute)
            .await?;
        Ok(listing.with_commute(commute))
    }
}
