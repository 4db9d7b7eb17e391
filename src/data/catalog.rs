//! Listing catalog
//!
//! Enumerates the listings matching a search and caches the result in the
//! catalog tier, keyed by the search request URL.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info};

use super::source::{ListingSource, SearchPage, SourceError};
use super::CatalogEntry;
use crate::cache::{EntityStore, StoreError};

/// Default listing site
pub const DEFAULT_BASE_URL: &str = "https://streeteasy.com/";

/// Separator between the street address and the unit in a listing label
const UNIT_SEPARATOR: char = '#';

/// Errors that can occur while building the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A listing label has no unit separator
    #[error("Malformed listing label '{0}': expected '<street> #<unit>'")]
    MalformedListing(String),

    /// The listing source failed
    #[error("Listing source error: {0}")]
    Source(#[from] SourceError),

    /// Cache read/write error
    #[error("Cache error: {0}")]
    Cache(#[from] StoreError),
}

/// Search filters used to build the listing search URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub base_url: String,
    pub bedrooms: u32,
    pub neighborhoods: String,
    pub price_cap: u32,
    pub amenities: Vec<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            bedrooms: 2,
            neighborhoods: "downtown".to_string(),
            price_cap: 4950,
            amenities: vec![
                "laundry".to_string(),
                "doorman".to_string(),
                "elevator".to_string(),
            ],
        }
    }
}

impl SearchParams {
    /// The first-page search URL for these filters
    pub fn request_url(&self) -> String {
        format!(
            "{}{}-bedroom-apartments-for-rent/{}/price:-{}%7Camenities:{}",
            self.base_url,
            self.bedrooms,
            self.neighborhoods,
            self.price_cap,
            self.amenities.join(",")
        )
    }
}

/// Splits a listing label into its street address and unit
///
/// Only the first separator splits; anything after it belongs to the unit.
pub fn split_label(label: &str) -> Result<(String, String), CatalogError> {
    let (street, unit) = label
        .split_once(UNIT_SEPARATOR)
        .ok_or_else(|| CatalogError::MalformedListing(label.to_string()))?;
    Ok((street.trim_end().to_string(), unit.trim().to_string()))
}

/// Produces the set of listings for a search
pub struct ListingCatalog<'a> {
    source: &'a dyn ListingSource,
    store: EntityStore,
}

impl<'a> ListingCatalog<'a> {
    pub fn new(source: &'a dyn ListingSource, store: EntityStore) -> Self {
        Self { source, store }
    }

    /// Returns every listing for `params`, keyed by listing name
    ///
    /// # Behavior
    /// - Returns the cached catalog for this search unless `force_refresh` is set
    /// - Otherwise fetches every result page and caches the combined catalog
    /// - If the source is offline, returns an empty catalog and writes nothing
    /// - A malformed label aborts the fetch without writing
    pub async fn fetch_all(
        &self,
        params: &SearchParams,
        force_refresh: bool,
    ) -> Result<BTreeMap<String, CatalogEntry>, CatalogError> {
        let request_url = params.request_url();

        if !force_refresh && self.store.exists(&request_url)? {
            info!(url = %request_url, "Loading listing search from cache");
            return Ok(self.store.read_entry(&request_url)?);
        }

        info!(url = %request_url, "Loading listing search from source");
        let Some(first_page) = self.source.search_page(&request_url).await? else {
            return Ok(BTreeMap::new());
        };

        let mut catalog = BTreeMap::new();
        add_rows(&mut catalog, &first_page)?;

        for page_number in 2..=first_page.page_indicators {
            debug!(page = page_number, "Parsing search page");
            let page_url = format!("{}?page={}", request_url, page_number);
            let Some(page) = self.source.search_page(&page_url).await? else {
                return Ok(BTreeMap::new());
            };
            add_rows(&mut catalog, &page)?;
        }

        self.store.write_entry(&request_url, &catalog)?;
        info!(count = catalog.len(), "Cached listing search");
        Ok(catalog)
    }
}

/// Adds a page's rows to the catalog; later rows replace same-named ones
fn add_rows(catalog: &mut BTreeMap<String, CatalogEntry>, page: &SearchPage) -> Result<(), CatalogError> {
    for row in &page.rows {
        let name = row.label.trim().to_string();
        let (street_address, unit) = split_label(&name)?;
        catalog.insert(
            name.clone(),
            CatalogEntry {
                url: row.url.clone(),
                full_address: name,
                street_address,
                unit,
            },
        );
    }
    Ok(())
}
