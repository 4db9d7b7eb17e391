//! Listing source abstraction
//!
//! The listing site itself is scraped by an external tool. This module defines
//! the already-parsed shapes that tool hands over (search result pages and
//! detail documents) and the `ListingSource` trait the catalog and detail
//! resolver read them through.

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when reading from a listing source
#[derive(Debug, Error)]
pub enum SourceError {
    /// The export file could not be read
    #[error("Failed to read listing export: {0}")]
    Io(#[from] std::io::Error),

    /// The export file is not valid JSON for the expected shape
    #[error("Failed to parse listing export: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The source has nothing for the requested URL
    #[error("Listing source has no document for {0}")]
    Missing(String),
}

/// One listing link on a search results page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRow {
    /// Link text, e.g. "123 Main St #4B"
    pub label: String,
    /// Link target (the listing's detail page)
    pub url: String,
}

/// A parsed search results page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub rows: Vec<SearchRow>,
    /// Number of page indicators in the pager; only read from the first page
    #[serde(default)]
    pub page_indicators: usize,
}

/// A label/value pair shown on a detail page (e.g. "Available on" / "09/01/2026")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: String,
}

/// The anchors of a listing detail page that details are extracted from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailDocument {
    /// Raw geo-position text, e.g. "40.72797292; -73.98678763"
    #[serde(default)]
    pub geo_position: Option<String>,
    #[serde(default)]
    pub labeled_values: Vec<LabeledValue>,
    /// Raw text of the price block, e.g. "$4,500 base rent"
    #[serde(default)]
    pub price_text: Option<String>,
    /// Breadcrumb segments from the site root down to the listing
    #[serde(default)]
    pub breadcrumbs: Vec<String>,
}

/// Supplies parsed listing pages
///
/// `Ok(None)` means the source did not perform the request (offline mode);
/// callers must treat that as "nothing fetched" and must not write cache.
pub trait ListingSource: Send + Sync {
    fn search_page<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Option<SearchPage>, SourceError>>;

    fn detail_document<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<Option<DetailDocument>, SourceError>>;
}

/// Export format written by the external scraper
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingExport {
    /// Search pages keyed by the URL they were fetched from
    #[serde(default)]
    pub pages: HashMap<String, SearchPage>,
    /// Detail documents keyed by listing URL
    #[serde(default)]
    pub details: HashMap<String, DetailDocument>,
}

/// Listing source backed by a scraper export file
#[derive(Debug, Clone, Default)]
pub struct FileListingSource {
    export: ListingExport,
}

impl FileListingSource {
    /// Loads an export file from disk
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let content = fs::read_to_string(path)?;
        let export = serde_json::from_str(&content)?;
        Ok(Self { export })
    }

    pub fn from_export(export: ListingExport) -> Self {
        Self { export }
    }
}

impl ListingSource for FileListingSource {
    fn search_page<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Option<SearchPage>, SourceError>> {
        Box::pin(async move {
            self.export
                .pages
                .get(url)
                .cloned()
                .map(Some)
                .ok_or_else(|| SourceError::Missing(url.to_string()))
        })
    }

    fn detail_document<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<Option<DetailDocument>, SourceError>> {
        Box::pin(async move {
            self.export
                .details
                .get(url)
                .cloned()
                .map(Some)
                .ok_or_else(|| SourceError::Missing(url.to_string()))
        })
    }
}

/// Listing source that logs each request and fetches nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineListingSource;

impl ListingSource for OfflineListingSource {
    fn search_page<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Option<SearchPage>, SourceError>> {
        Box::pin(async move {
            info!(url = %url, "offline: skipping search page request");
            Ok(None)
        })
    }

    fn detail_document<'a>(
        &'a self,
        url: &'a str,
    ) -> BoxFuture<'a, Result<Option<DetailDocument>, SourceError>> {
        Box::pin(async move {
            info!(url = %url, "offline: skipping listing detail request");
            Ok(None)
        })
    }
}
