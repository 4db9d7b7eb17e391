//! Listing detail resolver
//!
//! Resolves a listing's intrinsic attributes (coordinates, price, move-in date,
//! neighborhood) from its detail document and caches them in the details tier.

use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use super::source::{DetailDocument, ListingSource, SourceError};
use super::{Coordinates, ListingRecord};
use crate::cache::{EntityStore, StoreError};

/// Label whose value holds the next move-in date
const MOVE_IN_LABEL: &str = "Available on";

/// Characters that mark the start of a price token
const CURRENCY_SYMBOLS: [char; 3] = ['$', '€', '£'];

/// Errors that can occur when resolving listing details
#[derive(Debug, Error)]
pub enum DetailsError {
    /// An anchor needed to extract `field` is missing or unreadable
    #[error("Could not extract {field} for listing: {reason}")]
    Extraction { field: &'static str, reason: String },

    /// The listing source failed
    #[error("Listing source error: {0}")]
    Source(#[from] SourceError),

    /// Cache read/write error
    #[error("Cache error: {0}")]
    Cache(#[from] StoreError),

    /// The merged record could not be read back
    #[error("Cached record is malformed: {0}")]
    Record(#[from] serde_json::Error),
}

impl DetailsError {
    fn extraction(field: &'static str, reason: impl Into<String>) -> Self {
        DetailsError::Extraction {
            field,
            reason: reason.into(),
        }
    }
}

/// Intrinsic attributes extracted from a detail document
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDetails {
    pub url: String,
    pub coordinates: Coordinates,
    pub price: String,
    pub move_in: String,
    pub neighborhood: String,
}

impl ListingDetails {
    /// Extracts every attribute, failing on the first missing anchor
    pub fn extract(url: &str, document: &DetailDocument) -> Result<Self, DetailsError> {
        Ok(Self {
            url: url.to_string(),
            coordinates: parse_geo_position(document.geo_position.as_deref())?,
            price: parse_price(document.price_text.as_deref())?,
            move_in: find_move_in(document)?,
            neighborhood: find_neighborhood(&document.breadcrumbs)?,
        })
    }

    /// The fields this resolver owns in the cached record
    fn into_fields(self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("url".to_string(), json!(self.url));
        fields.insert("lat".to_string(), json!(self.coordinates.lat));
        fields.insert("lon".to_string(), json!(self.coordinates.lon));
        fields.insert("price".to_string(), json!(self.price));
        fields.insert("move_in".to_string(), json!(self.move_in));
        fields.insert("neighborhood".to_string(), json!(self.neighborhood));
        fields
    }
}

/// Parses "lat;lon" or "lat,lon" into coordinates
fn parse_geo_position(text: Option<&str>) -> Result<Coordinates, DetailsError> {
    let text = text.ok_or_else(|| DetailsError::extraction("coordinates", "no geo position"))?;

    let parts: Vec<&str> = text.split([';', ',']).map(str::trim).collect();
    let [lat, lon] = parts.as_slice() else {
        return Err(DetailsError::extraction(
            "coordinates",
            format!("expected two fields in '{}'", text),
        ));
    };

    let parse = |value: &str| {
        value
            .parse::<f64>()
            .map_err(|_| DetailsError::extraction("coordinates", format!("'{}' is not a number", value)))
    };
    Ok(Coordinates::new(parse(*lat)?, parse(*lon)?))
}

/// First whitespace-delimited token that starts with a currency symbol
///
/// A price block with no such token yields an empty price.
fn parse_price(text: Option<&str>) -> Result<String, DetailsError> {
    let text = text.ok_or_else(|| DetailsError::extraction("price", "no price block"))?;
    Ok(text
        .split_whitespace()
        .find(|token| token.starts_with(CURRENCY_SYMBOLS))
        .unwrap_or_default()
        .to_string())
}

fn find_move_in(document: &DetailDocument) -> Result<String, DetailsError> {
    document
        .labeled_values
        .iter()
        .find(|entry| entry.label.trim() == MOVE_IN_LABEL)
        .map(|entry| entry.value.split_whitespace().collect::<Vec<_>>().join(" "))
        .ok_or_else(|| DetailsError::extraction("move_in", format!("no '{}' label", MOVE_IN_LABEL)))
}

/// The breadcrumb just above the listing itself
fn find_neighborhood(breadcrumbs: &[String]) -> Result<String, DetailsError> {
    match breadcrumbs {
        [.., neighborhood, _listing] => Ok(neighborhood.trim().to_string()),
        _ => Err(DetailsError::extraction(
            "neighborhood",
            format!("need at least two breadcrumbs, found {}", breadcrumbs.len()),
        )),
    }
}

/// Resolves and caches the intrinsic attributes of individual listings
pub struct ListingDetailResolver<'a> {
    source: &'a dyn ListingSource,
    store: EntityStore,
}

impl<'a> ListingDetailResolver<'a> {
    pub fn new(source: &'a dyn ListingSource, store: EntityStore) -> Self {
        Self { source, store }
    }

    /// Returns the record for `name`, fetching it from `url` when needed
    ///
    /// # Behavior
    /// - Returns the cached record unless `force_refresh` is set
    /// - Otherwise extracts the details and merges them into the cached record,
    ///   leaving stores and commute untouched
    /// - If the source is offline, returns whatever is cached (or an empty
    ///   record) and writes nothing
    /// - An extraction failure aborts without writing
    pub async fn resolve(
        &self,
        name: &str,
        url: &str,
        force_refresh: bool,
    ) -> Result<ListingRecord, DetailsError> {
        let cached = self.store.exists(name)?;
        if cached && !force_refresh {
            info!(listing = %name, "Loading listing details from cache");
            return Ok(self.store.read_entry(name)?);
        }

        info!(listing = %name, url = %url, "Loading listing details from source");
        let Some(document) = self.source.detail_document(url).await? else {
            return if cached {
                Ok(self.store.read_entry(name)?)
            } else {
                Ok(ListingRecord::default())
            };
        };

        let details = ListingDetails::extract(url, &document).inspect_err(|e| {
            warn!(listing = %name, url = %url, error = %e, "Skipping cache update");
        })?;

        let merged = self.store.patch(name, details.into_fields())?;
        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}
