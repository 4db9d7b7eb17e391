//! Enrichment coordinator
//!
//! Computes nearby stores and commute times for a listing through a
//! `QueryTransport` and caches them in the details tier. Each enrichment is
//! skipped when the listing already carries a non-empty cached value, unless a
//! refresh is forced.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;

use super::directions::commute_fact;
use super::places::store_facts;
use super::query::{directions_url, find_place_url, redacted, DEFAULT_API_BASE};
use super::transport::{QueryError, QueryTransport};
use crate::cache::{EntityStore, StoreError};
use crate::data::{Commute, CommuteFact, Coordinates, Listing, StoreFact, TravelMode};

/// Place ID of the commute destination
pub const DEFAULT_DESTINATION: &str = "place_id:ChIJi0hJ7LNbwokR6hCyn5HFhRY";

/// Departure time sampled for driving, walking and bicycling
const ROAD_DEPARTURE_SECS: i64 = 1663245954;

/// Departure time sampled for transit
const TRANSIT_DEPARTURE_SECS: i64 = 1632314754;

/// Search radius around the listing for store lookups, in meters
const DEFAULT_RADIUS_METERS: u32 = 2000;

/// Errors that can occur while enriching a listing
#[derive(Debug, Error)]
pub enum EnrichError {
    /// The listing has no cached details to enrich
    #[error("Listing '{0}' has no cached details; resolve its details first")]
    CachePrimed(String),

    /// A maps query failed
    #[error("Maps query failed: {0}")]
    Query(#[from] QueryError),

    /// Cache read/write error
    #[error("Cache error: {0}")]
    Cache(#[from] StoreError),

    /// Enrichment results could not be serialized for the cache
    #[error("Failed to serialize enrichment: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Settings for the maps queries
#[derive(Debug, Clone)]
pub struct EnrichConfig {
    pub api_base: String,
    pub api_key: String,
    pub radius_meters: u32,
    /// Destination passed to the directions API (address or `place_id:...`)
    pub destination: String,
    pub road_departure: DateTime<Utc>,
    pub transit_departure: DateTime<Utc>,
    /// Store names searched near each listing, in order
    pub store_names: Vec<String>,
    /// Persist the queries that succeeded when others fail
    pub partial_ok: bool,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            radius_meters: DEFAULT_RADIUS_METERS,
            destination: DEFAULT_DESTINATION.to_string(),
            road_departure: Utc.timestamp_opt(ROAD_DEPARTURE_SECS, 0).single().unwrap_or_default(),
            transit_departure: Utc
                .timestamp_opt(TRANSIT_DEPARTURE_SECS, 0)
                .single()
                .unwrap_or_default(),
            store_names: vec!["Whole Foods".to_string(), "Trader Joe's".to_string()],
            partial_ok: false,
        }
    }
}

impl EnrichConfig {
    /// Creates a config with default settings and the given API key
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    fn departure_for(&self, mode: TravelMode) -> DateTime<Utc> {
        match mode {
            TravelMode::Transit => self.transit_departure,
            _ => self.road_departure,
        }
    }
}

/// Computes and caches derived facts for listings
pub struct EnrichmentCoordinator<'a> {
    transport: &'a dyn QueryTransport,
    store: EntityStore,
    config: EnrichConfig,
}

impl<'a> EnrichmentCoordinator<'a> {
    /// Creates a coordinator writing to the details-tier `store`
    pub fn new(transport: &'a dyn QueryTransport, store: EntityStore, config: EnrichConfig) -> Self {
        Self {
            transport,
            store,
            config,
        }
    }

    pub fn config(&self) -> &EnrichConfig {
        &self.config
    }

    /// Returns commute facts for every travel mode
    ///
    /// # Behavior
    /// - Returns the listing's cached commute if non-empty and `force_refresh` is unset
    /// - Otherwise queries every mode and merges the result into the cached record
    /// - On a dry-run transport, returns an empty map and writes nothing
    /// - A failed query aborts without writing unless `partial_ok` is set
    ///
    /// # Errors
    /// * `EnrichError::CachePrimed` if the listing has no coordinates or no cached record
    /// * `EnrichError::Query` if a query fails
    pub async fn compute_commute(&self, listing: &Listing, force_refresh: bool) -> Result<Commute, EnrichError> {
        if !force_refresh {
            if let Some(commute) = listing.cached_commute() {
                info!(listing = %listing.name, "Commute already cached");
                return Ok(commute.clone());
            }
        }

        let origin = self.origin(listing)?;
        let mut commute = Commute::new();
        let mut dry_run = false;
        let mut succeeded = 0usize;
        let mut last_error = None;

        for mode in TravelMode::ALL {
            let url = directions_url(
                &self.config.api_base,
                &self.config.api_key,
                origin,
                &self.config.destination,
                mode,
                self.config.departure_for(mode),
            )
            .map_err(QueryError::from)?;

            info!(listing = %listing.name, mode = %mode, "Loading commute from maps");
            match self.query_commute(mode, &url).await {
                Ok(Some(fact)) => {
                    commute.insert(mode, fact);
                    succeeded += 1;
                }
                Ok(None) => dry_run = true,
                Err(e) => {
                    last_error = Some(self.handle_failure(&url, e)?);
                }
            }
        }

        if dry_run {
            return Ok(Commute::new());
        }
        if let (0, Some(e)) = (succeeded, last_error) {
            return Err(e.into());
        }

        self.persist(&listing.name, "commute", serde_json::to_value(&commute)?)?;
        Ok(commute)
    }

    /// Returns store facts for every configured store name
    ///
    /// # Behavior
    /// - Returns the listing's cached stores if non-empty and `force_refresh` is unset
    /// - Otherwise searches each store name and merges the flattened result
    ///   into the cached record
    /// - On a dry-run transport, returns an empty list and writes nothing
    /// - A non-OK search aborts without writing unless `partial_ok` is set
    ///
    /// # Errors
    /// * `EnrichError::CachePrimed` if the listing has no coordinates or no cached record
    /// * `EnrichError::Query` if a search fails
    pub async fn find_nearby_stores(
        &self,
        listing: &Listing,
        force_refresh: bool,
    ) -> Result<Vec<StoreFact>, EnrichError> {
        if !force_refresh {
            if let Some(stores) = listing.cached_stores() {
                info!(listing = %listing.name, "Stores already cached");
                return Ok(stores.clone());
            }
        }

        let origin = self.origin(listing)?;
        let mut stores = Vec::new();
        let mut dry_run = false;
        let mut succeeded = 0usize;
        let mut last_error = None;

        for store_name in &self.config.store_names {
            let url = find_place_url(
                &self.config.api_base,
                &self.config.api_key,
                self.config.radius_meters,
                origin,
                store_name,
            )
            .map_err(QueryError::from)?;

            info!(listing = %listing.name, store = %store_name, "Loading stores from maps");
            match self.query_stores(origin, &url).await {
                Ok(Some(facts)) => {
                    stores.extend(facts);
                    succeeded += 1;
                }
                Ok(None) => dry_run = true,
                Err(e) => {
                    last_error = Some(self.handle_failure(&url, e)?);
                }
            }
        }

        if dry_run {
            return Ok(Vec::new());
        }
        if let (0, Some(e)) = (succeeded, last_error) {
            return Err(e.into());
        }

        self.persist(&listing.name, "stores", serde_json::to_value(&stores)?)?;
        Ok(stores)
    }

    fn origin(&self, listing: &Listing) -> Result<Coordinates, EnrichError> {
        listing
            .coordinates()
            .ok_or_else(|| EnrichError::CachePrimed(listing.name.clone()))
    }

    async fn query_commute(&self, mode: TravelMode, url: &Url) -> Result<Option<CommuteFact>, QueryError> {
        match self.transport.get(url).await? {
            Some(body) => commute_fact(mode, body, url).map(Some),
            None => Ok(None),
        }
    }

    async fn query_stores(&self, origin: Coordinates, url: &Url) -> Result<Option<Vec<StoreFact>>, QueryError> {
        match self.transport.get(url).await? {
            Some(body) => store_facts(origin, body, url).map(Some),
            None => Ok(None),
        }
    }

    /// Logs a failed query; returns the error back if the run may continue
    fn handle_failure(&self, url: &Url, e: QueryError) -> Result<QueryError, EnrichError> {
        if self.config.partial_ok {
            warn!(url = %redacted(url), error = %e, "Query failed; keeping other results");
            Ok(e)
        } else {
            error!(url = %redacted(url), error = %e, "Query failed; nothing cached");
            Err(e.into())
        }
    }

    /// Merges one enrichment field into the listing's cached record
    fn persist(&self, name: &str, field: &str, value: Value) -> Result<(), EnrichError> {
        if !self.store.exists(name)? {
            error!(listing = %name, "No cached details to attach {} to", field);
            return Err(EnrichError::CachePrimed(name.to_string()));
        }

        let mut fields = Map::new();
        fields.insert(field.to_string(), value);
        self.store.patch(name, fields)?;
        info!(listing = %name, field = %field, "Updated cached listing");
        Ok(())
    }
}
