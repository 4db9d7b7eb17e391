//! Core data models for aptscout
//!
//! This module contains the listing records shared by the catalog, the detail
//! resolver and the enrichment coordinator, along with the listing source
//! abstraction those components read from.

pub mod catalog;
pub mod details;
pub mod source;

pub use catalog::{CatalogError, ListingCatalog, SearchParams};
pub use details::{DetailsError, ListingDetailResolver, ListingDetails};
pub use source::{
    DetailDocument, FileListingSource, LabeledValue, ListingExport, ListingSource, OfflineListingSource,
    SearchPage, SearchRow, SourceError,
};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// One row of the search results, keyed by listing name in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Detail page URL for the listing
    pub url: String,
    /// The raw listing label, e.g. "123 Main St #4B"
    pub full_address: String,
    /// Label text before the unit separator
    pub street_address: String,
    /// Label text after the unit separator
    pub unit: String,
}

/// Travel modes sampled for the commute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    /// Every mode, in query order
    pub const ALL: [TravelMode; 4] = [
        TravelMode::Driving,
        TravelMode::Walking,
        TravelMode::Bicycling,
        TravelMode::Transit,
    ];

    /// Name used by the directions API
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commute duration for a single travel mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommuteFact {
    /// Whole minutes parsed from the route's duration text
    pub duration_minutes: u32,
    /// Vehicle type of the first transit step (transit mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
}

/// Commute facts keyed by travel mode
pub type Commute = BTreeMap<TravelMode, CommuteFact>;

/// A store candidate found near a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreFact {
    /// Name reported by the places API
    pub name: String,
    /// Great-circle distance from the listing, rounded to 3 decimals
    pub distance_miles: f64,
    /// The candidate exactly as the places API returned it
    pub raw_candidate: Value,
}

/// Everything cached about one listing in the details tier
///
/// Every field is optional because records are built up over several steps
/// and older caches may hold only some of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub lat: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub lon: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stores: Option<Vec<StoreFact>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commute: Option<Commute>,
}

impl ListingRecord {
    /// Coordinates of the listing, if both have been resolved
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates::new(self.lat?, self.lon?))
    }
}

/// A named listing and its current record
///
/// Listings are values: each step returns a new `Listing` rather than
/// mutating a shared one.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub name: String,
    pub record: ListingRecord,
}

impl Listing {
    pub fn new(name: impl Into<String>, record: ListingRecord) -> Self {
        Self {
            name: name.into(),
            record,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.record.coordinates()
    }

    /// Returns the cached stores if there is at least one
    pub fn cached_stores(&self) -> Option<&Vec<StoreFact>> {
        self.record.stores.as_ref().filter(|stores| !stores.is_empty())
    }

    /// Returns the cached commute if there is at least one mode
    pub fn cached_commute(&self) -> Option<&Commute> {
        self.record.commute.as_ref().filter(|commute| !commute.is_empty())
    }

    /// Replaces the intrinsic record, keeping derived facts the new record lacks
    pub fn with_record(self, record: ListingRecord) -> Self {
        let stores = record.stores.or(self.record.stores);
        let commute = record.commute.or(self.record.commute);
        Self {
            name: self.name,
            record: ListingRecord {
                stores,
                commute,
                ..record
            },
        }
    }

    pub fn with_stores(self, stores: Vec<StoreFact>) -> Self {
        Self {
            record: ListingRecord {
                stores: Some(stores),
                ..self.record
            },
            ..self
        }
    }

    pub fn with_commute(self, commute: Commute) -> Self {
        Self {
            record: ListingRecord {
                commute: Some(commute),
                ..self.record
            },
            ..self
        }
    }
}

/// Accepts coordinates written either as JSON numbers or numeric strings
fn deserialize_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCoordinate {
        Number(f64),
        Text(String),
    }

    match Option::<RawCoordinate>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawCoordinate::Number(value)) => Ok(Some(value)),
        Some(RawCoordinate::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
