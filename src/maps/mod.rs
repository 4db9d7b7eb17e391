//! Maps enrichment
//!
//! Everything that talks to the places/directions API: the query transport,
//! URL construction, response parsing and the enrichment coordinator that
//! caches stores and commute times per listing.

pub mod directions;
pub mod enrich;
pub mod geo;
pub mod places;
pub mod query;
pub mod transport;

pub use enrich::{EnrichConfig, EnrichError, EnrichmentCoordinator};
pub use transport::{DryRunTransport, HttpTransport, QueryError, QueryTransport};
