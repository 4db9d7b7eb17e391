//! Cache module for storing listing records on disk
//!
//! Each cache tier is one JSON file holding a top-level object that maps an
//! entity key (a search URL or a listing name) to its record. Entries never
//! expire; callers decide when to bypass them.

mod store;

pub use store::{EntityStore, StoreError};

/// File holding the catalog tier (search URL -> listings found)
pub const CATALOG_FILE_NAME: &str = "cached_apt_results.json";

/// File holding the details tier (listing name -> full record)
pub const DETAILS_FILE_NAME: &str = "cached_apt_info.json";
