//! Find-place API response parsing

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::geo::{distance_miles, round3};
use super::query::redacted;
use super::transport::QueryError;
use crate::data::{Coordinates, StoreFact};

/// Status the find-place API reports when candidates were found
const STATUS_OK: &str = "OK";

/// Find-place API response structure
///
/// Candidates are kept as raw JSON so they can be cached verbatim.
#[derive(Debug, Deserialize)]
struct FindPlaceResponse {
    status: String,
    #[serde(default)]
    candidates: Vec<Value>,
}

/// The parts of a candidate needed to build a `StoreFact`
#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    name: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Builds a store fact for every candidate in a find-place response
///
/// # Returns
/// * `Ok(Vec<StoreFact>)` in candidate order
/// * `Err(QueryError::Status)` if the status is not "OK"
/// * `Err(QueryError::UnexpectedShape)` if a candidate has no location
pub fn store_facts(origin: Coordinates, body: Value, url: &Url) -> Result<Vec<StoreFact>, QueryError> {
    let response: FindPlaceResponse = serde_json::from_value(body)?;

    if response.status != STATUS_OK {
        return Err(QueryError::Status {
            url: redacted(url),
            status: response.status,
        });
    }

    response
        .candidates
        .into_iter()
        .map(|raw| {
            let candidate: Candidate =
                serde_json::from_value(raw.clone()).map_err(|e| QueryError::UnexpectedShape {
                    url: redacted(url),
                    reason: format!("candidate without location: {}", e),
                })?;
            let location = Coordinates::new(candidate.geometry.location.lat, candidate.geometry.location.lng);
            Ok(StoreFact {
                name: candidate.name,
                distance_miles: round3(distance_miles(origin, location)),
                raw_candidate: raw,
            })
        })
        .collect()
}
