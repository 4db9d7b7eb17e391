//! Directions API response parsing

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use super::query::redacted;
use super::transport::QueryError;
use crate::data::{CommuteFact, TravelMode};

/// Directions API response structure
#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    #[serde(default)]
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    duration: TextValue,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
}

#[derive(Debug, Deserialize)]
struct Step {
    #[serde(default)]
    transit_details: Option<TransitDetails>,
}

#[derive(Debug, Deserialize)]
struct TransitDetails {
    #[serde(default)]
    line: Option<TransitLine>,
}

#[derive(Debug, Deserialize)]
struct TransitLine {
    #[serde(default)]
    vehicle: Option<Vehicle>,
}

#[derive(Debug, Deserialize)]
struct Vehicle {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

/// Parses a duration text such as "1 hour 5 mins" into whole minutes
///
/// Each "hour"/"hours" token adds 60 times the number before it, each
/// "min"/"mins" token adds the number before it. Text with neither marker
/// (e.g. "1 day") parses to 0.
pub fn parse_duration_minutes(text: &str) -> u32 {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    tokens
        .windows(2)
        .map(|pair| {
            let amount: u32 = pair[0].parse().unwrap_or(0);
            match pair[1] {
                "hour" | "hours" => amount.saturating_mul(60),
                "min" | "mins" => amount,
                _ => 0,
            }
        })
        .fold(0, u32::saturating_add)
}

/// Extracts the commute fact for `mode` from a directions response
pub fn commute_fact(mode: TravelMode, body: Value, url: &Url) -> Result<CommuteFact, QueryError> {
    let response: DirectionsResponse = serde_json::from_value(body)?;

    let leg = response
        .routes
        .first()
        .and_then(|route| route.legs.first())
        .ok_or_else(|| QueryError::UnexpectedShape {
            url: redacted(url),
            reason: format!(
                "no route legs (status {})",
                response.status.as_deref().unwrap_or("missing")
            ),
        })?;

    let vehicle_type = match mode {
        TravelMode::Transit => leg
            .steps
            .iter()
            .find_map(|step| step.transit_details.as_ref())
            .and_then(|details| details.line.as_ref())
            .and_then(|line| line.vehicle.as_ref())
            .and_then(|vehicle| vehicle.kind.clone()),
        _ => None,
    };

    Ok(CommuteFact {
        duration_minutes: parse_duration_minutes(&leg.duration.text),
        vehicle_type,
    })
}
