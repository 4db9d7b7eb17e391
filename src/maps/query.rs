//! Query URL construction for the places and directions APIs

use chrono::{DateTime, Utc};
use url::Url;

use crate::data::{Coordinates, TravelMode};

/// Base URL of the Google Maps web services
pub const DEFAULT_API_BASE: &str = "https://maps.googleapis.com/maps/api";

/// Fields requested for each find-place candidate
const FIND_PLACE_FIELDS: &str = "formatted_address,name,geometry";

/// Builds a find-place query biased to a circle around `origin`
pub fn find_place_url(
    api_base: &str,
    api_key: &str,
    radius_meters: u32,
    origin: Coordinates,
    search: &str,
) -> Result<Url, url::ParseError> {
    let location_bias = format!("circle:{}@{},{}", radius_meters, origin.lat, origin.lon);
    Url::parse_with_params(
        &format!("{}/place/findplacefromtext/json", api_base),
        &[
            ("locationbias", location_bias.as_str()),
            ("inputtype", "textquery"),
            ("input", search),
            ("fields", FIND_PLACE_FIELDS),
            ("key", api_key),
        ],
    )
}

/// Builds a directions query from `origin` to `destination`
pub fn directions_url(
    api_base: &str,
    api_key: &str,
    origin: Coordinates,
    destination: &str,
    mode: TravelMode,
    departure: DateTime<Utc>,
) -> Result<Url, url::ParseError> {
    let origin = format!("{},{}", origin.lat, origin.lon);
    let departure = departure.timestamp().to_string();
    Url::parse_with_params(
        &format!("{}/directions/json", api_base),
        &[
            ("origin", origin.as_str()),
            ("destination", destination),
            ("key", api_key),
            ("mode", mode.as_str()),
            ("departure_time", departure.as_str()),
        ],
    )
}

/// The URL with its `key` parameter masked, for logging
pub fn redacted(url: &Url) -> String {
    let mut masked = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == "key" && !value.is_empty() {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn origin() -> Coordinates {
        Coordinates::new(40.72797292, -73.98678763)
    }

    #[test]
    fn test_find_place_url() {
        let url = find_place_url(DEFAULT_API_BASE, "AIza", 2000, origin(), "Whole Foods").unwrap();
        assert_eq!(
            url.as_str(),
            "https://maps.googleapis.com/maps/api/place/findplacefromtext/json?locationbias=circle%3A2000%4040.72797292%2C-73.98678763&inputtype=textquery&input=Whole+Foods&fields=formatted_address%2Cname%2Cgeometry&key=AIza"
        );
    }

    #[test]
    fn test_find_place_url_encodes_apostrophe() {
        let url = find_place_url(DEFAULT_API_BASE, "AIza", 2000, origin(), "Trader Joe's").unwrap();
        assert!(url.as_str().contains("input=Trader+Joe%27s"));
    }

    #[test]
    fn test_directions_url() {
        let departure = Utc.timestamp_opt(1663245954, 0).unwrap();
        let url = directions_url(
            DEFAULT_API_BASE,
            "AIza",
            origin(),
            "place_id:ChIJi0hJ7LNbwokR6hCyn5HFhRY",
            TravelMode::Walking,
            departure,
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://maps.googleapis.com/maps/api/directions/json?origin=40.72797292%2C-73.98678763&destination=place_id%3AChIJi0hJ7LNbwokR6hCyn5HFhRY&key=AIza&mode=walking&departure_time=1663245954"
        );
    }

    #[test]
    fn test_redacted_masks_only_the_key() {
        let url = find_place_url(DEFAULT_API_BASE, "secret", 2000, origin(), "Whole Foods").unwrap();
        let shown = redacted(&url);
        assert!(!shown.contains("secret"));
        assert!(shown.contains("key=REDACTED"));
        assert!(shown.contains("input=Whole+Foods"));
    }

    #[test]
    fn test_redacted_leaves_empty_key_alone() {
        let url = find_place_url(DEFAULT_API_BASE, "", 2000, origin(), "Whole Foods").unwrap();
        assert_eq!(redacted(&url), url.to_string());
    }
}
