//! Google Places adapter: Text Search for candidates, then Place Details per
//! candidate for the phone number.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::doctor_search::DoctorSearch;
use crate::models::doctor::DoctorResult;

const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);
const DETAILS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    results: Vec<Place>,
}

#[derive(Debug, Deserialize)]
struct Place {
    name: String,
    rating: Option<f64>,
    formatted_address: Option<String>,
    place_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    result: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    formatted_phone_number: Option<String>,
}

#[derive(Clone)]
pub struct GooglePlacesSearch {
    client: Client,
    api_key: String,
}

impl GooglePlacesSearch {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(SEARCH_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }

    async fn text_search(&self, query: &str) -> Result<Vec<Place>, reqwest::Error> {
        let response: TextSearchResponse = self
            .client
            .get(TEXT_SEARCH_URL)
            .query(&[("query", query), ("key", self.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.results)
    }

    async fn phone_number(&self, place_id: &str) -> Result<Option<String>, reqwest::Error> {
        let response: DetailsResponse = self
            .client
            .get(DETAILS_URL)
            .timeout(DETAILS_TIMEOUT)
            .query(&[
                ("place_id", place_id),
                ("fields", "formatted_phone_number"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.result.and_then(|d| d.formatted_phone_number))
    }
}

#[async_trait]
impl DoctorSearch for GooglePlacesSearch {
    async fn search(&self, specialty: &str, location: &str, limit: usize) -> Vec<DoctorResult> {
        let query = format!("{specialty} specialist in {location}");
        let places = match self.text_search(&query).await {
            Ok(places) => places,
            Err(e) => {
                warn!("Places text search failed: {e}");
                return Vec::new();
            }
        };

        let mut results = Vec::with_capacity(limit.min(places.len()));
        for place in places.into_iter().take(limit) {
            let mut phone = None;
            if let Some(place_id) = &place.place_id {
                match self.phone_number(place_id).await {
                    Ok(found) => phone = found,
                    Err(e) => debug!("Place details lookup failed: {e}"),
                }
            }
            results.push(DoctorResult {
                name: place.name,
                specialty: Some(specialty.to_string()),
                rating: place.rating,
                address: place.formatted_address,
                phone,
                maps_url: place.place_id.as_deref().map(maps_url),
            });
        }
        results
    }

    fn backend(&self) -> &'static str {
        "google_places"
    }
}

fn maps_url(place_id: &str) -> String {
    format!("https://www.google.com/maps/place/?q=place_id:{place_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_search_response_tolerates_missing_fields() {
        let body = r#"{
            "status": "OK",
            "results": [
                {"name": "Heart Center", "rating": 4.7, "formatted_address": "1 Main St", "place_id": "abc"},
                {"name": "Walk-in Clinic"}
            ]
        }"#;
        let parsed: TextSearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[1].place_id, None);
    }

    #[test]
    fn test_zero_results_body() {
        let parsed: TextSearchResponse =
            serde_json::from_str(r#"{"status": "ZERO_RESULTS"}"#).unwrap();
        assert!(parsed.results.is_empty());
    }

    #[test]
    fn test_maps_url() {
        assert_eq!(
            maps_url("abc"),
            "https://www.google.com/maps/place/?q=place_id:abc"
        );
    }
}
