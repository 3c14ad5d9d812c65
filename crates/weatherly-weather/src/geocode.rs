//! Forward geocoding: turn a typed place name into candidate cities.
//! Uses Nominatim (OpenStreetMap) - free, no API key required, but a
//! User-Agent is mandatory.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;
use weatherly_core::{ApiConfig, ReqwestErrorExt, SearchConfig, WeatherError};

use crate::types::CitySearchResult;

/// Anything that can turn a query into city candidates.
#[async_trait]
pub trait CitySearch: Send + Sync {
    /// Never fails; problems surface as an empty list.
    async fn search_city(&self, query: &str) -> Vec<CitySearchResult>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    place_id: Option<u64>,
    name: Option<String>,
    lat: String,
    lon: String,
    class: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

impl NominatimPlace {
    /// Cities, towns and villages; also administrative boundaries, which is
    /// how Nominatim classifies many large cities.
    fn is_place_like(&self) -> bool {
        let class = self.class.as_deref().unwrap_or_default();
        let kind = self.kind.as_deref().unwrap_or_default();
        class == "place"
            || class == "boundary"
            || kind.contains("city")
            || kind.contains("town")
            || kind.contains("village")
    }

    fn into_result(self, index: usize) -> Option<CitySearchResult> {
        let lat = self.lat.parse::<f64>().ok()?;
        let lon = self.lon.parse::<f64>().ok()?;
        let address = self.address.unwrap_or_default();

        let name = address
            .city
            .or(address.town)
            .or(address.village)
            .or(self.name)
            .filter(|n| !n.is_empty())?;
        let country = address
            .country_code
            .map(|c| c.to_uppercase())
            .unwrap_or_default();
        let country_name = address.country.unwrap_or_else(|| country.clone());

        let display_name = match (address.state.filter(|s| !s.is_empty()), country_name.is_empty()) {
            (Some(state), false) => format!("{}, {}, {}", name, state, country_name),
            (Some(state), true) => format!("{}, {}", name, state),
            (None, false) => format!("{}, {}", name, country_name),
            (None, true) => name.clone(),
        };

        Some(CitySearchResult {
            id: self
                .place_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| index.to_string()),
            name,
            country,
            lat,
            lon,
            display_name,
        })
    }
}

/// Nominatim search client.
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
    min_query_len: usize,
    max_results: usize,
}

impl GeocodingClient {
    pub fn new(api: &ApiConfig, search: &SearchConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(api.request_timeout())
            .user_agent(api.user_agent.as_str())
            .build()
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        Ok(Self {
            client,
            base_url: api.geocoding_base_url.trim_end_matches('/').to_string(),
            min_query_len: search.min_query_len,
            max_results: search.max_results,
        })
    }

    pub fn min_query_len(&self) -> usize {
        self.min_query_len
    }

    /// Typed search. Short queries return an empty list without a request.
    #[instrument(skip(self), level = "debug")]
    pub async fn try_search(&self, query: &str) -> Result<Vec<CitySearchResult>, WeatherError> {
        let query = query.trim();
        if query.chars().count() < self.min_query_len {
            return Ok(Vec::new());
        }

        let url = format!("{}/search", self.base_url);
        let limit = self.max_results.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("addressdetails", "1"),
                ("accept-language", "en"),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::Network(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()));
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        let results: Vec<CitySearchResult> = places
            .into_iter()
            .filter(NominatimPlace::is_place_like)
            .enumerate()
            .filter_map(|(i, place)| place.into_result(i))
            .take(self.max_results)
            .collect();

        tracing::debug!("Search '{}' returned {} cities", query, results.len());
        Ok(results)
    }
}

#[async_trait]
impl CitySearch for GeocodingClient {
    async fn search_city(&self, query: &str) -> Vec<CitySearchResult> {
        match self.try_search(query).await {
            Ok(results) => results,
            Err(e) => {
                tracing::warn!("City search for '{}' failed: {}", query, e);
                Vec::new()
            }
        }
    }
}
