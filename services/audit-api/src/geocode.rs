//! Place-name geocoding.

use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use audit_common::{AuditError, Coordinate, Result};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::GeocoderConfig;

/// Queries shorter than this get no suggestions.
pub const MIN_SUGGEST_CHARS: usize = 3;

/// A named place returned by the geocoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub coordinate: Coordinate,
}

/// Resolves free-text place names to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Best match for `query`; `LocationNotFound` when nothing matches.
    async fn locate(&self, query: &str) -> Result<Coordinate>;

    /// Up to `limit` candidate places for an autocomplete box.
    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Place>>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimPlace {
    fn into_place(self) -> Option<Place> {
        let lat = self.lat.parse().ok()?;
        let lon = self.lon.parse().ok()?;
        let coordinate = Coordinate::new(lat, lon).ok()?;
        Some(Place {
            name: self.display_name,
            coordinate,
        })
    }
}

/// Geocoder backed by a Nominatim search endpoint.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    cache: Mutex<LruCache<String, Coordinate>>,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AuditError::InvalidConfig(format!("geocoder client: {}", e)))?;

        let capacity = NonZeroUsize::new(config.cache_entries).unwrap_or(NonZeroUsize::MIN);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: Mutex::new(LruCache::new(capacity)),
        })
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Place>> {
        let url = format!("{}/search", self.base_url);
        let limit = limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", limit.as_str())])
            .send()
            .await
            .map_err(map_request_error)?;

        if !response.status().is_success() {
            return Err(AuditError::ProviderUnavailable(format!(
                "geocoder returned HTTP {}",
                response.status()
            )));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(map_request_error)?;
        Ok(places
            .into_iter()
            .filter_map(NominatimPlace::into_place)
            .collect())
    }
}

fn map_request_error(e: reqwest::Error) -> AuditError {
    if e.is_timeout() {
        AuditError::ProviderTimeout("geocoder".to_string())
    } else {
        warn!(error = %e, "Geocoder request failed");
        AuditError::ProviderUnavailable(format!("geocoder: {}", e))
    }
}

fn cache_key(query: &str) -> String {
    query.trim().to_lowercase()
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self))]
    async fn locate(&self, query: &str) -> Result<Coordinate> {
        let key = cache_key(query);
        if key.is_empty() {
            return Err(AuditError::LocationNotFound(query.to_string()));
        }

        if let Some(coordinate) = self.cache.lock().await.get(&key) {
            debug!("Geocoder cache hit");
            return Ok(*coordinate);
        }

        let place = self
            .search(query.trim(), 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AuditError::LocationNotFound(query.to_string()))?;

        self.cache.lock().await.put(key, place.coordinate);
        Ok(place.coordinate)
    }

    #[instrument(skip(self))]
    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Place>> {
        let query = query.trim();
        if query.chars().count() < MIN_SUGGEST_CHARS || limit == 0 {
            return Ok(Vec::new());
        }
        self.search(query, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nominatim_place() {
        let json = r#"[
            {"lat": "28.6138954", "lon": "77.2090057", "display_name": "New Delhi, Delhi, India"},
            {"lat": "not-a-number", "lon": "0", "display_name": "Broken"}
        ]"#;
        let raw: Vec<NominatimPlace> = serde_json::from_str(json).unwrap();
        let places: Vec<Place> = raw.into_iter().filter_map(NominatimPlace::into_place).collect();

        assert_eq!(places.len(), 1);
        assert_eq!(places[0].name, "New Delhi, Delhi, India");
        assert!((places[0].coordinate.lat() - 28.6138954).abs() < 1e-9);
    }

    #[test]
    fn test_cache_key_normalizes_case_and_whitespace() {
        assert_eq!(cache_key("  New Delhi "), "new delhi");
    }

    #[tokio::test]
    async fn test_short_query_has_no_suggestions() {
        let geocoder = NominatimGeocoder::new(&GeocoderConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..GeocoderConfig::default()
        })
        .unwrap();
        assert!(geocoder.suggest("ab", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_not_found() {
        let geocoder = NominatimGeocoder::new(&GeocoderConfig::default()).unwrap();
        let err = geocoder.locate("   ").await.unwrap_err();
        assert!(matches!(err, AuditError::LocationNotFound(_)));
    }
}
